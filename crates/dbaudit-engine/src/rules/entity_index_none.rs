//! Tables without any index, primary key included

use dbaudit_core::{Entity, RuleLevel, RuleViolation};

use crate::ignores::entity_ignores;
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "entity-index-none";
const RULE_NAME: &str = "entity with no index";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &["entity-no-index"],
        name: RULE_NAME,
        description: "Tables without index will be scanned sequentially on every query.",
        conf: BasicConf::new(RuleLevel::High),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    get_entities_without_index(&ctx.database.entities)
        .into_iter()
        .filter(|e| !ignores.contains(&e.entity_ref()))
        .map(|e| {
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, format!("Entity {} has no index.", e.id()))
                .with_entity(e.entity_ref())
        })
        .collect()
}

pub fn get_entities_without_index(entities: &[Entity]) -> Vec<&Entity> {
    entities
        .iter()
        .filter(|e| e.is_table() && e.pk.is_none() && e.indexes.is_empty())
        .collect()
}
