//! Tables without primary key

use dbaudit_core::{Entity, RuleLevel, RuleViolation};

use crate::ignores::entity_ignores;
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "primary-key-missing";
const RULE_NAME: &str = "missing primary key";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Every table should have a primary key to identify its rows.",
        conf: BasicConf::new(RuleLevel::High),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    get_missing_primary_keys(&ctx.database.entities)
        .into_iter()
        .filter(|e| !ignores.contains(&e.entity_ref()))
        .map(|e| {
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, format!("Entity {} has no primary key.", e.id()))
                .with_entity(e.entity_ref())
        })
        .collect()
}

/// Tables without primary key, views never have one
pub fn get_missing_primary_keys(entities: &[Entity]) -> Vec<&Entity> {
    entities.iter().filter(|e| e.is_table() && e.pk.is_none()).collect()
}
