//! Tables without rows

use dbaudit_core::{Entity, RuleLevel, RuleViolation};

use crate::ignores::entity_ignores;
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "entity-empty";
const RULE_NAME: &str = "empty entity";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Tables without any row, they may be unused.",
        conf: BasicConf::new(RuleLevel::Low),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    get_empty_entities(&ctx.database.entities)
        .into_iter()
        .filter(|e| !ignores.contains(&e.entity_ref()))
        .map(|e| {
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, format!("Entity {} is empty.", e.id()))
                .with_entity(e.entity_ref())
        })
        .collect()
}

/// Tables with a known row count of 0
pub fn get_empty_entities(entities: &[Entity]) -> Vec<&Entity> {
    entities
        .iter()
        .filter(|e| e.is_table() && e.stats.as_ref().and_then(|s| s.rows) == Some(0))
        .collect()
}
