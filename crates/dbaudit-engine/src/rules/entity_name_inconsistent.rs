//! Entity names not following the most used naming convention

use dbaudit_core::{RuleLevel, RuleViolation};
use serde_json::json;

use crate::ignores::entity_ignores;
use crate::naming::{check_naming_consistency, entity_names};
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "entity-name-inconsistent";
const RULE_NAME: &str = "inconsistent entity name";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &["entity-naming-consistency"],
        name: RULE_NAME,
        description: "Entity names should follow the same naming convention across the whole database.",
        conf: BasicConf::new(RuleLevel::Hint),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    let result = check_naming_consistency(&entity_names(&ctx.database.entities));
    result
        .invalid
        .into_iter()
        .filter(|item| !ignores.contains(&item.entity))
        .map(|item| {
            RuleViolation::new(
                RULE_ID,
                RULE_NAME,
                conf.level,
                format!("Entity {} doesn't follow naming convention {}.", item.entity.id(), result.convention),
            )
            .with_entity(item.entity)
            .with_extra(json!({"convention": result.convention}))
        })
        .collect()
}
