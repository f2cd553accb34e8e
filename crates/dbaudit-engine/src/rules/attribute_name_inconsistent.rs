//! Attribute names not following the most used naming convention

use dbaudit_core::{RuleLevel, RuleViolation};
use serde_json::json;

use crate::ignores::attribute_ignores;
use crate::naming::{attribute_names, check_naming_consistency};
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "attribute-name-inconsistent";
const RULE_NAME: &str = "inconsistent attribute name";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &["attribute-naming-consistency"],
        name: RULE_NAME,
        description: "Attribute names should follow the same naming convention across the whole database.",
        conf: BasicConf::new(RuleLevel::Hint),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = attribute_ignores(&conf.ignores, ctx.reference);
    let result = check_naming_consistency(&attribute_names(&ctx.database.entities));
    result
        .invalid
        .iter()
        .filter_map(|item| item.attribute_ref())
        .filter(|attr| !ignores.contains(attr))
        .map(|attr| {
            RuleViolation::new(
                RULE_ID,
                RULE_NAME,
                conf.level,
                format!("Attribute {} doesn't follow naming convention {}.", attr.id(), result.convention),
            )
            .with_attribute(attr)
            .with_extra(json!({"convention": result.convention}))
        })
        .collect()
}
