//! Attributes with only nulls, in non-empty entities

use dbaudit_core::{AttributeRef, Entity, RuleLevel, RuleViolation};

use crate::ignores::attribute_ignores;
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "attribute-empty";
const RULE_NAME: &str = "empty attribute";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Attributes with only null values, they are probably unused and could be removed.",
        conf: BasicConf::new(RuleLevel::Low),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = attribute_ignores(&conf.ignores, ctx.reference);
    get_empty_attributes(&ctx.database.entities)
        .into_iter()
        .filter(|attr| !ignores.contains(attr))
        .map(|attr| {
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, format!("Attribute {} is empty.", attr.id()))
                .with_attribute(attr)
        })
        .collect()
}

/// Attributes with a null ratio of 1, skipping entities known to be empty
pub fn get_empty_attributes(entities: &[Entity]) -> Vec<AttributeRef> {
    entities
        .iter()
        .filter(|e| e.stats.as_ref().and_then(|s| s.rows) != Some(0))
        .flat_map(|e| {
            e.flat_attributes()
                .into_iter()
                .filter(|a| a.attribute.stats.as_ref().and_then(|s| s.nulls) == Some(1.0))
                .map(|a| AttributeRef::new(e.entity_ref(), a.path))
                .collect::<Vec<_>>()
        })
        .collect()
}
