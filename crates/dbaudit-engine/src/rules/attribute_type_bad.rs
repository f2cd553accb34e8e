//! Attributes using types known to be error-prone

use dbaudit_core::{AttributeRef, Entity, RuleLevel, RuleViolation};
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

use crate::ignores::attribute_ignores;
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "attribute-type-bad";
const RULE_NAME: &str = "bad attribute type";

/// Type pattern (lowercase) and advice
static BAD_TYPES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"^money$", "use numeric instead"),
        (r"^(character|char|bpchar)(\s*\(\d+\))?$", "use varchar or text instead"),
        (r"^(time with time zone|timetz)(\s*\(\d+\))?$", "use timestamp with time zone instead"),
        (r"^timestamp(\s*\(\d+\))? without time zone$", "use timestamp with time zone instead"),
    ]
    .into_iter()
    .map(|(pattern, advice)| (Regex::new(pattern).unwrap(), advice))
    .collect()
});

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Some types have surprising behaviors and better alternatives.",
        conf: BasicConf::new(RuleLevel::Hint),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = attribute_ignores(&conf.ignores, ctx.reference);
    get_bad_types(&ctx.database.entities)
        .into_iter()
        .filter(|bad| !ignores.contains(&bad.attribute))
        .map(|bad| {
            RuleViolation::new(
                RULE_ID,
                RULE_NAME,
                conf.level,
                format!("Attribute {} has a bad type: {} ({}).", bad.attribute.id(), bad.data_type, bad.advice),
            )
            .with_extra(json!({"type": bad.data_type}))
            .with_attribute(bad.attribute)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadType {
    pub attribute: AttributeRef,
    pub data_type: String,
    pub advice: &'static str,
}

pub fn get_bad_types(entities: &[Entity]) -> Vec<BadType> {
    entities
        .iter()
        .flat_map(|e| {
            e.flat_attributes()
                .into_iter()
                .filter_map(|a| {
                    let data_type = a.attribute.data_type.trim().to_lowercase();
                    let advice = BAD_TYPES
                        .iter()
                        .find(|(pattern, _)| pattern.is_match(&data_type))
                        .map(|(_, advice)| *advice)?;
                    Some(BadType {
                        attribute: AttributeRef::new(e.entity_ref(), a.path),
                        data_type: a.attribute.data_type.clone(),
                        advice,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
