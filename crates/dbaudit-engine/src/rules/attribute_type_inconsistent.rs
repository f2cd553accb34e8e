//! Attributes sharing a name but not a type

use dbaudit_core::{AttributeRef, Entity, RuleLevel, RuleViolation};
use serde_json::json;
use std::collections::BTreeMap;

use crate::ignores::attribute_ignores;
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "attribute-type-inconsistent";
const RULE_NAME: &str = "attribute with inconsistent types";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Attributes with the same name should have the same type, or they are not the same thing.",
        conf: BasicConf::new(RuleLevel::Hint),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = attribute_ignores(&conf.ignores, ctx.reference);
    get_inconsistent_types(&ctx.database.entities)
        .into_iter()
        .filter(|found| !ignores.contains(&found.attribute))
        .map(|found| {
            let others: Vec<String> = found
                .others
                .iter()
                .map(|(data_type, count)| format!("{} ({})", data_type, count))
                .collect();
            RuleViolation::new(
                RULE_ID,
                RULE_NAME,
                conf.level,
                format!(
                    "Attribute {} has type {}, but other {} attributes use {}.",
                    found.attribute.id(),
                    found.data_type,
                    found.name,
                    others.join(", ")
                ),
            )
            .with_extra(json!({"type": found.data_type, "others": found.others}))
            .with_attribute(found.attribute)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct InconsistentType {
    pub attribute: AttributeRef,
    pub name: String,
    pub data_type: String,
    /// Other types used by same name attributes, most used first
    pub others: Vec<(String, usize)>,
}

/// Attributes whose type is not the single most used one for their name
pub fn get_inconsistent_types(entities: &[Entity]) -> Vec<InconsistentType> {
    let mut by_name: BTreeMap<String, Vec<(AttributeRef, String)>> = BTreeMap::new();
    for entity in entities {
        for attr in entity.flat_attributes() {
            by_name
                .entry(attr.attribute.name.clone())
                .or_default()
                .push((AttributeRef::new(entity.entity_ref(), attr.path), attr.attribute.data_type.clone()));
        }
    }

    let mut result = Vec::new();
    for (name, attrs) in by_name {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for (_, data_type) in &attrs {
            *counts.entry(data_type.to_lowercase()).or_default() += 1;
        }
        if counts.len() < 2 {
            continue;
        }
        let max = counts.values().copied().max().unwrap_or(0);
        let majority: Vec<&String> = counts.iter().filter(|(_, c)| **c == max).map(|(t, _)| t).collect();
        let single_majority = if majority.len() == 1 { Some(majority[0].clone()) } else { None };

        for (attribute, data_type) in attrs {
            let key = data_type.to_lowercase();
            if single_majority.as_ref() == Some(&key) {
                continue;
            }
            let mut others: Vec<(String, usize)> = counts
                .iter()
                .filter(|(t, _)| **t != key)
                .map(|(t, c)| (t.clone(), *c))
                .collect();
            others.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            result.push(InconsistentType {
                attribute,
                name: name.clone(),
                data_type,
                others,
            });
        }
    }
    result.sort_by(|a, b| a.attribute.cmp(&b.attribute));
    result
}
