//! Relations linking attributes of different types

use dbaudit_core::{AttributeRef, Database, Relation, RuleLevel, RuleViolation};
use serde::Serialize;
use serde_json::json;

use crate::ignores::relation_ignores;
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "relation-misaligned-type";
const RULE_NAME: &str = "relation with misaligned types";

/// Type spellings compared as the same type
const TYPE_ALIASES: [(&str, &str); 12] = [
    ("int4", "integer"),
    ("int", "integer"),
    ("serial", "integer"),
    ("serial4", "integer"),
    ("int8", "bigint"),
    ("serial8", "bigint"),
    ("bigserial", "bigint"),
    ("int2", "smallint"),
    ("character varying", "varchar"),
    ("bool", "boolean"),
    ("character", "char"),
    ("bpchar", "char"),
];

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Linked attributes should have the same type, joins on different types are slow and may lose values.",
        conf: BasicConf::new(RuleLevel::Medium),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = relation_ignores(&conf.ignores, ctx.reference);
    get_misaligned_relations(ctx.database)
        .into_iter()
        .filter(|(relation, _)| !ignores.contains(&relation.src_attrs()))
        .map(|(relation, misaligned)| {
            let details: Vec<String> = misaligned
                .iter()
                .map(|m| format!("{}: {} != {}: {}", m.src.id(), m.src_type, m.reference.id(), m.ref_type))
                .collect();
            let message = format!("Relation {} links attributes with different types: {}.", relation.id(), details.join(", "));
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(relation.src.clone())
                .with_extra(json!({"relation": relation, "misaligned": misaligned}))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MisalignedType {
    pub src: AttributeRef,
    pub src_type: String,
    #[serde(rename = "ref")]
    pub reference: AttributeRef,
    pub ref_type: String,
}

/// Relations with at least one attribute pair of different types, missing
/// entities or attributes are skipped
pub fn get_misaligned_relations(database: &Database) -> Vec<(&Relation, Vec<MisalignedType>)> {
    database
        .relations
        .iter()
        .filter_map(|relation| {
            let src = database.find_entity(&relation.src)?;
            let reference = database.find_entity(&relation.reference)?;
            let misaligned: Vec<MisalignedType> = relation
                .attrs
                .iter()
                .filter_map(|link| {
                    let src_attr = src.find_attribute(&link.src)?;
                    let ref_attr = reference.find_attribute(&link.reference)?;
                    (normalize_type(&src_attr.data_type) != normalize_type(&ref_attr.data_type)).then(|| MisalignedType {
                        src: AttributeRef::new(relation.src.clone(), link.src.clone()),
                        src_type: src_attr.data_type.clone(),
                        reference: AttributeRef::new(relation.reference.clone(), link.reference.clone()),
                        ref_type: ref_attr.data_type.clone(),
                    })
                })
                .collect();
            (!misaligned.is_empty()).then_some((relation, misaligned))
        })
        .collect()
}

/// Lowercase type without size/precision, with common aliases resolved
fn normalize_type(data_type: &str) -> String {
    let lower = data_type.to_lowercase();
    let base = lower.split('(').next().unwrap_or_default().trim();
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == base)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| base.to_string())
}
