//! Ignore and reference suppression
//!
//! A finding is suppressed when its ref equals one from the rule `ignores`
//! conf (canonical ids) or one extracted from the reference violations
//! (a previous report acknowledged as baseline).

use dbaudit_core::{AnalyzeReportViolation, AttributeRef, AttributesRef, EntityRef, Relation};
use serde::de::DeserializeOwned;

/// Entities ignored by conf ids and reference violations
pub fn entity_ignores(conf: &[String], reference: &[AnalyzeReportViolation]) -> Vec<EntityRef> {
    conf.iter()
        .map(|id| EntityRef::from_id(id))
        .chain(reference.iter().filter_map(|v| v.entity.clone()))
        .collect()
}

/// Attributes ignored by conf ids and reference violations
pub fn attribute_ignores(conf: &[String], reference: &[AnalyzeReportViolation]) -> Vec<AttributeRef> {
    conf.iter()
        .filter_map(|id| AttributeRef::from_id(id))
        .chain(reference.iter().filter_map(AnalyzeReportViolation::attribute_ref))
        .collect()
}

/// Attribute lists ignored by conf ids and reference violations, the
/// reference ref being extracted from the violation `extra`
pub fn attributes_ignores(
    conf: &[String],
    reference: &[AnalyzeReportViolation],
    extract: impl Fn(&AnalyzeReportViolation) -> Option<AttributesRef>,
) -> Vec<AttributesRef> {
    conf.iter()
        .filter_map(|id| AttributesRef::from_id(id))
        .chain(reference.iter().filter_map(extract))
        .collect()
}

/// Relation sources ignored by conf ids and reference violations (`extra.relation`)
pub fn relation_ignores(conf: &[String], reference: &[AnalyzeReportViolation]) -> Vec<AttributesRef> {
    attributes_ignores(conf, reference, |v| extra_value::<Relation>(v, "relation").map(|r| r.src_attrs()))
}

/// Query ids ignored by conf and reference violations (`extra.query.id`)
pub fn query_ignores(conf: &[String], reference: &[AnalyzeReportViolation]) -> Vec<String> {
    conf.iter()
        .cloned()
        .chain(reference.iter().filter_map(|v| {
            v.extra
                .as_ref()
                .and_then(|extra| extra.get("query"))
                .and_then(|query| query.get("id"))
                .and_then(|id| id.as_str())
                .map(str::to_string)
        }))
        .collect()
}

/// Typed value of a key in the violation `extra`
pub fn extra_value<T: DeserializeOwned>(violation: &AnalyzeReportViolation, key: &str) -> Option<T> {
    let value = violation.extra.as_ref()?.get(key)?;
    serde_json::from_value(value.clone()).ok()
}
