//! Rule registry
//!
//! Collects every rule, resolves their effective conf from the user config and
//! runs them on a snapshot. Rules are independent: none reads the output of
//! another.

use chrono::{DateTime, Utc};
use dbaudit_core::{
    AnalyzeHistory, AnalyzeReport, AnalyzeReportViolation, Config, Database, DatabaseQuery, RuleLevel, RuleReport,
};
use std::collections::BTreeMap;

use crate::rule::{AnalyzeRule, RuleAnalyzed, RuleContext};
use crate::rules::*;

/// Everything analyzed in one run
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeInput<'a> {
    pub now: DateTime<Utc>,
    pub database: &'a Database,
    pub queries: &'a [DatabaseQuery],
    pub history: &'a [AnalyzeHistory],
    /// Violations of a previous report acknowledged as baseline, by rule id
    pub reference: &'a BTreeMap<String, Vec<AnalyzeReportViolation>>,
}

/// All registered rules, sorted by id
pub fn all_rules() -> Vec<Box<dyn AnalyzeRule>> {
    vec![
        Box::new(attribute_empty::rule()),
        Box::new(attribute_name_inconsistent::rule()),
        Box::new(attribute_type_bad::rule()),
        Box::new(attribute_type_inconsistent::rule()),
        Box::new(entity_empty::rule()),
        Box::new(entity_grow_fast::rule()),
        Box::new(entity_index_none::rule()),
        Box::new(entity_index_too_heavy::rule()),
        Box::new(entity_index_too_many::rule()),
        Box::new(entity_name_inconsistent::rule()),
        Box::new(entity_not_clean::rule()),
        Box::new(entity_too_large::rule()),
        Box::new(entity_unused::rule()),
        Box::new(index_duplicated::rule()),
        Box::new(index_grow_fast::rule()),
        Box::new(index_on_relation::rule()),
        Box::new(index_unused::rule()),
        Box::new(naming_consistency::rule()),
        Box::new(primary_key_missing::rule()),
        Box::new(primary_key_not_business::rule()),
        Box::new(query_degrading::rule()),
        Box::new(query_expensive::rule()),
        Box::new(query_high_variation::rule()),
        Box::new(query_too_slow::rule()),
        Box::new(relation_misaligned_type::rule()),
        Box::new(relation_miss_attribute::rule()),
        Box::new(relation_miss_entity::rule()),
        Box::new(relation_missing::rule()),
    ]
}

/// Whether the rule is selected by the filter, matching its id, an alias or
/// its name. An empty filter selects every rule.
pub fn rule_selected(rule: &dyn AnalyzeRule, rule_names: &[String]) -> bool {
    rule_names.is_empty()
        || rule_names
            .iter()
            .any(|name| name == rule.id() || name == rule.name() || rule.aliases().iter().any(|alias| alias == name))
}

/// Run the selected rules with their effective conf, results keyed by rule id
pub fn analyze_database(config: &Config, input: AnalyzeInput<'_>, rule_names: &[String]) -> BTreeMap<String, RuleAnalyzed> {
    let rules = all_rules();
    tracing::info!(
        entities = input.database.entities.len(),
        queries = input.queries.len(),
        history = input.history.len(),
        "analyzing database"
    );

    rules
        .iter()
        .filter(|rule| rule_selected(rule.as_ref(), rule_names))
        .map(|rule| {
            let ctx = RuleContext {
                now: input.now,
                database: input.database,
                queries: input.queries,
                history: input.history,
                reference: input.reference.get(rule.id()).map(Vec::as_slice).unwrap_or(&[]),
            };
            let partial = config.rule_conf(rule.id(), rule.aliases());
            (rule.id().to_string(), rule.run(partial, &ctx))
        })
        .collect()
}

/// Report document of an analysis
pub fn into_report(results: BTreeMap<String, RuleAnalyzed>, now: DateTime<Utc>) -> AnalyzeReport {
    let mut report = AnalyzeReport::new(now);
    for (id, analyzed) in results {
        let level = analyzed.level().unwrap_or(RuleLevel::Off);
        report.add_rule(
            id,
            RuleReport {
                name: analyzed.rule.name,
                level,
                conf: analyzed.conf,
                violations: analyzed.violations,
            },
        );
    }
    report
}
