//! Integration tests for the rule registry
//!
//! Runs the whole rule catalogue on the shop fixture and checks the findings,
//! the configuration handling and the reference baseline.
//!
//! ```bash
//! cargo test -p dbaudit-engine --test integration_tests
//! ```

mod fixtures;

use dbaudit_core::{AnalyzeReport, AnalyzeReportViolation, Config, RuleLevel};
use dbaudit_engine::{all_rules, analyze_database, into_report, AnalyzeInput, AnalyzeRule, RuleAnalyzed};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;

fn analyze(config: &Config, reference: &BTreeMap<String, Vec<AnalyzeReportViolation>>) -> BTreeMap<String, RuleAnalyzed> {
    let database = fixtures::shop_database();
    let queries = fixtures::shop_queries();
    let history = fixtures::shop_history();
    let input = AnalyzeInput {
        now: fixtures::now(),
        database: &database,
        queries: &queries,
        history: &history,
        reference,
    };
    analyze_database(config, input, &[])
}

fn messages(results: &BTreeMap<String, RuleAnalyzed>, rule_id: &str) -> Vec<String> {
    results[rule_id].violations.iter().map(|v| v.message.clone()).collect()
}

// =============================================================================
// Findings
// =============================================================================

#[test]
fn test_structural_findings() {
    let results = analyze(&Config::default(), &BTreeMap::new());

    assert_eq!(messages(&results, "primary-key-missing"), vec!["Entity audit_logs has no primary key."]);
    assert_eq!(messages(&results, "entity-index-none"), vec!["Entity audit_logs has no index."]);
    assert_eq!(
        messages(&results, "relation-miss-entity"),
        vec!["Relation orders(coupon_id)->coupons(id) references missing entity(ies): coupons."]
    );
    assert_eq!(
        messages(&results, "relation-misaligned-type"),
        vec!["Relation order_items(product_id)->products(id) links attributes with different types: order_items(product_id): bigint != products(id): int."]
    );
    assert!(messages(&results, "relation-miss-attribute").is_empty());
}

#[test]
fn test_relation_findings() {
    let results = analyze(&Config::default(), &BTreeMap::new());

    assert_eq!(
        messages(&results, "relation-missing"),
        vec!["Create a relation from orders(user_id) to users(id)."]
    );
    assert_eq!(
        messages(&results, "index-on-relation"),
        vec![
            "Create an index on order_items(order_id) to improve order_items(order_id)->orders(id) relation.",
            "Create an index on order_items(product_id) to improve order_items(product_id)->products(id) relation.",
        ]
    );
}

#[test]
fn test_query_findings() {
    let results = analyze(&Config::default(), &BTreeMap::new());

    assert_eq!(messages(&results, "query-too-slow"), vec!["Query 1 (SELECT orders) is too slow (2.5 s avg)."]);
    assert_eq!(
        messages(&results, "query-degrading"),
        vec!["Query 1 (SELECT orders) has degraded by 2400% (2.4 s) since 2024-05-22 (240% daily)."]
    );
    assert_eq!(results["query-expensive"].violations.len(), 2);
    assert!(messages(&results, "query-high-variation").is_empty());
}

#[test]
fn test_analysis_is_deterministic() {
    let first = analyze(&Config::default(), &BTreeMap::new());
    let second = analyze(&Config::default(), &BTreeMap::new());
    assert_eq!(first, second);
}

#[test]
fn test_violations_carry_effective_level() {
    let mut config = Config::default();
    config.set_rule_conf("primary-key-missing", json!({"level": "hint"}));
    let results = analyze(&config, &BTreeMap::new());

    let violations = &results["primary-key-missing"].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule_level, RuleLevel::Hint);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_ignores_in_config() {
    let mut config = Config::default();
    config.set_rule_conf("primary-key-missing", json!({"ignores": ["audit_logs"]}));
    config.set_rule_conf("relation-missing", json!({"ignores": ["orders(user_id)"]}));
    config.set_rule_conf("query-too-slow", json!({"ignores": ["1"]}));
    let results = analyze(&config, &BTreeMap::new());

    assert!(results["primary-key-missing"].violations.is_empty());
    assert!(results["relation-missing"].violations.is_empty());
    assert!(results["query-too-slow"].violations.is_empty());
    assert_eq!(results["entity-index-none"].violations.len(), 1);
}

#[test]
fn test_invalid_conf_becomes_violation() {
    let mut config = Config::default();
    config.set_rule_conf("entity-too-large", json!({"max": "many"}));
    config.set_rule_conf("query-too-slow", json!({"maxMs": 10, "unknown": true}));
    let results = analyze(&config, &BTreeMap::new());

    let too_large = &results["entity-too-large"].violations;
    assert_eq!(too_large.len(), 1);
    assert!(too_large[0].message.starts_with("Invalid conf: "));
    assert_eq!(too_large[0].rule_level, RuleLevel::Medium);

    let too_slow = &results["query-too-slow"].violations;
    assert_eq!(too_slow.len(), 1);
    assert!(too_slow[0].message.contains("unknown field `unknown`"));
}

#[test]
fn test_every_rule_off_reports_nothing() {
    let mut config = Config::default();
    for rule in all_rules() {
        config.set_rule_conf(rule.id(), json!({"level": "off"}));
    }
    let results = analyze(&config, &BTreeMap::new());

    assert_eq!(results.len(), 28);
    for (id, result) in &results {
        assert_eq!(result.level(), Some(RuleLevel::Off), "{}", id);
        assert!(result.violations.is_empty(), "{} reported {:?}", id, result.violations);
    }
    assert_eq!(into_report(results, fixtures::now()).summary.total, 0);
}

#[test]
fn test_out_of_range_conf_values_do_not_abort() {
    let mut config = Config::default();
    config.set_rule_conf("entity-unused", json!({"minDays": i64::MAX}));
    config.set_rule_conf("index-unused", json!({"minDays": i64::MAX}));
    config.set_rule_conf("entity-not-clean", json!({"maxVacuumDelayDays": i64::MAX, "maxAnalyzeDelayDays": i64::MAX}));
    let results = analyze(&config, &BTreeMap::new());

    assert!(results["entity-unused"].violations.is_empty());
    assert!(results["index-unused"].violations.is_empty());
    assert_eq!(messages(&results, "primary-key-missing"), vec!["Entity audit_logs has no primary key."]);
}

#[test]
fn test_conf_from_toml_with_aliases() {
    let config = Config::from_toml(
        r#"
        [rules.entity-no-index]
        level = "off"

        [rules.query-too-slow]
        maxMs = 5000
        "#,
    )
    .unwrap();
    let results = analyze(&config, &BTreeMap::new());

    assert_eq!(results["entity-index-none"].level(), Some(RuleLevel::Off));
    assert!(results["entity-index-none"].violations.is_empty());
    assert!(results["query-too-slow"].violations.is_empty());
    assert_eq!(results["query-too-slow"].conf["maxMs"], json!(5000.0));
}

// =============================================================================
// Reference baseline
// =============================================================================

#[test]
fn test_reference_report_suppresses_known_violations() {
    let first = into_report(analyze(&Config::default(), &BTreeMap::new()), fixtures::now());
    assert!(first.summary.total > 0);
    assert!(first.has_blocking());

    let saved = AnalyzeReport::from_json(&first.to_json().unwrap()).unwrap();
    let reference = saved.reference_violations();
    let second = into_report(analyze(&Config::default(), &reference), fixtures::now());

    let remaining: Vec<&str> = second.violations().map(|v| v.message.as_str()).collect();
    assert!(remaining.is_empty(), "not suppressed: {:?}", remaining);
    assert_eq!(second.summary.rules, first.summary.rules);
}

#[test]
fn test_reference_is_scoped_by_rule() {
    let first = into_report(analyze(&Config::default(), &BTreeMap::new()), fixtures::now());
    let mut reference = first.reference_violations();
    reference.remove("entity-index-none");
    let second = analyze(&Config::default(), &reference);

    assert!(second["primary-key-missing"].violations.is_empty());
    assert_eq!(messages(&second, "entity-index-none"), vec!["Entity audit_logs has no index."]);
}
