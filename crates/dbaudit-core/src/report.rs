//! Report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::violation::{AnalyzeReportViolation, RuleLevel, RuleViolation};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of violations
    pub total: usize,

    pub high: usize,

    pub medium: usize,

    pub low: usize,

    pub hint: usize,

    /// Number of rules executed
    pub rules: usize,
}

impl ReportSummary {
    /// Count for a level
    pub fn count(&self, level: RuleLevel) -> usize {
        match level {
            RuleLevel::High => self.high,
            RuleLevel::Medium => self.medium,
            RuleLevel::Low => self.low,
            RuleLevel::Hint => self.hint,
            RuleLevel::Off => 0,
        }
    }
}

/// Result of one rule in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleReport {
    /// Rule display name
    pub name: String,

    /// Effective level
    pub level: RuleLevel,

    /// Effective configuration
    pub conf: Value,

    pub violations: Vec<RuleViolation>,
}

/// Analysis report (report.json v1)
///
/// This is the stable output format, it can also be fed back
/// as the reference baseline of a later analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeReport {
    /// Schema version
    pub version: ReportVersion,

    /// Analysis time
    pub timestamp: DateTime<Utc>,

    /// Summary statistics
    pub summary: ReportSummary,

    /// Results by rule id
    pub rules: BTreeMap<String, RuleReport>,

    /// Metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl AnalyzeReport {
    /// Create a new empty report
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp,
            summary: ReportSummary::default(),
            rules: BTreeMap::new(),
            metadata: None,
        }
    }

    /// Add the result of a rule to the report
    pub fn add_rule(&mut self, rule_id: impl Into<String>, rule: RuleReport) {
        for violation in &rule.violations {
            match violation.rule_level {
                RuleLevel::High => self.summary.high += 1,
                RuleLevel::Medium => self.summary.medium += 1,
                RuleLevel::Low => self.summary.low += 1,
                RuleLevel::Hint => self.summary.hint += 1,
                RuleLevel::Off => {}
            }
            self.summary.total += 1;
        }
        self.summary.rules += 1;
        self.rules.insert(rule_id.into(), rule);
    }

    /// All violations, by rule id order
    pub fn violations(&self) -> impl Iterator<Item = &RuleViolation> {
        self.rules.values().flat_map(|r| r.violations.iter())
    }

    /// Check if the report has any `high` violation
    pub fn has_blocking(&self) -> bool {
        self.summary.high > 0
    }

    /// Violations as a reference baseline, keyed by rule id
    pub fn reference_violations(&self) -> BTreeMap<String, Vec<AnalyzeReportViolation>> {
        self.rules
            .iter()
            .map(|(id, rule)| (id.clone(), rule.violations.iter().map(AnalyzeReportViolation::from).collect()))
            .collect()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a report from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::EntityRef;

    fn rule(violations: Vec<RuleViolation>) -> RuleReport {
        RuleReport {
            name: "test rule".to_string(),
            level: RuleLevel::High,
            conf: serde_json::json!({"level": "high"}),
            violations,
        }
    }

    #[test]
    fn empty_report() {
        let report = AnalyzeReport::new(Utc::now());
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary.total, 0);
        assert!(!report.has_blocking());
    }

    #[test]
    fn report_with_violations() {
        let mut report = AnalyzeReport::new(Utc::now());
        report.add_rule(
            "primary-key-missing",
            rule(vec![RuleViolation::new("primary-key-missing", "missing primary key", RuleLevel::High, "Entity users has no primary key.")
                .with_entity(EntityRef::new("users"))]),
        );
        report.add_rule(
            "entity-empty",
            rule(vec![RuleViolation::new("entity-empty", "empty entity", RuleLevel::Low, "Entity logs is empty.")]),
        );

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.high, 1);
        assert_eq!(report.summary.count(RuleLevel::Low), 1);
        assert_eq!(report.summary.rules, 2);
        assert!(report.has_blocking());

        let reference = report.reference_violations();
        assert_eq!(reference["primary-key-missing"][0].entity, Some(EntityRef::new("users")));
    }

    #[test]
    fn report_serialization() {
        let report = AnalyzeReport::new(Utc::now());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"rules\""));
        assert_eq!(AnalyzeReport::from_json(&json).unwrap(), report);
    }
}
