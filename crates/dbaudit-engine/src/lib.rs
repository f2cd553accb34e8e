//! dbaudit engine - Schema analysis rules
//!
//! This crate implements the analysis of database snapshots:
//! - Naming convention checker
//! - Relation inference from attribute names
//! - Trend comparison with previous snapshots
//! - The rule catalogue and its registry

pub mod format;
pub mod ignores;
pub mod inference;
pub mod naming;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod trends;
pub mod words;

pub use inference::infer_missing_relations;
pub use naming::{check_naming_consistency, NamingConsistency, NamingConvention};
pub use registry::{all_rules, analyze_database, into_report, AnalyzeInput};
pub use rule::{AnalyzeRule, RuleAnalyzed, RuleContext, RuleInfo};
