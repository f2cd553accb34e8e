//! dbaudit Core
//!
//! Core domain model with stable, versioned types.
//! Never rename rule ids or id formats - they are part of the public API.

pub mod config;
pub mod database;
pub mod history;
pub mod query;
pub mod refs;
pub mod report;
pub mod violation;

mod serde_utils;

pub use config::{Config, ConfigError};
pub use database::{
    Attribute, AttributeStats, Check, Database, DatabaseStats, Entity, EntityKind, EntityStats, FlatAttribute, Index,
    IndexStats, PrimaryKey, Relation, RelationKind, RelationLink, RelationOrigin, RelationPolymorphic, Type,
    ValueCount,
};
pub use history::AnalyzeHistory;
pub use query::{DatabaseQuery, QueryStats};
pub use refs::{AttributePath, AttributeRef, AttributesRef, EntityRef, Namespace};
pub use report::{AnalyzeReport, ReportSummary, ReportVersion, RuleReport};
pub use violation::{AnalyzeReportViolation, RuleLevel, RuleViolation};
