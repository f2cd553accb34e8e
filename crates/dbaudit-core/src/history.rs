//! Historical snapshots used for trend analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::query::DatabaseQuery;

/// A previous snapshot of the database and its queries
///
/// Histories are not guaranteed to be sorted by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeHistory {
    /// Opaque report label (ex: `report_2024-01-01T00-00-00-000Z.json`)
    pub report: String,

    /// Snapshot date, as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,

    pub database: Database,

    #[serde(default)]
    pub queries: Vec<DatabaseQuery>,
}

impl AnalyzeHistory {
    pub fn new(report: impl Into<String>, date: DateTime<Utc>, database: Database) -> Self {
        Self {
            report: report.into(),
            date,
            database,
            queries: Vec::new(),
        }
    }

    /// Set queries
    pub fn with_queries(mut self, queries: Vec<DatabaseQuery>) -> Self {
        self.queries = queries;
        self
    }

    /// Parse a history snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
