//! Observed queries and their execution statistics

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timing aggregates of a query, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStats {
    #[serde(default)]
    pub count: u64,

    #[serde(default)]
    pub min_time: f64,

    #[serde(default)]
    pub max_time: f64,

    #[serde(default)]
    pub sum_time: f64,

    #[serde(default)]
    pub mean_time: f64,

    /// Standard deviation
    #[serde(default)]
    pub sd_time: f64,
}

/// An SQL statement observed on the database (pg_stat_statements like)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseQuery {
    /// Stable query id, used to match the query across snapshots
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// SQL text
    pub query: String,

    /// Rows returned or affected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<QueryStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<QueryStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl DatabaseQuery {
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            ..Self::default()
        }
    }

    /// Set execution statistics
    pub fn with_exec(mut self, exec: QueryStats) -> Self {
        self.exec = Some(exec);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_query_json() {
        let json = r#"{"id": "42", "query": "SELECT * FROM users", "exec": {"count": 10, "meanTime": 12.5, "sdTime": 3}}"#;
        let query: DatabaseQuery = serde_json::from_str(json).unwrap();
        let exec = query.exec.unwrap();
        assert_eq!(exec.count, 10);
        assert_eq!(exec.mean_time, 12.5);
        assert_eq!(exec.sd_time, 3.0);
        assert_eq!(exec.max_time, 0.0);
    }
}
