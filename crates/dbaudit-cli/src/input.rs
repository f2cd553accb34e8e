//! Analysis inputs loaded from JSON files

use dbaudit_core::{AnalyzeHistory, AnalyzeReport, AnalyzeReportViolation, Database, DatabaseQuery};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Prefix of history snapshot files in a history directory
const HISTORY_PREFIX: &str = "report_";

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to walk history directory: {0}")]
    Walk(#[from] walkdir::Error),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let contents = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Database snapshot
pub fn load_database(path: &Path) -> Result<Database, InputError> {
    read_json(path)
}

/// Observed queries, as a JSON array
pub fn load_queries(path: &Path) -> Result<Vec<DatabaseQuery>, InputError> {
    read_json(path)
}

/// History snapshots from explicit files and from `report_*.json` files of a
/// directory (walked recursively, in path order)
pub fn load_history(files: &[PathBuf], dir: Option<&Path>) -> Result<Vec<AnalyzeHistory>, InputError> {
    let mut paths: Vec<PathBuf> = files.to_vec();
    if let Some(dir) = dir {
        let mut found = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_file() && name.starts_with(HISTORY_PREFIX) && name.ends_with(".json") {
                found.push(entry.into_path());
            }
        }
        found.sort();
        paths.extend(found);
    }

    paths.iter().map(|path| read_json(path)).collect()
}

/// Violations of a previous report, used as baseline
pub fn load_reference(path: &Path) -> Result<BTreeMap<String, Vec<AnalyzeReportViolation>>, InputError> {
    let report: AnalyzeReport = read_json(path)?;
    Ok(report.reference_violations())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dbaudit_core::{Entity, RuleLevel, RuleReport, RuleViolation};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_database() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "database.json",
            r#"{"entities": [{"name": "users", "attrs": [{"name": "id", "type": "int"}]}]}"#,
        );
        let database = load_database(&path).unwrap();
        assert_eq!(database.entities[0].name, "users");
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let invalid = write(dir.path(), "database.json", "{not json");
        let error = load_database(&invalid).unwrap_err();
        assert!(matches!(error, InputError::Parse { .. }));
        assert!(error.to_string().contains("database.json"));

        let missing = load_queries(&dir.path().join("queries.json")).unwrap_err();
        assert!(matches!(missing, InputError::Io { .. }));
    }

    #[test]
    fn test_load_history_dir() {
        let dir = TempDir::new().unwrap();
        let snapshot = |date: i64| format!(r#"{{"report": "r{}", "date": {}, "database": {{}}}}"#, date, date);
        write(dir.path(), "report_2.json", &snapshot(2000));
        write(dir.path(), "report_1.json", &snapshot(1000));
        write(dir.path(), "notes.json", "not a snapshot");
        let extra = write(dir.path(), "extra.json", &snapshot(3000));

        let history = load_history(&[extra], Some(dir.path())).unwrap();
        let reports: Vec<&str> = history.iter().map(|h| h.report.as_str()).collect();
        assert_eq!(reports, vec!["r3000", "r1000", "r2000"]);
    }

    #[test]
    fn test_load_reference() {
        let dir = TempDir::new().unwrap();
        let mut report = AnalyzeReport::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let violation = RuleViolation::new("primary-key-missing", "missing primary key", RuleLevel::High, "Entity logs has no primary key.")
            .with_entity(Entity::new("logs", vec![]).entity_ref());
        report.add_rule(
            "primary-key-missing",
            RuleReport {
                name: "missing primary key".to_string(),
                level: RuleLevel::High,
                conf: serde_json::json!({"level": "high"}),
                violations: vec![violation],
            },
        );
        let path = dir.path().join("report.json");
        report.save_to_file(&path).unwrap();

        let reference = load_reference(&path).unwrap();
        assert_eq!(reference["primary-key-missing"][0].message, "Entity logs has no primary key.");
    }
}
