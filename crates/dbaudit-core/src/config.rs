//! Configuration schema (dbaudit.toml)
//!
//! Holds partial rule configurations keyed by rule id. Values stay untyped
//! here: each rule validates its own conf when the analysis runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Partial rule confs by rule id (or alias)
    #[serde(default)]
    pub rules: BTreeMap<String, Value>,
}

impl Config {
    /// Load config from a TOML or JSON file (by extension)
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_toml(&contents),
        }
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load config from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Partial conf of a rule, looked up by id then by aliases
    pub fn rule_conf(&self, id: &str, aliases: &[&str]) -> Option<&Value> {
        self.rules
            .get(id)
            .or_else(|| aliases.iter().find_map(|alias| self.rules.get(*alias)))
    }

    /// Set the partial conf of a rule
    pub fn set_rule_conf(&mut self, id: impl Into<String>, conf: Value) {
        self.rules.insert(id.into(), conf);
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.rules.is_empty());
    }

    #[test]
    fn parse_toml_rules() {
        let config = Config::from_toml(
            r#"
            [rules.entity-too-large]
            level = "high"
            max = 50

            [rules.attribute-empty]
            ignores = ["users(deleted_at)"]
            "#,
        )
        .unwrap();

        assert_eq!(config.rules["entity-too-large"], json!({"level": "high", "max": 50}));
        assert_eq!(config.rules["attribute-empty"]["ignores"][0], "users(deleted_at)");
    }

    #[test]
    fn rule_conf_by_alias() {
        let mut config = Config::default();
        config.set_rule_conf("entity-no-index", json!({"level": "off"}));

        assert_eq!(config.rule_conf("entity-index-none", &["entity-no-index"]), Some(&json!({"level": "off"})));
        assert_eq!(config.rule_conf("entity-empty", &[]), None);
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut config = Config::default();
        config.set_rule_conf("query-too-slow", json!({"level": "low", "maxMs": 200}));
        let toml = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn invalid_toml() {
        assert!(matches!(Config::from_toml("rules = 3"), Err(ConfigError::ParseError(_))));
    }
}
