//! Rule definition and configuration validation
//!
//! A rule is a plain record: identity, default conf and a pure analysis
//! function. Confs are typed per rule and erased behind [`AnalyzeRule`] so the
//! registry can hold all of them in one list.

use chrono::{DateTime, Utc};
use dbaudit_core::{AnalyzeHistory, AnalyzeReportViolation, Database, DatabaseQuery, RuleLevel, RuleViolation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rule configuration: always carries `level` and `ignores`
pub trait RuleConf: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn level(&self) -> RuleLevel;

    /// Canonical ids of ignored entities/attributes/queries
    fn ignores(&self) -> &[String];
}

/// Implements [`RuleConf`] for a struct with `level` and `ignores` fields
macro_rules! rule_conf {
    ($conf:ty) => {
        impl $crate::rule::RuleConf for $conf {
            fn level(&self) -> dbaudit_core::RuleLevel {
                self.level
            }

            fn ignores(&self) -> &[String] {
                &self.ignores
            }
        }
    };
}
pub(crate) use rule_conf;

/// Everything a rule can read
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub now: DateTime<Utc>,
    pub database: &'a Database,
    pub queries: &'a [DatabaseQuery],
    pub history: &'a [AnalyzeHistory],
    /// Violations of this rule in the reference report
    pub reference: &'a [AnalyzeReportViolation],
}

impl RuleContext<'_> {
    /// Time of the snapshot: extraction date when known, else now
    pub fn snapshot_time(&self) -> DateTime<Utc> {
        self.database.extracted_at().unwrap_or(self.now)
    }
}

/// A rule with its typed conf
pub struct Rule<C: RuleConf> {
    pub id: &'static str,
    /// Previous ids, still accepted in configuration
    pub aliases: &'static [&'static str],
    pub name: &'static str,
    pub description: &'static str,
    /// Default conf, used as base for user confs
    pub conf: C,
    pub analyze: fn(&C, &RuleContext<'_>) -> Vec<RuleViolation>,
}

/// Rule identity, as shown in reports and rule listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// Result of one rule execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAnalyzed {
    pub rule: RuleInfo,
    /// Effective conf (merged, even when invalid)
    pub conf: Value,
    pub violations: Vec<RuleViolation>,
}

impl RuleAnalyzed {
    /// Effective level, read from the conf
    pub fn level(&self) -> Option<RuleLevel> {
        self.conf
            .get("level")
            .and_then(|level| serde_json::from_value(level.clone()).ok())
    }
}

/// Type-erased rule, as stored in the registry
pub trait AnalyzeRule: Send + Sync {
    fn info(&self) -> RuleInfo;

    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str];

    fn default_level(&self) -> RuleLevel;

    /// Default conf as JSON object
    fn default_conf(&self) -> Value;

    /// Merge, validate and run with a partial user conf
    fn run(&self, partial: Option<&Value>, ctx: &RuleContext<'_>) -> RuleAnalyzed;
}

impl<C: RuleConf> AnalyzeRule for Rule<C> {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            aliases: self.aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn default_level(&self) -> RuleLevel {
        self.conf.level()
    }

    fn default_conf(&self) -> Value {
        serde_json::to_value(&self.conf).unwrap_or(Value::Null)
    }

    fn run(&self, partial: Option<&Value>, ctx: &RuleContext<'_>) -> RuleAnalyzed {
        let merged = merge_conf(self.default_conf(), partial);
        let validated = merged
            .clone()
            .and_then(|conf| serde_json::from_value::<C>(conf).map_err(|e| e.to_string()));

        let (conf, violations) = match validated {
            Ok(conf) => {
                let level = conf.level();
                let violations = if level == RuleLevel::Off {
                    Vec::new()
                } else {
                    (self.analyze)(&conf, ctx)
                        .into_iter()
                        .map(|v| RuleViolation { rule_level: level, ..v })
                        .collect()
                };
                (serde_json::to_value(&conf).unwrap_or(Value::Null), violations)
            }
            Err(error) => {
                tracing::warn!(rule = self.id, %error, "invalid rule conf");
                let violation = RuleViolation::new(
                    self.id,
                    self.name,
                    self.default_level(),
                    format!("Invalid conf: {}", error),
                );
                (merged.unwrap_or_else(|_| partial.cloned().unwrap_or(Value::Null)), vec![violation])
            }
        };

        tracing::debug!(rule = self.id, violations = violations.len(), "rule analyzed");
        RuleAnalyzed {
            rule: self.info(),
            conf,
            violations,
        }
    }
}

/// Shallow merge of a partial conf over the default one, partial keys win
pub fn merge_conf(default: Value, partial: Option<&Value>) -> Result<Value, String> {
    match (default, partial) {
        (default, None | Some(Value::Null)) => Ok(default),
        (Value::Object(mut base), Some(Value::Object(overrides))) => {
            for (key, value) in overrides {
                base.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(base))
        }
        (_, Some(other)) => Err(format!("expected an object, got `{}`", other)),
    }
}

/// Conf for rules with only `level` and `ignores`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BasicConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
}

rule_conf!(BasicConf);

impl BasicConf {
    pub fn new(level: RuleLevel) -> Self {
        Self {
            level,
            ignores: Vec::new(),
        }
    }
}
