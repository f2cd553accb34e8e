//! Rule levels and violations
//!
//! IMPORTANT: Rule ids and level names are part of the public contract.
//! NEVER rename them - reports and configuration files depend on them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::refs::{AttributePath, AttributeRef, EntityRef};

/// Severity of a rule, `off` disables it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleLevel {
    Off,
    Hint,
    Low,
    Medium,
    High,
}

impl RuleLevel {
    /// All enabled levels, most severe first
    pub const ENABLED: [RuleLevel; 4] = [RuleLevel::High, RuleLevel::Medium, RuleLevel::Low, RuleLevel::Hint];

    /// Get the level as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Hint => "hint",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for RuleLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A finding reported by a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub rule_id: String,

    pub rule_name: String,

    /// Always the effective configured level of the rule
    pub rule_level: RuleLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributePath>,

    /// Human-readable message, stable wording
    pub message: String,

    /// Rule specific payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl RuleViolation {
    /// Create a violation with minimal fields
    pub fn new(rule_id: impl Into<String>, rule_name: impl Into<String>, rule_level: RuleLevel, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            rule_name: rule_name.into(),
            rule_level,
            entity: None,
            attribute: None,
            message: message.into(),
            extra: None,
        }
    }

    /// Set the entity
    pub fn with_entity(mut self, entity: EntityRef) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Set entity and attribute
    pub fn with_attribute(mut self, attribute: AttributeRef) -> Self {
        self.entity = Some(attribute.entity);
        self.attribute = Some(attribute.attribute);
        self
    }

    /// Set the rule specific payload
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// A violation from a previous report, used as an acknowledged baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeReportViolation {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributePath>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl AnalyzeReportViolation {
    /// Attribute ref, when both entity and attribute are present
    pub fn attribute_ref(&self) -> Option<AttributeRef> {
        match (&self.entity, &self.attribute) {
            (Some(entity), Some(attribute)) => Some(AttributeRef::new(entity.clone(), attribute.clone())),
            _ => None,
        }
    }
}

impl From<&RuleViolation> for AnalyzeReportViolation {
    fn from(violation: &RuleViolation) -> Self {
        Self {
            message: violation.message.clone(),
            entity: violation.entity.clone(),
            attribute: violation.attribute.clone(),
            extra: violation.extra.clone(),
        }
    }
}
