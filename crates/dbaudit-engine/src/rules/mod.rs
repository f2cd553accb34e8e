//! Rule catalogue
//!
//! One module per rule. Each exposes `rule()` and a pure finder used by its
//! analysis function and tests.
//!
//! IMPORTANT: Rule ids and aliases are part of the public contract.

pub mod attribute_empty;
pub mod attribute_name_inconsistent;
pub mod attribute_type_bad;
pub mod attribute_type_inconsistent;
pub mod entity_empty;
pub mod entity_grow_fast;
pub mod entity_index_none;
pub mod entity_index_too_heavy;
pub mod entity_index_too_many;
pub mod entity_name_inconsistent;
pub mod entity_not_clean;
pub mod entity_too_large;
pub mod entity_unused;
pub mod index_duplicated;
pub mod index_grow_fast;
pub mod index_on_relation;
pub mod index_unused;
pub mod naming_consistency;
pub mod primary_key_missing;
pub mod primary_key_not_business;
pub mod query_degrading;
pub mod query_expensive;
pub mod query_high_variation;
pub mod query_too_slow;
pub mod relation_misaligned_type;
pub mod relation_miss_attribute;
pub mod relation_miss_entity;
pub mod relation_missing;

use dbaudit_core::{Database, DatabaseQuery, EntityRef, RuleLevel, RuleViolation};
use dbaudit_sql::{describe_query, SqlParser};
use serde_json::{json, Value};

/// Names queries for messages, with the dialect of the snapshot
pub(crate) struct QueryNamer {
    parser: SqlParser,
}

impl QueryNamer {
    pub fn new(database: &Database) -> Self {
        let kind = database.stats.as_ref().and_then(|s| s.kind.as_deref());
        Self {
            parser: SqlParser::for_database_kind(kind),
        }
    }

    pub fn name(&self, query: &DatabaseQuery) -> NamedQuery {
        let description = describe_query(&self.parser, &query.query);
        NamedQuery {
            id: query.id.clone(),
            name: description.name(),
            entity: description.main_entity().cloned(),
        }
    }
}

pub(crate) struct NamedQuery {
    pub id: String,
    pub name: String,
    /// First entity used by the query
    pub entity: Option<EntityRef>,
}

impl NamedQuery {
    /// `Query <id> (<name>)`
    pub fn label(&self) -> String {
        format!("Query {} ({})", self.id, self.name)
    }

    /// Violation on this query, `extra.query` holding its id and name
    pub fn violation(&self, rule_id: &str, rule_name: &str, level: RuleLevel, message: String, extra: Value) -> RuleViolation {
        let mut payload = match extra {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        payload.insert("query".to_string(), json!({"id": self.id, "name": self.name}));
        let violation = RuleViolation::new(rule_id, rule_name, level, message).with_extra(Value::Object(payload));
        match &self.entity {
            Some(entity) => violation.with_entity(entity.clone()),
            None => violation,
        }
    }
}
