//! Short descriptions of observed queries
//!
//! Query text is too long for messages, so queries are named after their
//! statement kind and the entities they touch (`SELECT users, posts`).
//! Unparseable queries fall back to a truncated, single-line text.

use dbaudit_core::{EntityRef, Namespace};
use sqlparser::ast::{visit_relations, Statement};
use std::collections::HashSet;
use std::ops::ControlFlow;

use crate::parser::SqlParser;

const MAX_FALLBACK_LENGTH: usize = 50;

/// What a query does, as far as it can be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescription {
    /// Statement keyword (SELECT, INSERT, UPDATE...)
    pub kind: String,

    /// Entities read or written, in order of appearance, CTEs excluded
    pub entities: Vec<EntityRef>,

    /// Set when the query could not be parsed
    pub fallback: Option<String>,
}

impl QueryDescription {
    /// Short name, ex: `SELECT users, posts`
    pub fn name(&self) -> String {
        if let Some(fallback) = &self.fallback {
            return fallback.clone();
        }
        if self.entities.is_empty() {
            self.kind.clone()
        } else {
            let entities: Vec<String> = self.entities.iter().map(EntityRef::id).collect();
            format!("{} {}", self.kind, entities.join(", "))
        }
    }

    /// Main entity of the query (first one found)
    pub fn main_entity(&self) -> Option<&EntityRef> {
        self.entities.first()
    }
}

/// Describe a query, never fails
pub fn describe_query(parser: &SqlParser, sql: &str) -> QueryDescription {
    let statement = parser.parse(sql).ok().and_then(|parsed| parsed.statements.into_iter().next());
    match statement {
        Some(statement) => QueryDescription {
            kind: statement_kind(&statement, sql),
            entities: statement_entities(&statement),
            fallback: None,
        },
        None => QueryDescription {
            kind: first_keyword(sql),
            entities: Vec::new(),
            fallback: Some(truncate_sql(sql)),
        },
    }
}

fn statement_kind(statement: &Statement, sql: &str) -> String {
    match statement {
        Statement::Query(_) => "SELECT".to_string(),
        _ => first_keyword(sql),
    }
}

fn statement_entities(statement: &Statement) -> Vec<EntityRef> {
    let ctes: HashSet<String> = match statement {
        Statement::Query(query) => query
            .with
            .iter()
            .flat_map(|with| with.cte_tables.iter().map(|cte| cte.alias.name.value.clone()))
            .collect(),
        _ => HashSet::new(),
    };

    let mut entities: Vec<EntityRef> = Vec::new();
    let _ = visit_relations(statement, |relation| {
        let entity = object_entity(&relation.0.iter().map(|ident| ident.value.clone()).collect::<Vec<_>>());
        if !ctes.contains(&entity.entity) && !entities.contains(&entity) {
            entities.push(entity);
        }
        ControlFlow::<()>::Continue(())
    });
    entities
}

/// Entity from unquoted name parts, the last one being the entity name
fn object_entity(parts: &[String]) -> EntityRef {
    let Some((entity, namespace)) = parts.split_last() else {
        return EntityRef::new("");
    };
    let mut rest = namespace.iter().rev().cloned();
    let schema = rest.next();
    let catalog = rest.next();
    let database = rest.next();
    EntityRef::with_namespace(
        Namespace {
            database,
            catalog,
            schema,
        },
        entity.clone(),
    )
}

fn first_keyword(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_uppercase())
        .unwrap_or_default()
}

fn truncate_sql(sql: &str) -> String {
    let single_line = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() > MAX_FALLBACK_LENGTH {
        let truncated: String = single_line.chars().take(MAX_FALLBACK_LENGTH).collect();
        format!("{}...", truncated.trim_end())
    } else {
        single_line
    }
}
