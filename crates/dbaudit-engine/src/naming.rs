//! Naming convention checker
//!
//! Infers the most used naming convention among a set of names and flags the
//! names not following it. Shared by the entity, attribute and combined
//! naming rules.

use dbaudit_core::{AttributePath, AttributeRef, Entity, EntityRef};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

static CAMEL_UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][a-zA-Z0-9]*$").unwrap());
static CAMEL_LOWER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").unwrap());
static SNAKE_UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap());
static SNAKE_LOWER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());
static KEBAB_UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9-]*$").unwrap());
static KEBAB_LOWER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").unwrap());

/// Supported naming conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingConvention {
    CamelUpper,
    CamelLower,
    SnakeUpper,
    SnakeLower,
    KebabUpper,
    KebabLower,
}

impl NamingConvention {
    /// All conventions, in tie-break preference order
    pub const ALL: [NamingConvention; 6] = [
        NamingConvention::SnakeLower,
        NamingConvention::SnakeUpper,
        NamingConvention::CamelUpper,
        NamingConvention::CamelLower,
        NamingConvention::KebabLower,
        NamingConvention::KebabUpper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CamelUpper => "camel-upper",
            Self::CamelLower => "camel-lower",
            Self::SnakeUpper => "snake-upper",
            Self::SnakeLower => "snake-lower",
            Self::KebabUpper => "kebab-upper",
            Self::KebabLower => "kebab-lower",
        }
    }

    /// Check if a name follows this convention
    pub fn is_valid(&self, name: &str) -> bool {
        let regex: &Regex = match self {
            Self::CamelUpper => &CAMEL_UPPER,
            Self::CamelLower => &CAMEL_LOWER,
            Self::SnakeUpper => &SNAKE_UPPER,
            Self::SnakeLower => &SNAKE_LOWER,
            Self::KebabUpper => &KEBAB_UPPER,
            Self::KebabLower => &KEBAB_LOWER,
        };
        regex.is_match(name)
    }
}

impl std::fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A name to check, with its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedItem {
    pub entity: EntityRef,
    /// Set for attribute names
    pub attribute: Option<AttributePath>,
    pub name: String,
}

impl NamedItem {
    pub fn attribute_ref(&self) -> Option<AttributeRef> {
        self.attribute
            .as_ref()
            .map(|path| AttributeRef::new(self.entity.clone(), path.clone()))
    }
}

/// Winning convention and the items not following it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConsistency {
    pub convention: NamingConvention,
    pub invalid: Vec<NamedItem>,
}

/// Find the most used convention (ties go to the preferred one) and the invalid names
pub fn check_naming_consistency(items: &[NamedItem]) -> NamingConsistency {
    let mut counts: HashMap<NamingConvention, usize> = HashMap::new();
    for item in items {
        for convention in NamingConvention::ALL {
            if convention.is_valid(&item.name) {
                *counts.entry(convention).or_default() += 1;
            }
        }
    }

    let mut convention = NamingConvention::SnakeLower;
    let mut best = 0;
    for candidate in NamingConvention::ALL {
        let count = counts.get(&candidate).copied().unwrap_or(0);
        if count > best {
            convention = candidate;
            best = count;
        }
    }

    let invalid = items
        .iter()
        .filter(|item| !convention.is_valid(&item.name))
        .cloned()
        .collect();
    NamingConsistency { convention, invalid }
}

/// Entity names to check
pub fn entity_names(entities: &[Entity]) -> Vec<NamedItem> {
    entities
        .iter()
        .map(|e| NamedItem {
            entity: e.entity_ref(),
            attribute: None,
            name: e.name.clone(),
        })
        .collect()
}

/// Attribute names of all entities, nested ones included
pub fn attribute_names(entities: &[Entity]) -> Vec<NamedItem> {
    entities
        .iter()
        .flat_map(|e| {
            let entity = e.entity_ref();
            e.flat_attributes().into_iter().map(move |a| NamedItem {
                entity: entity.clone(),
                name: a.attribute.name.clone(),
                attribute: Some(a.path),
            })
        })
        .collect()
}
