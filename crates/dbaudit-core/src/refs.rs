//! Stable references to entities and attributes
//!
//! Refs are the identifiers used in violations, ignore lists and baselines.
//! Each ref has a canonical string id (`schema.entity(attr.path)`) that
//! round-trips through `id()` / `from_id()`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A nested attribute location, from the top-level attribute down
pub type AttributePath = Vec<String>;

/// Optional `database.catalog.schema` qualification
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl Namespace {
    /// Namespace with only a schema
    pub fn schema(schema: impl Into<String>) -> Self {
        Self {
            database: None,
            catalog: None,
            schema: Some(schema.into()),
        }
    }

    /// Check if no part is set
    pub fn is_empty(&self) -> bool {
        self.database.is_none() && self.catalog.is_none() && self.schema.is_none()
    }

    /// How close two namespaces are: 3 same schema, 2 same catalog, 1 same database, 0 otherwise
    pub fn proximity(&self, other: &Namespace) -> u8 {
        if self.database != other.database {
            0
        } else if self.catalog != other.catalog {
            1
        } else if self.schema != other.schema {
            2
        } else {
            3
        }
    }

    fn id_parts(&self) -> Vec<String> {
        let parts = [&self.database, &self.catalog, &self.schema];
        let first = parts.iter().position(|p| p.is_some());
        match first {
            Some(start) => parts[start..]
                .iter()
                .map(|p| p.as_deref().map(quote).unwrap_or_default())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Reference to an entity (table, view...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(flatten)]
    pub namespace: Namespace,

    pub entity: String,
}

impl EntityRef {
    /// Create a ref without namespace
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::default(),
            entity: entity.into(),
        }
    }

    /// Create a ref with a namespace
    pub fn with_namespace(namespace: Namespace, entity: impl Into<String>) -> Self {
        Self {
            namespace,
            entity: entity.into(),
        }
    }

    /// Canonical id: `database.catalog.schema.entity`, leading missing parts omitted
    pub fn id(&self) -> String {
        let mut parts = self.namespace.id_parts();
        parts.push(quote(&self.entity));
        parts.join(".")
    }

    /// Parse a canonical entity id
    pub fn from_id(id: &str) -> Self {
        let mut parts: Vec<String> = split_unquoted(id, '.').iter().map(|p| unquote(p)).collect();
        let entity = parts.pop().unwrap_or_default();
        let mut rest = parts.into_iter().rev().map(|p| if p.is_empty() { None } else { Some(p) });
        let schema = rest.next().flatten();
        let catalog = rest.next().flatten();
        let database = rest.next().flatten();
        Self {
            namespace: Namespace {
                database,
                catalog,
                schema,
            },
            entity,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Reference to a single (possibly nested) attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeRef {
    #[serde(flatten)]
    pub entity: EntityRef,

    pub attribute: AttributePath,
}

impl AttributeRef {
    pub fn new(entity: EntityRef, attribute: AttributePath) -> Self {
        Self { entity, attribute }
    }

    /// Canonical id: `schema.entity(attr.path)`
    pub fn id(&self) -> String {
        format!("{}({})", self.entity.id(), attribute_path_id(&self.attribute))
    }

    /// Parse a canonical attribute id, `None` when there is no attribute part
    pub fn from_id(id: &str) -> Option<Self> {
        let (entity, inner) = split_entity_and_attrs(id)?;
        Some(Self {
            entity: EntityRef::from_id(entity),
            attribute: attribute_path_from_id(inner),
        })
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Reference to an ordered list of attributes of one entity (index, relation side...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributesRef {
    #[serde(flatten)]
    pub entity: EntityRef,

    pub attributes: Vec<AttributePath>,
}

impl AttributesRef {
    pub fn new(entity: EntityRef, attributes: Vec<AttributePath>) -> Self {
        Self { entity, attributes }
    }

    /// Canonical id: `schema.entity(a, b.c)`
    pub fn id(&self) -> String {
        format!("{}({})", self.entity.id(), attribute_paths_id(&self.attributes))
    }

    /// Parse a canonical attributes id, `None` when there is no attribute part
    pub fn from_id(id: &str) -> Option<Self> {
        let (entity, inner) = split_entity_and_attrs(id)?;
        let attributes = split_unquoted(inner, ',')
            .iter()
            .map(|a| attribute_path_from_id(a.trim()))
            .filter(|path| !path.is_empty())
            .collect();
        Some(Self {
            entity: EntityRef::from_id(entity),
            attributes,
        })
    }
}

impl fmt::Display for AttributesRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// `a.b.c` for a nested attribute path
pub fn attribute_path_id(path: &[String]) -> String {
    path.iter().map(|p| quote(p)).collect::<Vec<_>>().join(".")
}

/// `a, b.c` for a list of attribute paths
pub fn attribute_paths_id(paths: &[AttributePath]) -> String {
    paths.iter().map(|p| attribute_path_id(p)).collect::<Vec<_>>().join(", ")
}

/// Parse `a.b.c` into an attribute path
pub fn attribute_path_from_id(id: &str) -> AttributePath {
    if id.is_empty() {
        return Vec::new();
    }
    split_unquoted(id, '.').iter().map(|p| unquote(p)).collect()
}

fn split_entity_and_attrs(id: &str) -> Option<(&str, &str)> {
    let open = find_unquoted(id, '(')?;
    let inner = id[open + 1..].strip_suffix(')')?;
    Some((&id[..open], inner))
}

fn needs_quotes(part: &str) -> bool {
    part.contains(['.', '(', ')', ',', '"']) || part.starts_with(' ') || part.ends_with(' ')
}

fn quote(part: &str) -> String {
    if needs_quotes(part) {
        format!("\"{}\"", part.replace('"', "\"\""))
    } else {
        part.to_string()
    }
}

fn unquote(part: &str) -> String {
    match part.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => part.to_string(),
    }
}

fn find_unquoted(text: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == needle && !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on `sep` outside double quotes, parts are returned still quoted
fn split_unquoted(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
