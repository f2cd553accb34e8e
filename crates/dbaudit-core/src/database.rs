//! Database snapshot model
//!
//! The normalized, read-only input of every analysis: entities with their
//! attributes, keys, indexes and statistics, relations between them and
//! custom types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::refs::{AttributePath, AttributesRef, EntityRef, Namespace};
use crate::serde_utils::vec_or_map;

/// A database snapshot, never mutated by the analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default, deserialize_with = "vec_or_map", skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,

    #[serde(default, deserialize_with = "vec_or_map", skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relation>,

    #[serde(default, deserialize_with = "vec_or_map", skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<Type>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<DatabaseStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl Database {
    /// Parse a database snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Find an entity by ref (exact namespace match)
    pub fn find_entity(&self, entity: &EntityRef) -> Option<&Entity> {
        self.entities.iter().find(|e| e.namespace == entity.namespace && e.name == entity.entity)
    }

    /// When the snapshot was extracted, if known
    pub fn extracted_at(&self) -> Option<DateTime<Utc>> {
        self.stats.as_ref().and_then(|s| s.extracted_at)
    }
}

/// Global statistics of the snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Database engine (postgres, mysql...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    /// When the snapshot was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_at: Option<DateTime<Utc>>,

    /// Extraction duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_duration: Option<u64>,

    /// Database size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Kind of entity, a table when absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "table")]
    Table,

    #[serde(rename = "view")]
    View,

    #[serde(rename = "materialized view")]
    MaterializedView,

    #[serde(rename = "foreign table")]
    ForeignTable,
}

/// A table, view, materialized view or foreign table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(flatten)]
    pub namespace: Namespace,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,

    /// View definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk: Option<PrimaryKey>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<Check>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<EntityStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl Entity {
    /// Create a table with attributes
    pub fn new(name: impl Into<String>, attrs: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            attrs,
            ..Self::default()
        }
    }

    /// Set namespace
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    /// Set kind
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set primary key
    pub fn with_pk(mut self, attrs: Vec<AttributePath>) -> Self {
        self.pk = Some(PrimaryKey {
            name: None,
            attrs,
            ..PrimaryKey::default()
        });
        self
    }

    /// Add an index
    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Set statistics
    pub fn with_stats(mut self, stats: EntityStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::with_namespace(self.namespace.clone(), self.name.clone())
    }

    /// Canonical entity id
    pub fn id(&self) -> String {
        self.entity_ref().id()
    }

    /// Tables are entities without kind or with the `table` kind
    pub fn is_table(&self) -> bool {
        matches!(self.kind, None | Some(EntityKind::Table))
    }

    /// Find an attribute by path, walking nested attributes
    pub fn find_attribute(&self, path: &[String]) -> Option<&Attribute> {
        let (first, rest) = path.split_first()?;
        let mut current = self.attrs.iter().find(|a| &a.name == first)?;
        for name in rest {
            current = current.attrs.iter().find(|a| &a.name == name)?;
        }
        Some(current)
    }

    /// All attributes depth-first, with their full path
    pub fn flat_attributes(&self) -> Vec<FlatAttribute<'_>> {
        let mut result = Vec::new();
        flatten_attributes(&self.attrs, &[], &mut result);
        result
    }

    /// Attributes ref for a list of paths of this entity
    pub fn attributes_ref(&self, attrs: &[AttributePath]) -> AttributesRef {
        AttributesRef::new(self.entity_ref(), attrs.to_vec())
    }
}

/// An attribute with its full path inside its entity
#[derive(Debug, Clone, PartialEq)]
pub struct FlatAttribute<'a> {
    pub path: AttributePath,
    pub attribute: &'a Attribute,
}

impl FlatAttribute<'_> {
    /// Path of the parent attribute (empty for top-level attributes)
    pub fn parent(&self) -> &[String] {
        &self.path[..self.path.len().saturating_sub(1)]
    }
}

fn flatten_attributes<'a>(attrs: &'a [Attribute], parent: &[String], result: &mut Vec<FlatAttribute<'a>>) {
    for attribute in attrs {
        let mut path = parent.to_vec();
        path.push(attribute.name.clone());
        result.push(FlatAttribute {
            path: path.clone(),
            attribute,
        });
        flatten_attributes(&attribute.attrs, &path, result);
    }
}

/// A column or a nested field of a JSON/struct column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,

    /// Database type, kept as written by the source
    #[serde(rename = "type")]
    pub data_type: String,

    #[serde(rename = "null", default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    /// Generated column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gen: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Nested attributes (JSON/struct columns)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<AttributeStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Self::default()
        }
    }

    /// Set nested attributes
    pub fn with_attrs(mut self, attrs: Vec<Attribute>) -> Self {
        self.attrs = attrs;
        self
    }

    /// Set statistics
    pub fn with_stats(mut self, stats: AttributeStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Sampled distinct values, empty when unknown
    pub fn distinct_values(&self) -> &[Value] {
        self.stats.as_ref().map(|s| s.distinct_values.as_slice()).unwrap_or_default()
    }
}

/// Attribute statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeStats {
    /// Ratio of null values, from 0 to 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nulls: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_avg: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_values: Vec<ValueCount>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distinct_values: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub histogram: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
}

/// A common value and its frequency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: Value,
    pub freq: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub attrs: Vec<AttributePath>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<IndexStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub attrs: Vec<AttributePath>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,

    /// Partial index predicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<IndexStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl Index {
    pub fn new(name: Option<&str>, attrs: Vec<AttributePath>) -> Self {
        Self {
            name: name.map(str::to_string),
            attrs,
            ..Self::default()
        }
    }

    /// Mark as unique
    pub fn unique(mut self) -> Self {
        self.unique = Some(true);
        self
    }

    /// Set statistics
    pub fn with_stats(mut self, stats: IndexStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn is_unique(&self) -> bool {
        self.unique.unwrap_or(false)
    }

    /// Index name, or its attributes when unnamed
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("({})", crate::refs::attribute_paths_id(&self.attrs)))
    }
}

/// Index usage statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scans: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scans_last: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Check {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub attrs: Vec<AttributePath>,

    pub predicate: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// Entity statistics (sizes in bytes)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_dead: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_idx: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_toast: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_toast_idx: Option<u64>,

    /// Sequential scan count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_seq: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_seq_last: Option<DateTime<Utc>>,

    /// Index scan count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_idx: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_idx_last: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyze_last: Option<DateTime<Utc>>,

    /// Rows modified since last analyze
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyze_lag: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacuum_last: Option<DateTime<Utc>>,

    /// Rows modified since last vacuum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacuum_lag: Option<u64>,
}

impl EntityStats {
    /// Total scans (sequential + index), `None` when neither is known
    pub fn scans(&self) -> Option<u64> {
        match (self.scan_seq, self.scan_idx) {
            (None, None) => None,
            (seq, idx) => Some(seq.unwrap_or(0).saturating_add(idx.unwrap_or(0))),
        }
    }

    /// Most recent scan of any kind
    pub fn scans_last(&self) -> Option<DateTime<Utc>> {
        self.scan_seq_last.max(self.scan_idx_last)
    }
}

/// Where a relation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationOrigin {
    /// Declared foreign key
    Fk,
    InferName,
    InferSimilar,
    InferQuery,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// One attribute pair of a relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationLink {
    pub src: AttributePath,

    #[serde(rename = "ref")]
    pub reference: AttributePath,
}

/// Discriminator of a polymorphic relation: the relation holds only when
/// `attribute` equals `value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationPolymorphic {
    pub attribute: AttributePath,
    pub value: Value,
}

/// A directed link from source attributes to referenced attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RelationKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<RelationOrigin>,

    pub src: EntityRef,

    #[serde(rename = "ref")]
    pub reference: EntityRef,

    pub attrs: Vec<RelationLink>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polymorphic: Option<RelationPolymorphic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl Relation {
    /// Relation with a single attribute pair
    pub fn new(src: EntityRef, src_attr: AttributePath, reference: EntityRef, ref_attr: AttributePath) -> Self {
        Self {
            name: None,
            kind: None,
            origin: None,
            src,
            reference,
            attrs: vec![RelationLink {
                src: src_attr,
                reference: ref_attr,
            }],
            polymorphic: None,
            doc: None,
            extra: None,
        }
    }

    /// Set origin
    pub fn with_origin(mut self, origin: RelationOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Source side as attributes ref
    pub fn src_attrs(&self) -> AttributesRef {
        AttributesRef::new(self.src.clone(), self.attrs.iter().map(|a| a.src.clone()).collect())
    }

    /// Referenced side as attributes ref
    pub fn ref_attrs(&self) -> AttributesRef {
        AttributesRef::new(self.reference.clone(), self.attrs.iter().map(|a| a.reference.clone()).collect())
    }

    /// Canonical id: `src(attrs)->ref(attrs)`
    pub fn id(&self) -> String {
        format!("{}->{}", self.src_attrs().id(), self.ref_attrs().id())
    }

    /// Same source and referenced attributes, ignoring name/origin/polymorphism
    pub fn same_link(&self, other: &Relation) -> bool {
        self.src == other.src && self.reference == other.reference && self.attrs == other.attrs
    }
}

/// A custom type (enum or free-form definition)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Type {
    #[serde(flatten)]
    pub namespace: Namespace,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}
