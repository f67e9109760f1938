//! Smithy JSON AST types
//!
//! The subset of the Smithy 1.0/2.0 JSON AST needed to locate paginated
//! operations and check their member paths. Unknown shape types and fields
//! are accepted and ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Shape ID of the paginated trait
pub const PAGINATED_TRAIT: &str = "smithy.api#paginated";

/// Top-level Smithy model document
#[derive(Debug, Clone, Deserialize)]
pub struct SmithyModel {
    /// Smithy version (e.g., "2.0")
    pub smithy: String,
    /// All shapes defined in the model, keyed by their absolute shape ID
    #[serde(default)]
    pub shapes: HashMap<String, Shape>,
}

/// A single Smithy shape
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Shape {
    Structure(AggregateShape),
    Union(AggregateShape),
    List(ListShape),
    Set(ListShape),
    Map(MapShape),
    Operation(OperationShape),
    Service(ServiceShape),
    Resource(ResourceShape),
    String(SimpleShape),
    Enum(SimpleShape),
    Boolean(SimpleShape),
    Byte(SimpleShape),
    Short(SimpleShape),
    Integer(SimpleShape),
    IntEnum(SimpleShape),
    Long(SimpleShape),
    Float(SimpleShape),
    Double(SimpleShape),
    BigInteger(SimpleShape),
    BigDecimal(SimpleShape),
    Timestamp(SimpleShape),
    Blob(SimpleShape),
    Document(SimpleShape),
    #[serde(other)]
    Unknown,
}

/// Coarse classification used when checking member paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Structure,
    Union,
    List,
    Map,
    String,
    Boolean,
    Integer,
    Operation,
    Service,
    Other,
}

impl Shape {
    /// Classify this shape
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Structure(_) => ShapeKind::Structure,
            Shape::Union(_) => ShapeKind::Union,
            Shape::List(_) | Shape::Set(_) => ShapeKind::List,
            Shape::Map(_) => ShapeKind::Map,
            Shape::String(_) | Shape::Enum(_) => ShapeKind::String,
            Shape::Boolean(_) => ShapeKind::Boolean,
            Shape::Byte(_)
            | Shape::Short(_)
            | Shape::Integer(_)
            | Shape::IntEnum(_)
            | Shape::Long(_) => ShapeKind::Integer,
            Shape::Operation(_) => ShapeKind::Operation,
            Shape::Service(_) => ShapeKind::Service,
            _ => ShapeKind::Other,
        }
    }

    /// Traits applied to this shape
    pub fn traits(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Shape::Structure(s) | Shape::Union(s) => Some(&s.traits),
            Shape::List(s) | Shape::Set(s) => Some(&s.traits),
            Shape::Map(s) => Some(&s.traits),
            Shape::Operation(s) => Some(&s.traits),
            Shape::Service(s) => Some(&s.traits),
            Shape::Resource(s) => Some(&s.traits),
            Shape::String(s)
            | Shape::Enum(s)
            | Shape::Boolean(s)
            | Shape::Byte(s)
            | Shape::Short(s)
            | Shape::Integer(s)
            | Shape::IntEnum(s)
            | Shape::Long(s)
            | Shape::Float(s)
            | Shape::Double(s)
            | Shape::BigInteger(s)
            | Shape::BigDecimal(s)
            | Shape::Timestamp(s)
            | Shape::Blob(s)
            | Shape::Document(s) => Some(&s.traits),
            Shape::Unknown => None,
        }
    }
}

/// A simple shape with optional traits
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimpleShape {
    #[serde(default)]
    pub traits: HashMap<String, Value>,
}

/// A structure or union shape
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateShape {
    #[serde(default)]
    pub members: BTreeMap<String, MemberShape>,
    #[serde(default)]
    pub traits: HashMap<String, Value>,
}

/// A member within an aggregate shape
#[derive(Debug, Clone, Deserialize)]
pub struct MemberShape {
    /// Target shape ID
    pub target: String,
    #[serde(default)]
    pub traits: HashMap<String, Value>,
}

/// A list (or Smithy 1.0 set) shape
#[derive(Debug, Clone, Deserialize)]
pub struct ListShape {
    pub member: MemberShape,
    #[serde(default)]
    pub traits: HashMap<String, Value>,
}

/// A map shape
#[derive(Debug, Clone, Deserialize)]
pub struct MapShape {
    pub key: MemberShape,
    pub value: MemberShape,
    #[serde(default)]
    pub traits: HashMap<String, Value>,
}

/// An operation shape
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationShape {
    pub input: Option<ShapeRef>,
    pub output: Option<ShapeRef>,
    #[serde(default)]
    pub traits: HashMap<String, Value>,
}

/// A service shape
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceShape {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub operations: Vec<ShapeRef>,
    #[serde(default)]
    pub resources: Vec<ShapeRef>,
    #[serde(default)]
    pub traits: HashMap<String, Value>,
}

/// A resource shape
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceShape {
    #[serde(default)]
    pub create: Option<ShapeRef>,
    #[serde(default)]
    pub put: Option<ShapeRef>,
    #[serde(default)]
    pub read: Option<ShapeRef>,
    #[serde(default)]
    pub update: Option<ShapeRef>,
    #[serde(default)]
    pub delete: Option<ShapeRef>,
    #[serde(default)]
    pub list: Option<ShapeRef>,
    #[serde(default)]
    pub operations: Vec<ShapeRef>,
    #[serde(default)]
    pub collection_operations: Vec<ShapeRef>,
    #[serde(default)]
    pub resources: Vec<ShapeRef>,
    #[serde(default)]
    pub traits: HashMap<String, Value>,
}

impl ResourceShape {
    /// Every operation bound directly to this resource
    pub fn bound_operations(&self) -> impl Iterator<Item = &ShapeRef> {
        [
            &self.create,
            &self.put,
            &self.read,
            &self.update,
            &self.delete,
            &self.list,
        ]
        .into_iter()
        .flatten()
        .chain(&self.operations)
        .chain(&self.collection_operations)
    }
}

/// A reference to another shape
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShapeRef {
    pub target: String,
}

/// Value of the `smithy.api#paginated` trait
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedTrait {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<String>,
}

impl PaginatedTrait {
    /// Fill unset values from the service-level trait
    #[must_use]
    pub fn merge(self, defaults: &PaginatedTrait) -> Self {
        Self {
            input_token: self.input_token.or_else(|| defaults.input_token.clone()),
            output_token: self.output_token.or_else(|| defaults.output_token.clone()),
            items: self.items.or_else(|| defaults.items.clone()),
            page_size: self.page_size.or_else(|| defaults.page_size.clone()),
        }
    }
}

/// A paginated operation found in a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedEntry {
    /// Absolute operation shape ID
    pub operation: String,
    /// Service the operation is bound to, if any
    pub service: Option<String>,
    /// Trait value after merging service defaults
    pub paginated: PaginatedTrait,
}

/// Get the short name from an absolute shape ID
///
/// For example, `com.example#ListThings` returns `ListThings`.
pub fn short_name(shape_id: &str) -> &str {
    shape_id.rsplit_once('#').map_or(shape_id, |(_, name)| name)
}
