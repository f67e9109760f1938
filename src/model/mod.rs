//! Smithy model module
//!
//! Loads Smithy JSON AST models and resolves paginated operations.
//!
//! # Overview
//!
//! Only the shapes needed to check pagination paths are interpreted:
//! aggregates, collections, simple types, operations, services and
//! resources. Resolution merges the service-level `paginated` trait into
//! each operation's trait and validates every path before pagination can
//! start.

mod resolve;
mod types;

pub use resolve::load_model;
pub use types::{
    short_name, AggregateShape, ListShape, MapShape, MemberShape, OperationShape, PaginatedEntry,
    PaginatedTrait, ResourceShape, ServiceShape, Shape, ShapeKind, ShapeRef, SimpleShape,
    SmithyModel, PAGINATED_TRAIT,
};
