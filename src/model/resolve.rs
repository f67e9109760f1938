//! Paginated trait resolution
//!
//! Turns a `smithy.api#paginated` trait into a [`PaginatedOperation`],
//! checking every path against the operation's input and output shapes.
//! All failures here are configuration errors raised before any page is
//! fetched.

use super::types::{
    short_name, OperationShape, PaginatedEntry, PaginatedTrait, Shape, ShapeKind, SmithyModel,
    PAGINATED_TRAIT,
};
use crate::binding::{FieldPath, PaginatedOperation};
use crate::error::{Error, Result};
use crate::pagination::EndBehavior;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a Smithy JSON AST model from a file
pub fn load_model(path: impl AsRef<Path>) -> Result<SmithyModel> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read model file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    SmithyModel::from_json_str(&content)
}

impl SmithyModel {
    /// Parse a Smithy JSON AST document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let model: SmithyModel = serde_json::from_str(json).map_err(Error::model_parse)?;

        let major = model.smithy.split('.').next().unwrap_or_default();
        if major != "1" && major != "2" {
            return Err(Error::invalid_value(
                "smithy",
                format!("unsupported Smithy version '{}'", model.smithy),
            ));
        }

        debug!(shapes = model.shapes.len(), version = %model.smithy, "Loaded Smithy model");
        Ok(model)
    }

    /// Look up a shape by absolute ID
    pub fn shape(&self, id: &str) -> Result<&Shape> {
        self.shapes.get(id).ok_or_else(|| Error::unknown_shape(id))
    }

    /// Classify a shape, including `smithy.api` prelude shapes
    pub fn kind_of(&self, id: &str) -> Result<ShapeKind> {
        if let Some(shape) = self.shapes.get(id) {
            return Ok(shape.kind());
        }
        prelude_kind(id).ok_or_else(|| Error::unknown_shape(id))
    }

    /// Find an operation by absolute ID or unambiguous short name
    pub fn find_operation(&self, name: &str) -> Result<&str> {
        if name.contains('#') {
            return match self.shapes.get_key_value(name) {
                Some((id, Shape::Operation(_))) => Ok(id.as_str()),
                Some(_) => Err(Error::config(format!("Shape '{name}' is not an operation"))),
                None => Err(Error::unknown_shape(name)),
            };
        }

        let mut candidates: Vec<&str> = self
            .shapes
            .iter()
            .filter(|(id, shape)| matches!(shape, Shape::Operation(_)) && short_name(id) == name)
            .map(|(id, _)| id.as_str())
            .collect();
        candidates.sort_unstable();

        match candidates.as_slice() {
            [] => Err(Error::unknown_shape(name)),
            [id] => Ok(*id),
            _ => Err(Error::AmbiguousOperation {
                name: name.to_string(),
                candidates: candidates.join(", "),
            }),
        }
    }

    /// Operations bound to a service, directly or through its resources
    pub fn service_operations(&self, service_id: &str) -> Result<BTreeSet<String>> {
        let Shape::Service(service) = self.shape(service_id)? else {
            return Err(Error::config(format!(
                "Shape '{service_id}' is not a service"
            )));
        };

        let mut operations: BTreeSet<String> =
            service.operations.iter().map(|r| r.target.clone()).collect();
        let mut pending: Vec<String> = service.resources.iter().map(|r| r.target.clone()).collect();
        let mut visited = BTreeSet::new();

        while let Some(resource_id) = pending.pop() {
            if !visited.insert(resource_id.clone()) {
                continue;
            }
            if let Some(Shape::Resource(resource)) = self.shapes.get(&resource_id) {
                operations.extend(resource.bound_operations().map(|r| r.target.clone()));
                pending.extend(resource.resources.iter().map(|r| r.target.clone()));
            }
        }

        Ok(operations)
    }

    /// Every operation carrying the paginated trait, sorted by shape ID
    ///
    /// Values missing on the operation are filled from the paginated trait
    /// of the service it is bound to.
    pub fn paginated_operations(&self) -> Result<Vec<PaginatedEntry>> {
        let owners = self.operation_owners()?;
        let mut entries = Vec::new();

        for (id, shape) in &self.shapes {
            let Shape::Operation(operation) = shape else {
                continue;
            };
            let Some(own) = paginated_trait_of(operation)? else {
                continue;
            };

            let service = owners.get(id.as_str()).map(|s| (*s).to_string());
            let paginated = match &service {
                Some(service_id) => own.merge(&self.service_paginated_defaults(service_id)?),
                None => own,
            };

            entries.push(PaginatedEntry {
                operation: id.clone(),
                service,
                paginated,
            });
        }

        entries.sort_by(|a, b| a.operation.cmp(&b.operation));
        Ok(entries)
    }

    /// The merged paginated trait of one operation
    pub fn paginated_trait(&self, operation: &str) -> Result<PaginatedTrait> {
        let id = self.find_operation(operation)?;
        self.paginated_operations()?
            .into_iter()
            .find(|entry| entry.operation == id)
            .map(|entry| entry.paginated)
            .ok_or_else(|| Error::NotPaginated {
                operation: id.to_string(),
            })
    }

    /// Resolve a paginated operation against its input and output shapes
    pub fn resolve(&self, operation: &str, behavior: EndBehavior) -> Result<PaginatedOperation> {
        let id = self.find_operation(operation)?;
        let Shape::Operation(shape) = self.shape(id)? else {
            return Err(Error::config(format!("Shape '{id}' is not an operation")));
        };
        let paginated = self.paginated_trait(id)?;

        let input = shape
            .input
            .as_ref()
            .ok_or_else(|| Error::config(format!("Operation '{id}' has no input")))?;
        let output = shape
            .output
            .as_ref()
            .ok_or_else(|| Error::config(format!("Operation '{id}' has no output")))?;

        let input_token = paginated
            .input_token
            .as_deref()
            .ok_or_else(|| Error::missing_field(format!("{id}: paginated.inputToken")))?;
        let input_token = FieldPath::member(input_token)?;
        self.expect_kind(
            &input.target,
            &input_token,
            &[ShapeKind::String, ShapeKind::Map],
        )?;

        let output_token = paginated
            .output_token
            .as_deref()
            .ok_or_else(|| Error::missing_field(format!("{id}: paginated.outputToken")))?;
        let output_token = FieldPath::parse(output_token)?;
        self.expect_kind(
            &output.target,
            &output_token,
            &[ShapeKind::String, ShapeKind::Map],
        )?;

        let mut resolved = PaginatedOperation::new(short_name(id), input_token, output_token)?;

        if let Some(items) = paginated.items.as_deref() {
            let items = FieldPath::parse(items)?;
            self.expect_kind(&output.target, &items, &[ShapeKind::List, ShapeKind::Map])?;
            resolved = resolved.with_items(items);
        }

        if let Some(page_size) = paginated.page_size.as_deref() {
            let page_size = FieldPath::member(page_size)?;
            self.expect_kind(&input.target, &page_size, &[ShapeKind::Integer])?;
            resolved = resolved.with_page_size_member(page_size);
        }

        if let EndBehavior::TruncationMember { member } = &behavior {
            let flag = FieldPath::parse(member)?;
            self.expect_kind(&output.target, &flag, &[ShapeKind::Boolean])?;
        }

        debug!(operation = %id, behavior = ?behavior, "Resolved paginated operation");
        Ok(resolved.with_end_behavior(behavior))
    }

    /// Walk a member path from a structure and return the final target ID
    pub fn member_target(&self, shape_id: &str, path: &FieldPath) -> Result<String> {
        let mut current = shape_id.to_string();

        for segment in path.segments() {
            let members = match self.shape(&current)? {
                Shape::Structure(aggregate) | Shape::Union(aggregate) => &aggregate.members,
                _ => {
                    return Err(Error::invalid_path(
                        path.to_string(),
                        format!("'{current}' is not a structure, cannot select '{segment}'"),
                    ))
                }
            };
            let member = members
                .get(segment)
                .ok_or_else(|| Error::unknown_member(current.as_str(), segment.as_str()))?;
            current = member.target.clone();
        }

        Ok(current)
    }

    fn expect_kind(&self, root: &str, path: &FieldPath, allowed: &[ShapeKind]) -> Result<()> {
        let target = self.member_target(root, path)?;
        let kind = self.kind_of(&target)?;
        if allowed.contains(&kind) {
            Ok(())
        } else {
            Err(Error::invalid_path(
                path.to_string(),
                format!("targets '{target}' ({kind:?}), expected one of {allowed:?}"),
            ))
        }
    }

    /// Map each bound operation to the first service (by ID) binding it
    fn operation_owners(&self) -> Result<BTreeMap<String, &str>> {
        let mut services: Vec<&str> = self
            .shapes
            .iter()
            .filter(|(_, shape)| matches!(shape, Shape::Service(_)))
            .map(|(id, _)| id.as_str())
            .collect();
        services.sort_unstable();

        let mut owners = BTreeMap::new();
        for service in services {
            for operation in self.service_operations(service)? {
                owners.entry(operation).or_insert(service);
            }
        }
        Ok(owners)
    }

    fn service_paginated_defaults(&self, service_id: &str) -> Result<PaginatedTrait> {
        let traits = self.shape(service_id)?.traits();
        match traits.and_then(|t| t.get(PAGINATED_TRAIT)) {
            Some(value) => serde_json::from_value(value.clone()).map_err(Error::model_parse),
            None => Ok(PaginatedTrait::default()),
        }
    }
}

fn paginated_trait_of(operation: &OperationShape) -> Result<Option<PaginatedTrait>> {
    operation
        .traits
        .get(PAGINATED_TRAIT)
        .map(|value| serde_json::from_value(value.clone()).map_err(Error::model_parse))
        .transpose()
}

/// Kinds of the `smithy.api` prelude shapes
fn prelude_kind(id: &str) -> Option<ShapeKind> {
    let name = id.strip_prefix("smithy.api#")?;
    let kind = match name {
        "String" => ShapeKind::String,
        "Boolean" | "PrimitiveBoolean" => ShapeKind::Boolean,
        "Byte" | "PrimitiveByte" | "Short" | "PrimitiveShort" | "Integer"
        | "PrimitiveInteger" | "Long" | "PrimitiveLong" => ShapeKind::Integer,
        "Unit" => ShapeKind::Structure,
        _ => ShapeKind::Other,
    };
    Some(kind)
}
