//! Member paths
//!
//! Dotted paths such as `Result.Pagination.NextToken` that locate a member
//! inside a JSON document.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Smithy member identifier
static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier regex")
});

/// A parsed, non-empty member path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path (a leading `$.` is accepted and ignored)
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        let trimmed = trimmed.strip_prefix("$.").unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(Error::invalid_path(path, "path is empty"));
        }

        let segments = trimmed
            .split('.')
            .map(|segment| {
                if segment.is_empty() {
                    Err(Error::invalid_path(path, "empty segment"))
                } else if !IDENTIFIER_REGEX.is_match(segment) {
                    Err(Error::invalid_path(
                        path,
                        format!("'{segment}' is not a valid member name"),
                    ))
                } else {
                    Ok(segment.to_string())
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { segments })
    }

    /// Build a single-member path
    pub fn member(name: &str) -> Result<Self> {
        let path = Self::parse(name)?;
        if path.segments.len() != 1 {
            return Err(Error::invalid_path(name, "expected a single member name"));
        }
        Ok(path)
    }

    /// Path segments, outermost first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this path names a top-level member
    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }

    /// Follow the path; `None` if any step is missing, not an object, or null
    pub fn read<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for segment in &self.segments {
            current = current.as_object()?.get(segment)?;
        }
        (!current.is_null()).then_some(current)
    }

    /// Move the member at this path out of `value`
    ///
    /// Same lookup rules as [`read`](Self::read); the member is removed from
    /// its parent object.
    pub fn take(&self, value: &mut Value) -> Option<Value> {
        let (leaf, parents) = self.segments.split_last()?;
        let mut current = value;
        for segment in parents {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
        current
            .as_object_mut()?
            .remove(leaf)
            .filter(|taken| !taken.is_null())
    }

    /// Set the member at this path, or remove it when `new_value` is `None`
    ///
    /// Intermediate objects are created as needed when setting.
    pub fn write(&self, target: &mut Value, new_value: Option<Value>) {
        match new_value {
            Some(value) => insert_at(target, &self.segments, value),
            None => remove_at(target, &self.segments),
        }
    }
}

fn insert_at(target: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        let slot = map.entry(head.clone()).or_insert(Value::Null);
        insert_at(slot, rest, value);
    }
}

fn remove_at(target: &mut Value, segments: &[String]) {
    match segments {
        [] => {}
        [leaf] => {
            if let Value::Object(map) = target {
                map.remove(leaf);
            }
        }
        [head, rest @ ..] => {
            if let Some(child) = target.get_mut(head.as_str()) {
                remove_at(child, rest);
            }
        }
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
