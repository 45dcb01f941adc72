//! Typed property paths.
//!
//! Rename tables address values inside nested JSON with small path expressions.
//! Two notations are accepted because both show up in declarations:
//!
//! - dot notation: `apiClient.name`, `items[].productId`, `items.*.productId`
//! - bracket notation: `[id_api_client]`, `[localizedNames][1]`
//!
//! A purely numeric bracket is an index, `[]` or `*` means "every element",
//! anything else is an object key.

use crate::error::MappingError;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// One step of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
    Each,
}

/// An ordered sequence of key/index selectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<Segment>,
}

impl PropertyPath {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Single-key path.
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(name.into())],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_iteration(&self) -> bool {
        self.segments.iter().any(|s| *s == Segment::Each)
    }

    /// Reads the value at this path.
    ///
    /// Returns `None` when the path is absent and `Some(Value::Null)` when it is
    /// present with a `null` value. Paths containing [`Segment::Each`] collect
    /// every element into an array.
    pub fn get(&self, value: &Value) -> Option<Value> {
        read(value, &self.segments)
    }

    /// Writes `new_value` at this path, creating missing containers.
    ///
    /// Returns `false` when a non-container value blocks the path.
    pub fn set(&self, target: &mut Value, new_value: Value) -> bool {
        write(target, &self.segments, new_value)
    }

    /// Removes the value at this path. Returns the removed value if any.
    pub fn remove(&self, target: &mut Value) -> Option<Value> {
        remove(target, &self.segments)
    }
}

fn read(value: &Value, segments: &[Segment]) -> Option<Value> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(value.clone());
    };
    match (first, value) {
        (Segment::Key(key), Value::Object(map)) => map.get(key).and_then(|v| read(v, rest)),
        (Segment::Index(index), Value::Array(items)) => {
            items.get(*index).and_then(|v| read(v, rest))
        }
        (Segment::Each, Value::Array(items)) => Some(Value::Array(
            items.iter().filter_map(|item| read(item, rest)).collect(),
        )),
        _ => None,
    }
}

fn write(target: &mut Value, segments: &[Segment], new_value: Value) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        *target = new_value;
        return true;
    };

    if target.is_null() {
        *target = match first {
            Segment::Key(_) => Value::Object(Map::new()),
            Segment::Index(_) | Segment::Each => Value::Array(Vec::new()),
        };
    }

    match (first, target) {
        (Segment::Key(key), Value::Object(map)) => {
            let slot = map.entry(key.clone()).or_insert(Value::Null);
            write(slot, rest, new_value)
        }
        (Segment::Index(index), Value::Array(items)) => {
            if items.len() <= *index {
                items.resize(index + 1, Value::Null);
            }
            write(&mut items[*index], rest, new_value)
        }
        (Segment::Each, Value::Array(items)) => {
            // Writing through an iteration spreads an array value element-wise.
            let values = match new_value {
                Value::Array(values) => values,
                other => vec![other; items.len()],
            };
            if items.len() < values.len() {
                items.resize(values.len(), Value::Null);
            }
            let mut written = true;
            for (item, value) in items.iter_mut().zip(values) {
                written &= write(item, rest, value);
            }
            written
        }
        (segment, blocking) => {
            debug!(?segment, blocking = %blocking, "Path blocked by a scalar");
            false
        }
    }
}

fn remove(target: &mut Value, segments: &[Segment]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;
    if parents.is_empty() {
        return match (last, target) {
            (Segment::Key(key), Value::Object(map)) => map.remove(key),
            (Segment::Index(index), Value::Array(items)) if *index < items.len() => {
                // Keep positions stable for sibling indexes.
                Some(std::mem::replace(&mut items[*index], Value::Null))
            }
            (Segment::Each, Value::Array(items)) => Some(Value::Array(std::mem::take(items))),
            _ => None,
        };
    }

    let (first, rest) = segments.split_first()?;
    match (first, target) {
        (Segment::Key(key), Value::Object(map)) => map.get_mut(key).and_then(|v| remove(v, rest)),
        (Segment::Index(index), Value::Array(items)) => {
            items.get_mut(*index).and_then(|v| remove(v, rest))
        }
        (Segment::Each, Value::Array(items)) => {
            let removed: Vec<Value> = items.iter_mut().filter_map(|v| remove(v, rest)).collect();
            if removed.is_empty() {
                None
            } else {
                Some(Value::Array(removed))
            }
        }
        _ => None,
    }
}

impl FromStr for PropertyPath {
    type Err = MappingError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| MappingError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut after_bracket = false;
        let mut chars = path.chars();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if current.is_empty() {
                        // `a[0].b` leaves nothing pending before the dot.
                        if !after_bracket {
                            return Err(invalid("empty segment"));
                        }
                    } else {
                        segments.push(plain_segment(&current));
                        current.clear();
                    }
                    after_bracket = false;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(plain_segment(&current));
                        current.clear();
                    }
                    let mut inner = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        if c == '[' {
                            return Err(invalid("nested bracket"));
                        }
                        inner.push(c);
                    }
                    if !closed {
                        return Err(invalid("unbalanced bracket"));
                    }
                    segments.push(bracket_segment(&inner));
                    after_bracket = true;
                }
                ']' => return Err(invalid("unbalanced bracket")),
                c => {
                    if after_bracket {
                        return Err(invalid("missing `.` after bracket"));
                    }
                    current.push(c);
                }
            }
        }
        if !current.is_empty() {
            segments.push(plain_segment(&current));
        } else if path.ends_with('.') {
            return Err(invalid("empty segment"));
        }
        if segments.is_empty() {
            return Err(invalid("empty path"));
        }
        Ok(Self { segments })
    }
}

fn plain_segment(raw: &str) -> Segment {
    if raw == "*" {
        Segment::Each
    } else {
        Segment::Key(raw.to_string())
    }
}

fn bracket_segment(raw: &str) -> Segment {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "*" {
        Segment::Each
    } else if let Ok(index) = trimmed.parse::<usize>() {
        Segment::Index(index)
    } else {
        Segment::Key(trimmed.to_string())
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{key}")?;
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Each => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> PropertyPath {
        raw.parse().unwrap()
    }

    #[test]
    fn test_parse_dot_and_bracket_notation() {
        assert_eq!(
            path("apiClient.name").segments(),
            &[Segment::Key("apiClient".into()), Segment::Key("name".into())]
        );
        assert_eq!(
            path("[localizedNames][1]").segments(),
            &[Segment::Key("localizedNames".into()), Segment::Index(1)]
        );
        assert_eq!(
            path("items[].productId").segments(),
            &[
                Segment::Key("items".into()),
                Segment::Each,
                Segment::Key("productId".into())
            ]
        );
        assert_eq!(path("items.*.id"), path("items[].id"));
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        assert!("".parse::<PropertyPath>().is_err());
        assert!("a..b".parse::<PropertyPath>().is_err());
        assert!("[a".parse::<PropertyPath>().is_err());
        assert!("a]".parse::<PropertyPath>().is_err());
        assert!("a.".parse::<PropertyPath>().is_err());
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(path("[a][b][2]").to_string(), "a.b[2]");
        assert_eq!(path("items.*.id").to_string(), "items[].id");
    }

    #[test]
    fn test_get_distinguishes_null_from_absent() {
        let data = json!({"description": null, "nested": {"id": 3}});
        assert_eq!(path("description").get(&data), Some(Value::Null));
        assert_eq!(path("missing").get(&data), None);
        assert_eq!(path("nested.id").get(&data), Some(json!(3)));
    }

    #[test]
    fn test_set_creates_intermediate_containers() {
        let mut data = json!({});
        assert!(path("a.b[2].c").set(&mut data, json!(true)));
        assert_eq!(data, json!({"a": {"b": [null, null, {"c": true}]}}));
    }

    #[test]
    fn test_set_is_blocked_by_scalar() {
        let mut data = json!({"a": 5});
        assert!(!path("a.b").set(&mut data, json!(1)));
        assert_eq!(data, json!({"a": 5}));
    }

    #[test]
    fn test_remove_through_iteration() {
        let mut data = json!({"items": [{"id": 1, "x": 1}, {"id": 2}]});
        let removed = path("items[].id").remove(&mut data);
        assert_eq!(removed, Some(json!([1, 2])));
        assert_eq!(data, json!({"items": [{"x": 1}, {}]}));
    }
}
