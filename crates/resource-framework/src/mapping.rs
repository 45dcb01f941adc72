//! # Field Mapper
//!
//! Applies a static rename table to a nested JSON structure. This is how flat
//! API resource fields become nested CQRS command/query fields and how CQRS
//! results become API resources.
//!
//! ## Semantics
//!
//! - Every entry reads its source from the input as it was before the table
//!   ran, so chained renames (`a -> b`, `b -> c`) and swaps move each value
//!   exactly once.
//! - Sources that no entry writes to are removed first; destinations are
//!   written afterwards, so a destination nested under a removed source
//!   survives. Entries writing the same destination: the last one wins.
//! - A missing source is skipped silently. A source holding `null` is still
//!   written to its destination as `null`.
//! - Missing (or `null`) intermediate containers on the destination side are
//!   created.
//! - Everything the table does not mention stays where it was.
//! - `[]` segments apply the rename to every list element independently.

use crate::error::MappingError;
use crate::path::{PropertyPath, Segment};
use serde_json::Value;
use tracing::debug;

/// One `source -> destination` rename.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub source: PropertyPath,
    pub destination: PropertyPath,
}

/// Ordered rename table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    entries: Vec<FieldMapping>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(source, destination)` string pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .try_fold(Self::new(), |table, (source, destination)| {
                table.map(source, destination)
            })
    }

    /// Appends one rename.
    pub fn map(mut self, source: &str, destination: &str) -> Result<Self, MappingError> {
        let source: PropertyPath = source.parse()?;
        let destination: PropertyPath = destination.parse()?;
        check_iteration(&source, &destination)?;
        self.entries.push(FieldMapping {
            source,
            destination,
        });
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[FieldMapping] {
        &self.entries
    }

    /// Applies the table to `data` and returns the renamed structure.
    pub fn apply(&self, data: &Value) -> Value {
        let mut output = data.clone();
        if self.entries.is_empty() {
            return output;
        }

        for mapping in &self.entries {
            let rewritten = self
                .entries
                .iter()
                .any(|other| other.destination == mapping.source);
            if !rewritten {
                remove_source(&mut output, mapping.source.segments());
            }
        }

        for mapping in &self.entries {
            copy_value(
                data,
                &mut output,
                mapping.source.segments(),
                mapping.destination.segments(),
            );
        }

        output
    }

    /// Applies the table to every element of a list (or list of lists), or to
    /// the value itself when it is not a list.
    pub fn apply_each(&self, data: &Value) -> Value {
        match data {
            Value::Array(items) => {
                Value::Array(items.iter().map(|i| self.apply_each(i)).collect())
            }
            other => self.apply(other),
        }
    }
}

/// Iteration segments must sit at the same depth behind the same prefix.
fn check_iteration(
    source: &PropertyPath,
    destination: &PropertyPath,
) -> Result<(), MappingError> {
    let mismatch = || MappingError::MismatchedIteration {
        source_path: source.to_string(),
        destination: destination.to_string(),
    };
    let positions = |p: &PropertyPath| -> Vec<usize> {
        p.segments()
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Segment::Each)
            .map(|(i, _)| i)
            .collect()
    };

    let source_each = positions(source);
    if source_each != positions(destination) {
        return Err(mismatch());
    }
    if let Some(&last) = source_each.last() {
        if source.segments()[..=last] != destination.segments()[..=last] {
            return Err(mismatch());
        }
    }
    Ok(())
}

/// Copies the value at `source` in `input` to `destination` in `target`.
fn copy_value(input: &Value, target: &mut Value, source: &[Segment], destination: &[Segment]) {
    match (source.split_first(), destination.split_first()) {
        // Shared iteration: rename inside each element.
        (Some((Segment::Each, src_rest)), Some((Segment::Each, dst_rest))) => {
            if let (Value::Array(originals), Value::Array(items)) = (input, target) {
                for (original, item) in originals.iter().zip(items.iter_mut()) {
                    copy_value(original, item, src_rest, dst_rest);
                }
            }
        }
        // Shared prefix leading to an iteration: descend.
        (Some((Segment::Key(a), src_rest)), Some((Segment::Key(b), dst_rest)))
            if a == b && src_rest.contains(&Segment::Each) =>
        {
            let child = target.as_object_mut().and_then(|m| m.get_mut(a));
            if let (Some(original), Some(child)) = (input.get(a), child) {
                copy_value(original, child, src_rest, dst_rest);
            }
        }
        _ => {
            let source = PropertyPath::new(source.to_vec());
            let Some(value) = source.get(input) else {
                return;
            };
            let destination = PropertyPath::new(destination.to_vec());
            if !destination.set(target, value) {
                debug!(%source, %destination, "Mapping skipped, destination blocked");
            }
        }
    }
}

fn remove_source(target: &mut Value, source: &[Segment]) {
    match source.split_first() {
        Some((Segment::Each, rest)) if !rest.is_empty() => {
            if let Value::Array(items) = target {
                for item in items.iter_mut() {
                    remove_source(item, rest);
                }
            }
        }
        Some((Segment::Key(key), rest)) if rest.contains(&Segment::Each) => {
            if let Some(child) = target.as_object_mut().and_then(|m| m.get_mut(key)) {
                remove_source(child, rest);
            }
        }
        _ => {
            PropertyPath::new(source.to_vec()).remove(target);
        }
    }
}
