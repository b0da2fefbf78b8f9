//! Track which attributes were assigned since load or last save.
//!
//! Flagging records intent to write, not an observed change: `flag` never
//! compares values, so an UPDATE may rewrite an unchanged value but a changed
//! attribute is never missing from the diff.

use std::collections::HashMap;

use crate::value::Value;

/// Insertion-ordered set of flagged attribute names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtySet {
    names: Vec<String>,
}

impl DirtySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag an attribute. Flagging an already-flagged name is a no-op.
    pub fn flag(&mut self, name: &str) {
        if !self.is_flagged(name) {
            self.names.push(name.to_string());
        }
    }

    /// Remove a flag, if present.
    pub fn unflag(&mut self, name: &str) {
        self.names.retain(|n| n != name);
    }

    #[must_use]
    pub fn is_flagged(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Pair every flagged name with its current value in `attributes`.
    ///
    /// Values are read at call time, so repeated assignments collapse to the
    /// final value. Flagged names absent from `attributes` are skipped.
    #[must_use]
    pub fn diff(&self, attributes: &HashMap<String, Value>) -> Vec<(String, Value)> {
        self.names
            .iter()
            .filter_map(|name| {
                attributes
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    /// Empty the set after a successful persist.
    pub fn clear(&mut self) {
        self.names.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Flagged names in flag order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
