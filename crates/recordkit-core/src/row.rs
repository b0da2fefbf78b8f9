//! Result rows returned by a `Connection`.

use crate::value::Value;

/// A single backend row: ordered (column name, value) pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from column/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Append a column.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Look up a value by column name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, v)| v)
    }

    /// Value at a position.
    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.entries.get(idx).map(|(_, v)| v)
    }

    /// Remove a column, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(col, _)| col == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Remove a column matched without regard to ASCII case.
    ///
    /// Backends that fold unquoted identifiers report them in their own case.
    pub fn remove_ignore_case(&mut self, name: &str) -> Option<Value> {
        let idx = self
            .entries
            .iter()
            .position(|(col, _)| col.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(idx).1)
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(col, _)| col.as_str())
    }

    /// Iterate over (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(col, v)| (col.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
