//! Records: attribute state for one row of a model.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use recordkit_core::{DirtySet, Error, Result, Row, Value};

use crate::accessor::Accessor;
use crate::model::DirtyTracking;
use crate::table::Table;

/// One model instance: typed attributes, dirty flags and lifecycle state.
///
/// Attributes are keyed by attribute (inflected) name and always hold the
/// canonical value for their column's semantic type.
#[derive(Clone)]
pub struct Record {
    table: Arc<Table>,
    attributes: HashMap<String, Value>,
    dirty: DirtySet,
    new_record: bool,
    readonly: bool,
    associations: HashMap<String, Record>,
}

impl Record {
    /// A new, unsaved record seeded with column defaults. Nothing is flagged.
    pub fn new(table: Arc<Table>) -> Self {
        let attributes = table
            .columns()
            .iter()
            .map(|c| (c.inflected_name.clone(), c.default.clone()))
            .collect();
        Self {
            table,
            attributes,
            dirty: DirtySet::new(),
            new_record: true,
            readonly: false,
            associations: HashMap::new(),
        }
    }

    /// A persisted record hydrated from a backend row.
    pub fn from_row(table: Arc<Table>, row: Row, readonly: bool) -> Result<Self> {
        let attributes = table.hydrate(row)?;
        Ok(Self {
            table,
            attributes,
            dirty: DirtySet::new(),
            new_record: false,
            readonly,
            associations: HashMap::new(),
        })
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn model_name(&self) -> &'static str {
        self.table.class_name()
    }

    /// Read an attribute through the access table.
    pub fn get(&self, name: &str) -> Result<Value> {
        match self.table.accessors().get(name) {
            Some(Accessor::Column(attribute)) => Ok(self
                .attributes
                .get(attribute)
                .cloned()
                .unwrap_or_default()),
            Some(Accessor::Custom {
                getter: Some(getter),
                ..
            }) => getter(self),
            Some(Accessor::Delegate {
                association,
                attribute,
            }) => match self.associations.get(association) {
                Some(associated) => associated.get(attribute),
                None => Ok(Value::Null),
            },
            Some(Accessor::Custom { getter: None, .. }) | None => {
                // Computed select columns live only in the attribute map.
                self.attributes
                    .get(name)
                    .cloned()
                    .ok_or_else(|| self.unknown(name))
            }
        }
    }

    /// Assign an attribute through the access table.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let table = Arc::clone(&self.table);
        match table.accessors().get(name) {
            Some(Accessor::Column(attribute)) => self.write_attribute(attribute, value),
            Some(Accessor::Custom {
                setter: Some(setter),
                ..
            }) => setter(self, value),
            Some(Accessor::Delegate {
                association,
                attribute,
            }) => match self.associations.get_mut(association) {
                Some(associated) => associated.set(attribute, value),
                None => Err(Error::configuration(format!(
                    "{}: association '{association}' is not loaded",
                    table.class_name()
                ))),
            },
            Some(Accessor::Custom { setter: None, .. }) | None => Err(self.unknown(name)),
        }
    }

    /// Stored value of a column attribute, bypassing custom accessors.
    pub fn read_attribute(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Cast and store a column attribute, flagging it per the model's tracking mode.
    pub fn write_attribute(&mut self, attribute: &str, value: Value) -> Result<()> {
        let value = self.table.cast_for_write(attribute, value)?;
        let changed = self.attributes.get(attribute) != Some(&value);
        if changed || self.table.dirty_tracking() == DirtyTracking::OnAssignment {
            self.dirty.flag(attribute);
        }
        self.attributes.insert(attribute.to_string(), value);
        Ok(())
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    /// Flagged attributes paired with their current values.
    pub fn dirty_attributes(&self) -> Vec<(String, Value)> {
        self.dirty.diff(&self.attributes)
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Flag an attribute without assigning it.
    pub fn flag_dirty(&mut self, attribute: &str) {
        self.dirty.flag(attribute);
    }

    pub fn reset_dirty(&mut self) {
        self.dirty.clear();
    }

    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    /// Mark as persisted after a successful insert.
    pub fn mark_persisted(&mut self) {
        self.new_record = false;
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    /// Primary-key values in key order; `Null` for unset parts.
    pub fn primary_key_values(&self) -> Vec<Value> {
        self.table
            .primary_key()
            .iter()
            .map(|pk| self.attributes.get(pk).cloned().unwrap_or_default())
            .collect()
    }

    /// Store a key value generated by the backend. Does not flag.
    pub fn assign_generated_key(&mut self, attribute: &str, value: Value) -> Result<()> {
        let value = self.table.cast_for_write(attribute, value)?;
        self.attributes.insert(attribute.to_string(), value);
        Ok(())
    }

    pub fn set_association(&mut self, name: impl Into<String>, record: Record) {
        self.associations.insert(name.into(), record);
    }

    pub fn association(&self, name: &str) -> Option<&Record> {
        self.associations.get(name)
    }

    fn unknown(&self, name: &str) -> Error {
        Error::UnknownAttribute {
            model: self.model_name().to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &self.model_name())
            .field("attributes", &self.attributes)
            .field("dirty", &self.dirty)
            .field("new_record", &self.new_record)
            .field("readonly", &self.readonly)
            .finish_non_exhaustive()
    }
}
