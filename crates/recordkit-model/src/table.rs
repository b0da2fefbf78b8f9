//! Per-model table metadata.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use recordkit_core::{Dialect, Error, Inflector, RawColumn, Result, Row, Value};

use crate::accessor::{AccessorRegistrations, AccessorTable};
use crate::callbacks::CallbackRegistry;
use crate::column::Column;
use crate::model::{DirtyTracking, Model};

/// The live connection a table is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub name: String,
    pub dialect: Dialect,
}

impl ConnectionInfo {
    pub fn new(name: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            name: name.into(),
            dialect,
        }
    }
}

/// Everything recordkit knows about one model's table.
///
/// Built completely before it is published to the schema cache and never
/// mutated afterwards, except for the connection binding.
#[derive(Debug)]
pub struct Table {
    class_name: &'static str,
    type_id: TypeId,
    table_name: String,
    database: Option<String>,
    dialect: Dialect,
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    by_inflected_name: HashMap<String, usize>,
    primary_key: Vec<String>,
    sequence: Option<String>,
    connection: RwLock<ConnectionInfo>,
    dirty_tracking: DirtyTracking,
    callbacks: CallbackRegistry,
    accessors: AccessorTable,
}

impl Table {
    /// Physical table name for a model: declared, else inferred from the class name.
    pub fn physical_name<M: Model>(inflector: &dyn Inflector) -> String {
        M::TABLE_NAME.map_or_else(|| inflector.tableize(M::CLASS_NAME), str::to_string)
    }

    /// Build a complete table from introspected columns.
    pub fn build<M: Model>(
        connection: ConnectionInfo,
        raw_columns: &[RawColumn],
        inflector: &dyn Inflector,
    ) -> Result<Self> {
        let dialect = connection.dialect;
        let table_name = Self::physical_name::<M>(inflector);

        let mut columns = Vec::with_capacity(raw_columns.len());
        let mut by_name = HashMap::with_capacity(raw_columns.len());
        let mut by_inflected_name = HashMap::with_capacity(raw_columns.len());
        for raw in raw_columns {
            let column = Column::from_raw(raw, dialect, inflector);
            let idx = columns.len();
            if by_name.insert(column.name.clone(), idx).is_some() {
                return Err(Error::configuration(format!(
                    "{}: column '{}' reported twice for table {table_name}",
                    M::CLASS_NAME,
                    column.name
                )));
            }
            by_inflected_name
                .entry(column.inflected_name.clone())
                .or_insert(idx);
            columns.push(column);
        }

        let primary_key: Vec<String> = if M::PRIMARY_KEY.is_empty() {
            let introspected: Vec<String> = columns
                .iter()
                .filter(|c| c.primary_key)
                .map(|c| c.inflected_name.clone())
                .collect();
            if introspected.is_empty() {
                vec!["id".to_string()]
            } else {
                introspected
            }
        } else {
            M::PRIMARY_KEY.iter().map(|s| (*s).to_string()).collect()
        };

        let sequence = M::SEQUENCE.map(str::to_string).or_else(|| {
            let [pk] = primary_key.as_slice() else {
                return None;
            };
            let pk_column = by_inflected_name.get(pk).map(|&idx| &columns[idx]);
            pk_column
                .and_then(|c| c.sequence.clone())
                .or_else(|| {
                    let raw_pk = pk_column.map_or(pk.as_str(), |c| c.name.as_str());
                    dialect.default_sequence_name(&table_name, raw_pk)
                })
        });

        let mut callbacks = CallbackRegistry::new();
        M::register_callbacks(&mut callbacks);

        let mut registrations = AccessorRegistrations::default();
        M::register_accessors(&mut registrations);
        let accessors = AccessorTable::build(
            M::CLASS_NAME,
            columns.iter().map(|c| c.inflected_name.as_str()),
            registrations,
        )?;

        Ok(Self {
            class_name: M::CLASS_NAME,
            type_id: TypeId::of::<M>(),
            table_name,
            database: M::DATABASE.map(str::to_string),
            dialect,
            columns,
            by_name,
            by_inflected_name,
            primary_key,
            sequence,
            connection: RwLock::new(connection),
            dirty_tracking: M::DIRTY_TRACKING,
            callbacks,
            accessors,
        })
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// `database.table`, unquoted.
    pub fn qualified_name(&self) -> String {
        match &self.database {
            Some(db) => format!("{db}.{}", self.table_name),
            None => self.table_name.clone(),
        }
    }

    /// `database.table` quoted for the table's dialect.
    pub fn fully_qualified_name(&self) -> String {
        self.dialect.quote_identifier(&self.qualified_name())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column by raw backend name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).map(|&idx| &self.columns[idx])
    }

    /// Column by attribute name.
    pub fn column_by_inflected_name(&self, name: &str) -> Option<&Column> {
        self.by_inflected_name
            .get(name)
            .map(|&idx| &self.columns[idx])
    }

    /// Primary-key attribute names.
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Raw column name for an attribute, falling back to the attribute name itself.
    pub fn raw_column_name<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.column_by_inflected_name(attribute)
            .map_or(attribute, |c| c.name.as_str())
    }

    pub fn sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }

    pub fn dirty_tracking(&self) -> DirtyTracking {
        self.dirty_tracking
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn accessors(&self) -> &AccessorTable {
        &self.accessors
    }

    /// Current connection binding.
    pub fn connection(&self) -> ConnectionInfo {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap the connection binding without rebuilding column metadata.
    ///
    /// Columns, casters and quoting were derived for the table's dialect, so
    /// the new connection must speak the same one.
    pub fn reestablish_connection(&self, connection: ConnectionInfo) -> Result<()> {
        if connection.dialect != self.dialect {
            return Err(Error::configuration(format!(
                "{}: cannot rebind a {} table to {} connection '{}'",
                self.class_name,
                self.dialect.name(),
                connection.dialect.name(),
                connection.name
            )));
        }
        tracing::info!(
            model = self.class_name,
            connection = %connection.name,
            "Re-establishing table connection"
        );
        *self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner) = connection;
        Ok(())
    }

    /// Cast a backend row into an attribute map.
    ///
    /// Known columns are keyed by attribute name and cast from raw; other
    /// result columns (computed selects) are kept as-is under their own name.
    pub fn hydrate(&self, row: Row) -> Result<HashMap<String, Value>> {
        let mut attributes = HashMap::with_capacity(row.len());
        for (name, raw) in row {
            match self.column(&name) {
                Some(column) => {
                    let value = column.cast_from_raw(&raw)?;
                    attributes.insert(column.inflected_name.clone(), value);
                }
                None => {
                    attributes.insert(name, raw);
                }
            }
        }
        Ok(attributes)
    }

    /// Cast a value assigned to an attribute.
    pub fn cast_for_write(&self, attribute: &str, value: Value) -> Result<Value> {
        match self.column_by_inflected_name(attribute) {
            Some(column) => column.cast_for_write(value),
            None => Err(Error::UnknownAttribute {
                model: self.class_name.to_string(),
                name: attribute.to_string(),
            }),
        }
    }
}
