//! Collaborator contracts: statement execution and schema introspection.
//!
//! recordkit never talks to a database itself. Drivers implement `Connection`
//! to execute rendered SQL with positional binds, and `SchemaIntrospector` to
//! describe a table's columns. All async operations take a `Cx` and return an
//! `Outcome` so cancellation and panics propagate as values.

use std::future::Future;

use asupersync::{Cx, Outcome};
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::Error;
use crate::row::Row;
use crate::value::Value;

/// Executes statements against one backend.
///
/// Every placeholder in `sql` is the single positional marker `?`; `params`
/// holds exactly one value per placeholder, in order.
pub trait Connection: Send + Sync {
    /// The backend's SQL dialect (quoting, pagination, temporal formats).
    fn dialect(&self) -> Dialect;

    /// Identifier quote character. Defaults to the dialect's.
    fn quote_char(&self) -> char {
        self.dialect().quote_char()
    }

    /// Run a statement that returns rows.
    fn query(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;

    /// Key generated by the most recent INSERT, optionally read from a sequence.
    fn last_insert_id(
        &self,
        cx: &Cx,
        sequence: Option<&str>,
    ) -> impl Future<Output = Outcome<Value, Error>> + Send;

    fn begin(&self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;

    fn commit(&self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;

    fn rollback(&self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;
}

/// A column as reported by the backend, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawColumn {
    pub name: String,
    /// Backend-native type spelling, e.g. `NUMBER(10,0)` or `varchar(255)`
    pub raw_type: String,
    pub length: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
    pub primary_key: bool,
    /// Default expression as the backend reports it
    pub raw_default: Option<String>,
    /// Backend flags the column as auto-generated (identity, AUTO_INCREMENT)
    pub auto_increment: bool,
}

impl RawColumn {
    /// A nullable, non-key column with the given name and type spelling.
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            nullable: true,
            ..Self::default()
        }
    }

    /// Mark as primary key (and not nullable).
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_expr(mut self, raw_default: impl Into<String>) -> Self {
        self.raw_default = Some(raw_default.into());
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Describes tables in backend-native shape.
pub trait SchemaIntrospector: Send + Sync {
    /// List the columns of `table`, in declaration order.
    ///
    /// A missing table is an error (`Error::Database`), never an empty list.
    fn describe_columns(
        &self,
        cx: &Cx,
        table: &str,
    ) -> impl Future<Output = Outcome<Vec<RawColumn>, Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_column_builders() {
        let col = RawColumn::new("id", "int4").primary_key().auto_increment();
        assert!(col.primary_key);
        assert!(!col.nullable);
        assert!(col.auto_increment);

        let price = RawColumn::new("price", "numeric").length(10).scale(2);
        assert_eq!(price.scale, Some(2));
        assert!(price.nullable);
    }
}
