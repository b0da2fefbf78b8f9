//! recordkit: an active-record style ORM core.
//!
//! Models declare a name and optional metadata; everything else (columns,
//! types, defaults, primary key) is discovered from the database the first time
//! the model is used and cached for the life of the process.
//!
//! # Example
//!
//! ```rust,ignore
//! use recordkit::prelude::*;
//!
//! struct Order;
//!
//! impl Model for Order {
//!     const CLASS_NAME: &'static str = "Order";
//! }
//!
//! let session = Session::new(connection);
//! let open = session
//!     .find::<Order>(cx, FindOptions::new().conditions(Condition::equality([("status", "open")])))
//!     .await;
//! ```
//!
//! # Crates
//!
//! - `recordkit-core`: values, casting, dialects, dirty sets and the driver contract
//! - `recordkit-query`: conditions, find options, pagination and the SQL builder
//! - `recordkit-model`: the model trait, table metadata, schema cache, hooks and records
//! - `recordkit-session`: finders, persistence and transactions

pub use recordkit_core::{
    BuilderError, CastError, ColumnCaster, ConfigurationError, Connection, Cx, DatabaseError,
    DefaultInflector, Dialect, DirtySet, Error, Inflector, NotFoundError, Outcome,
    PaginationStyle, RawColumn, Result, Row, SchemaIntrospector, SemanticType, Value,
};
pub use recordkit_model::{
    Accessor, AccessorRegistrations, AccessorTable, Callback, CallbackEvent, CallbackRegistry,
    Column, ConnectionInfo, DirtyTracking, HookSignal, Model, Operation, Record, Table,
    TableSchemaCache, schema_cache,
};
pub use recordkit_query::{
    CompiledCondition, Condition, ConditionArg, FindOptions, Joiner, LimitOffset, OPTION_KEYS,
    OptionValue, Paginator, ROW_NUMBER_COLUMN, RowNumberWrap, SetClause, SqlBuilder,
    StatementKind, count_placeholders, default_paginator,
};
pub use recordkit_session::{NestedTransactions, Session, SessionConfig};

/// Everything an application typically needs.
pub mod prelude {
    pub use crate::{
        AccessorRegistrations, CallbackEvent, CallbackRegistry, Condition, Connection, Cx,
        Dialect, DirtyTracking, Error, FindOptions, HookSignal, Model, NestedTransactions,
        Outcome, RawColumn, Record, Row, SchemaIntrospector, Session, SessionConfig, Value,
    };
}
