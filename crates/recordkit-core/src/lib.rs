//! Core types and traits for recordkit.
//!
//! `recordkit-core` is the **foundation layer** of the workspace. It defines the
//! data types every other crate exchanges and the contracts drivers implement.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: `Connection` and `SchemaIntrospector` are implemented by
//!   database drivers; recordkit only renders SQL and hands it over.
//! - **Data model**: `Value`, `Row`, `SemanticType` and `Dialect` describe query
//!   inputs/outputs and backend differences.
//! - **Casting**: `ColumnCaster` converts between raw driver values and canonical
//!   attribute values, in both directions.
//! - **Change tracking**: `DirtySet` records which attributes a persist must write.
//! - **Structured concurrency**: re-exports `Cx` and `Outcome` from asupersync so every
//!   async database operation is cancel-correct.
//!
//! # Who Uses This Crate
//!
//! - `recordkit-query` compiles conditions and statements over `Value` and `Dialect`.
//! - `recordkit-model` builds cached table metadata from `RawColumn` via `ColumnCaster`.
//! - `recordkit-session` drives a `Connection` for finders, persistence and transactions.
//!
//! Most applications should use the `recordkit` facade.

pub use asupersync::{Cx, Outcome};

pub mod caster;
pub mod connection;
pub mod dialect;
pub mod dirty;
pub mod error;
pub mod inflector;
pub mod row;
pub mod types;
pub mod value;

pub use caster::ColumnCaster;
pub use connection::{Connection, RawColumn, SchemaIntrospector};
pub use dialect::{Dialect, PaginationStyle};
pub use dirty::DirtySet;
pub use error::{
    BuilderError, CastError, ConfigurationError, DatabaseError, Error, NotFoundError, Result,
};
pub use inflector::{DefaultInflector, Inflector};
pub use row::Row;
pub use types::SemanticType;
pub use value::Value;
