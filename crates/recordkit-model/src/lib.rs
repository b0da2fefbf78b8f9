//! Model declarations, cached table metadata and records for recordkit.
//!
//! # Role In The Architecture
//!
//! - **Declaration**: [`Model`] names a model class and whatever metadata the
//!   backend cannot supply (table name override, primary key, sequence).
//! - **Schema cache**: [`TableSchemaCache`] loads each model's [`Table`] once per
//!   process from the [`SchemaIntrospector`](recordkit_core::SchemaIntrospector)
//!   and hands out shared, immutable instances.
//! - **Access table**: [`AccessorTable`] maps attribute names to columns, custom
//!   accessors and delegates, resolved once at load.
//! - **Hooks**: [`CallbackRegistry`] holds ordered lifecycle hooks per event.
//! - **Records**: [`Record`] holds typed attributes and the dirty set that
//!   persistence turns into minimal statements.

pub mod accessor;
pub mod cache;
pub mod callbacks;
pub mod column;
pub mod model;
pub mod record;
pub mod table;

pub use accessor::{Accessor, AccessorRegistrations, AccessorTable};
pub use cache::{TableSchemaCache, schema_cache};
pub use callbacks::{Callback, CallbackEvent, CallbackRegistry, HookSignal, Operation};
pub use column::Column;
pub use model::{DirtyTracking, Model};
pub use record::Record;
pub use table::{ConnectionInfo, Table};
