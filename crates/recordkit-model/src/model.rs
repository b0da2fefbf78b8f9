//! The `Model` declaration trait.

use crate::accessor::AccessorRegistrations;
use crate::callbacks::CallbackRegistry;

/// When an assignment flags an attribute as dirty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirtyTracking {
    /// Every assignment flags, whether or not the value changed.
    #[default]
    OnAssignment,
    /// Only assignments that change the held value flag.
    OnChange,
}

/// Static declaration of a model class.
///
/// A model type carries no data itself; records of the model are [`Record`]s
/// bound to the model's cached [`Table`]. Everything not declared here is
/// introspected from the backend on first use.
///
/// [`Record`]: crate::record::Record
/// [`Table`]: crate::table::Table
///
/// # Example
///
/// ```
/// use recordkit_model::{CallbackEvent, CallbackRegistry, HookSignal, Model};
///
/// struct Order;
///
/// impl Model for Order {
///     const CLASS_NAME: &'static str = "Order";
///
///     fn register_callbacks(registry: &mut CallbackRegistry) {
///         registry.on(CallbackEvent::BeforeCreate, |_record| HookSignal::Continue);
///     }
/// }
/// ```
pub trait Model: Send + Sync + 'static {
    /// Name used in messages and for table-name inference.
    const CLASS_NAME: &'static str;

    /// Physical table name. Inferred from `CLASS_NAME` when absent.
    const TABLE_NAME: Option<&'static str> = None;

    /// Database (schema) the table lives in, if not the connection default.
    const DATABASE: Option<&'static str> = None;

    /// Primary-key attribute names. Introspected, then `["id"]`, when empty.
    const PRIMARY_KEY: &'static [&'static str] = &[];

    /// Sequence supplying generated keys.
    const SEQUENCE: Option<&'static str> = None;

    const DIRTY_TRACKING: DirtyTracking = DirtyTracking::OnAssignment;

    /// Register lifecycle hooks. Called once when the table is loaded.
    fn register_callbacks(_registry: &mut CallbackRegistry) {}

    /// Register aliases, custom accessors and delegates. Called once when the table is loaded.
    fn register_accessors(_accessors: &mut AccessorRegistrations) {}
}
