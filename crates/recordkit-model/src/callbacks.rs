//! Lifecycle hook invocation.
//!
//! Hooks are registered once per model at schema-load time through
//! [`Model::register_callbacks`](crate::Model::register_callbacks). Named
//! functions and inline closures share one callable type, [`Callback`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::record::Record;

/// Points in a persistence operation where hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackEvent {
    BeforeSave,
    AfterSave,
    BeforeCreate,
    AfterCreate,
    BeforeUpdate,
    AfterUpdate,
    BeforeDestroy,
    AfterDestroy,
}

impl CallbackEvent {
    pub const ALL: [CallbackEvent; 8] = [
        CallbackEvent::BeforeSave,
        CallbackEvent::AfterSave,
        CallbackEvent::BeforeCreate,
        CallbackEvent::AfterCreate,
        CallbackEvent::BeforeUpdate,
        CallbackEvent::AfterUpdate,
        CallbackEvent::BeforeDestroy,
        CallbackEvent::AfterDestroy,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            CallbackEvent::BeforeSave => "before_save",
            CallbackEvent::AfterSave => "after_save",
            CallbackEvent::BeforeCreate => "before_create",
            CallbackEvent::AfterCreate => "after_create",
            CallbackEvent::BeforeUpdate => "before_update",
            CallbackEvent::AfterUpdate => "after_update",
            CallbackEvent::BeforeDestroy => "before_destroy",
            CallbackEvent::AfterDestroy => "after_destroy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Before-hooks may abort the operation.
    pub const fn is_before(self) -> bool {
        matches!(
            self,
            CallbackEvent::BeforeSave
                | CallbackEvent::BeforeCreate
                | CallbackEvent::BeforeUpdate
                | CallbackEvent::BeforeDestroy
        )
    }
}

/// Persistence operation whose hooks to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Destroy,
}

impl Operation {
    /// Before-events in invocation order. The generic save hooks run first.
    pub const fn before_events(self) -> &'static [CallbackEvent] {
        match self {
            Operation::Create => &[CallbackEvent::BeforeSave, CallbackEvent::BeforeCreate],
            Operation::Update => &[CallbackEvent::BeforeSave, CallbackEvent::BeforeUpdate],
            Operation::Destroy => &[CallbackEvent::BeforeDestroy],
        }
    }

    /// After-events in invocation order. The generic save hooks run last.
    pub const fn after_events(self) -> &'static [CallbackEvent] {
        match self {
            Operation::Create => &[CallbackEvent::AfterCreate, CallbackEvent::AfterSave],
            Operation::Update => &[CallbackEvent::AfterUpdate, CallbackEvent::AfterSave],
            Operation::Destroy => &[CallbackEvent::AfterDestroy],
        }
    }
}

/// What a hook tells the operation to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookSignal {
    #[default]
    Continue,
    /// Stop the operation; it reports failure instead of raising.
    Abort,
}

impl From<bool> for HookSignal {
    fn from(proceed: bool) -> Self {
        if proceed {
            HookSignal::Continue
        } else {
            HookSignal::Abort
        }
    }
}

impl From<()> for HookSignal {
    fn from((): ()) -> Self {
        HookSignal::Continue
    }
}

type HookFn = dyn Fn(&mut Record) -> HookSignal + Send + Sync;

/// A registered hook: a named function or an anonymous closure.
#[derive(Clone)]
pub struct Callback {
    name: Option<String>,
    func: Arc<HookFn>,
}

impl Callback {
    /// Wrap a named function.
    pub fn named<F, R>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Record) -> R + Send + Sync + 'static,
        R: Into<HookSignal>,
    {
        Self {
            name: Some(name.into()),
            func: Arc::new(move |record| func(record).into()),
        }
    }

    /// Wrap an inline closure.
    pub fn closure<F, R>(func: F) -> Self
    where
        F: Fn(&mut Record) -> R + Send + Sync + 'static,
        R: Into<HookSignal>,
    {
        Self {
            name: None,
            func: Arc::new(move |record| func(record).into()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn call(&self, record: &mut Record) -> HookSignal {
        (self.func)(record)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("name", &self.name.as_deref().unwrap_or("<closure>"))
            .finish()
    }
}

/// Ordered hook lists per event.
#[derive(Debug, Clone, Default)]
pub struct CallbackRegistry {
    hooks: HashMap<CallbackEvent, Vec<Callback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to an event's list.
    pub fn register(&mut self, event: CallbackEvent, callback: Callback) -> &mut Self {
        self.hooks.entry(event).or_default().push(callback);
        self
    }

    /// Append an inline closure.
    pub fn on<F, R>(&mut self, event: CallbackEvent, func: F) -> &mut Self
    where
        F: Fn(&mut Record) -> R + Send + Sync + 'static,
        R: Into<HookSignal>,
    {
        self.register(event, Callback::closure(func))
    }

    pub fn hooks(&self, event: CallbackEvent) -> &[Callback] {
        self.hooks.get(&event).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(Vec::is_empty)
    }

    /// Run one event's hooks in order.
    ///
    /// Before-events stop at the first `Abort` and return it. After-event
    /// results are ignored.
    pub fn invoke(&self, event: CallbackEvent, record: &mut Record) -> HookSignal {
        for callback in self.hooks(event) {
            let signal = callback.call(record);
            if event.is_before() && signal == HookSignal::Abort {
                tracing::debug!(
                    event = event.name(),
                    callback = callback.name().unwrap_or("<closure>"),
                    "Hook aborted operation"
                );
                return HookSignal::Abort;
            }
        }
        HookSignal::Continue
    }

    /// Run every before-hook for an operation, generic save hooks included.
    pub fn run_before(&self, operation: Operation, record: &mut Record) -> HookSignal {
        for event in operation.before_events() {
            if self.invoke(*event, record) == HookSignal::Abort {
                return HookSignal::Abort;
            }
        }
        HookSignal::Continue
    }

    /// Run every after-hook for an operation, generic save hooks included.
    pub fn run_after(&self, operation: Operation, record: &mut Record) {
        for event in operation.after_events() {
            self.invoke(*event, record);
        }
    }
}
