//! The attribute-access table.
//!
//! Built once when a table is loaded: every column under its inflected name,
//! plus whatever the model registers. Lookups never probe the model at access
//! time; aliases are already resolved to their final target.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use recordkit_core::{Error, Result, Value};

use crate::record::Record;

pub type Getter = Arc<dyn Fn(&Record) -> Result<Value> + Send + Sync>;
pub type Setter = Arc<dyn Fn(&mut Record, Value) -> Result<()> + Send + Sync>;

/// How an attribute name is read and written.
#[derive(Clone)]
pub enum Accessor {
    /// Stored column attribute.
    Column(String),
    /// Model-supplied getter and/or setter.
    Custom {
        getter: Option<Getter>,
        setter: Option<Setter>,
    },
    /// Attribute of an associated record.
    Delegate {
        association: String,
        attribute: String,
    },
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Column(name) => f.debug_tuple("Column").field(name).finish(),
            Accessor::Custom { getter, setter } => f
                .debug_struct("Custom")
                .field("getter", &getter.is_some())
                .field("setter", &setter.is_some())
                .finish(),
            Accessor::Delegate {
                association,
                attribute,
            } => f
                .debug_struct("Delegate")
                .field("association", association)
                .field("attribute", attribute)
                .finish(),
        }
    }
}

enum Registration {
    Alias(String),
    Custom {
        getter: Option<Getter>,
        setter: Option<Setter>,
    },
    Delegate {
        association: String,
        attribute: String,
    },
}

/// What a model declares in [`Model::register_accessors`](crate::Model::register_accessors).
#[derive(Default)]
pub struct AccessorRegistrations {
    entries: Vec<(String, Registration)>,
}

impl AccessorRegistrations {
    /// Make `name` another name for `target`.
    pub fn alias(&mut self, name: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.entries
            .push((name.into(), Registration::Alias(target.into())));
        self
    }

    /// Custom getter and setter.
    pub fn custom<G, S>(&mut self, name: impl Into<String>, getter: G, setter: S) -> &mut Self
    where
        G: Fn(&Record) -> Result<Value> + Send + Sync + 'static,
        S: Fn(&mut Record, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.entries.push((
            name.into(),
            Registration::Custom {
                getter: Some(Arc::new(getter)),
                setter: Some(Arc::new(setter)),
            },
        ));
        self
    }

    /// Read-only computed attribute.
    pub fn getter<G>(&mut self, name: impl Into<String>, getter: G) -> &mut Self
    where
        G: Fn(&Record) -> Result<Value> + Send + Sync + 'static,
    {
        self.entries.push((
            name.into(),
            Registration::Custom {
                getter: Some(Arc::new(getter)),
                setter: None,
            },
        ));
        self
    }

    /// Forward `name` to `attribute` on the `association` record.
    pub fn delegate(
        &mut self,
        name: impl Into<String>,
        association: impl Into<String>,
        attribute: impl Into<String>,
    ) -> &mut Self {
        self.entries.push((
            name.into(),
            Registration::Delegate {
                association: association.into(),
                attribute: attribute.into(),
            },
        ));
        self
    }
}

/// Resolved name -> accessor map.
#[derive(Clone, Default)]
pub struct AccessorTable {
    entries: HashMap<String, Accessor>,
    aliases: HashMap<String, String>,
}

impl AccessorTable {
    /// Build from column attribute names and model registrations.
    ///
    /// Custom accessors and delegates may shadow a column. Aliases resolve
    /// through other aliases to a final target; a cycle or an unknown target
    /// is a configuration error.
    pub fn build<'a>(
        model: &str,
        columns: impl IntoIterator<Item = &'a str>,
        registrations: AccessorRegistrations,
    ) -> Result<Self> {
        let mut entries: HashMap<String, Accessor> = columns
            .into_iter()
            .map(|name| (name.to_string(), Accessor::Column(name.to_string())))
            .collect();
        let mut pending: HashMap<String, String> = HashMap::new();

        for (name, registration) in registrations.entries {
            match registration {
                Registration::Alias(target) => {
                    pending.insert(name, target);
                }
                Registration::Custom { getter, setter } => {
                    entries.insert(name, Accessor::Custom { getter, setter });
                }
                Registration::Delegate {
                    association,
                    attribute,
                } => {
                    entries.insert(
                        name,
                        Accessor::Delegate {
                            association,
                            attribute,
                        },
                    );
                }
            }
        }

        let mut aliases = HashMap::new();
        for alias in pending.keys() {
            let mut seen = HashSet::from([alias.as_str()]);
            let mut target = &pending[alias];
            while let Some(next) = pending.get(target) {
                if !seen.insert(target.as_str()) {
                    return Err(Error::configuration(format!(
                        "{model}: alias '{alias}' is part of a cycle"
                    )));
                }
                target = next;
            }
            let Some(accessor) = entries.get(target).cloned() else {
                return Err(Error::configuration(format!(
                    "{model}: alias '{alias}' points at unknown attribute '{target}'"
                )));
            };
            aliases.insert(alias.clone(), target.clone());
            entries.insert(alias.clone(), accessor);
        }

        Ok(Self { entries, aliases })
    }

    pub fn get(&self, name: &str) -> Option<&Accessor> {
        self.entries.get(name)
    }

    /// Final target of an alias.
    pub fn alias_target(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AccessorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorTable")
            .field("entries", &self.entries)
            .field("aliases", &self.aliases)
            .finish()
    }
}
