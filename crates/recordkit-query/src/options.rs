//! The options structure accepted by finders and bulk operations.

use recordkit_core::{Error, Result, Value};

use crate::condition::Condition;

/// Every key an options structure may carry.
pub const OPTION_KEYS: [&str; 12] = [
    "conditions",
    "limit",
    "offset",
    "order",
    "select",
    "joins",
    "include",
    "readonly",
    "group",
    "from",
    "having",
    "set",
];

/// Assignment list for bulk updates.
#[derive(Debug, Clone, PartialEq)]
pub enum SetClause {
    /// Column/value pairs, each bound as a parameter
    Values(Vec<(String, Value)>),
    /// Literal assignment SQL such as `hits = hits + 1`
    Raw(String),
}

/// Loosely-typed option value, as supplied by dynamic callers.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
    Condition(Condition),
    Set(SetClause),
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Text(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Text(v)
    }
}

impl From<Condition> for OptionValue {
    fn from(v: Condition) -> Self {
        OptionValue::Condition(v)
    }
}

impl From<SetClause> for OptionValue {
    fn from(v: SetClause) -> Self {
        OptionValue::Set(v)
    }
}

/// Query-shaping options for finders, `update_all` and `delete_all`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindOptions {
    pub conditions: Option<Condition>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub order: Option<String>,
    pub select: Option<String>,
    pub joins: Vec<String>,
    /// Associations to eager-load; carried for the relationship layer
    pub include: Vec<String>,
    /// Hydrated records refuse to be persisted
    pub readonly: bool,
    pub group: Option<String>,
    pub from: Option<String>,
    pub having: Option<String>,
    pub set: Option<SetClause>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conditions(mut self, conditions: impl Into<Condition>) -> Self {
        self.conditions = Some(conditions.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn join(mut self, join: impl Into<String>) -> Self {
        self.joins.push(join.into());
        self
    }

    pub fn include(mut self, association: impl Into<String>) -> Self {
        self.include.push(association.into());
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn having(mut self, having: impl Into<String>) -> Self {
        self.having = Some(having.into());
        self
    }

    /// Bulk-update assignments bound as parameters.
    pub fn set_values<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set = Some(SetClause::Values(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    /// Bulk-update assignments given as literal SQL.
    pub fn set_raw(mut self, sql: impl Into<String>) -> Self {
        self.set = Some(SetClause::Raw(sql.into()));
        self
    }

    /// Build options from key/value pairs.
    ///
    /// Keys outside [`OPTION_KEYS`] are a builder error, reported before any
    /// value is inspected. A value of the wrong shape for a known key is a
    /// configuration error.
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, OptionValue)>,
        K: Into<String>,
    {
        let pairs: Vec<(String, OptionValue)> =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let unknown: Vec<&str> = pairs
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| !OPTION_KEYS.contains(k))
            .collect();
        if !unknown.is_empty() {
            return Err(Error::builder(format!(
                "unknown key(s): {}",
                unknown.join(", ")
            )));
        }

        let mut options = FindOptions::default();
        for (key, value) in pairs {
            match (key.as_str(), value) {
                ("conditions", OptionValue::Condition(c)) => options.conditions = Some(c),
                ("conditions", OptionValue::Text(sql)) => {
                    options.conditions = Some(Condition::Raw(sql));
                }
                ("limit", v) => options.limit = Some(non_negative("limit", v)?),
                ("offset", v) => options.offset = Some(non_negative("offset", v)?),
                ("order", OptionValue::Text(s)) => options.order = Some(s),
                ("select", OptionValue::Text(s)) => options.select = Some(s),
                ("select", OptionValue::List(cols)) => options.select = Some(cols.join(", ")),
                ("group", OptionValue::Text(s)) => options.group = Some(s),
                ("from", OptionValue::Text(s)) => options.from = Some(s),
                ("having", OptionValue::Text(s)) => options.having = Some(s),
                ("joins", OptionValue::Text(s)) => options.joins.push(s),
                ("joins", OptionValue::List(list)) => options.joins.extend(list),
                ("include", OptionValue::Text(s)) => options.include.push(s),
                ("include", OptionValue::List(list)) => options.include.extend(list),
                ("readonly", OptionValue::Bool(b)) => options.readonly = b,
                ("set", OptionValue::Set(set)) => options.set = Some(set),
                ("set", OptionValue::Text(sql)) => options.set = Some(SetClause::Raw(sql)),
                (key, other) => {
                    return Err(Error::configuration(format!(
                        "option '{key}' does not accept {other:?}"
                    )));
                }
            }
        }
        Ok(options)
    }
}

fn non_negative(key: &str, value: OptionValue) -> Result<u64> {
    match value {
        OptionValue::Int(n) => u64::try_from(n)
            .map_err(|_| Error::configuration(format!("option '{key}' must not be negative"))),
        OptionValue::Text(ref s) => s.trim().parse::<u64>().map_err(|_| {
            Error::configuration(format!("option '{key}' expects a count, got '{s}'"))
        }),
        other => Err(Error::configuration(format!(
            "option '{key}' expects a count, got {other:?}"
        ))),
    }
}
