//! Condition shapes and their compilation to positional SQL.
//!
//! Every condition compiles to a `CompiledCondition`: a SQL fragment whose
//! `?` placeholders correspond one-to-one, in order, with its bind values.
//! Callers must hand both to the connection unchanged.

use std::sync::OnceLock;

use recordkit_core::{Dialect, Error, Result, Value};
use regex::Regex;

/// Boolean connective of a derived condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
}

impl Joiner {
    pub const fn keyword(self) -> &'static str {
        match self {
            Joiner::And => "AND",
            Joiner::Or => "OR",
        }
    }
}

/// A condition in one of the supported input shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Literal boolean SQL, no bind values.
    Raw(String),
    /// SQL with `?` placeholders and one value per placeholder.
    Positional { sql: String, values: Vec<Value> },
    /// Column/value pairs, AND-joined in the given order.
    Equality(Vec<(String, Value)>),
    /// Field names with matching values under one connective.
    Derived {
        fields: Vec<String>,
        values: Vec<Value>,
        joiner: Joiner,
    },
}

/// One element of the loose argument form accepted by finders.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionArg {
    Sql(String),
    Value(Value),
    Map(Vec<(String, Value)>),
}

/// Output of condition compilation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledCondition {
    pub sql: String,
    pub values: Vec<Value>,
}

impl CompiledCondition {
    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// True when there is no predicate to render.
    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    /// Parenthesize every non-empty part and join them with AND.
    ///
    /// Bind values are concatenated in part order.
    pub fn merge(parts: impl IntoIterator<Item = CompiledCondition>) -> CompiledCondition {
        let mut fragments = Vec::new();
        let mut values = Vec::new();
        for part in parts {
            if part.is_empty() {
                continue;
            }
            fragments.push(format!("({})", part.sql.trim()));
            values.extend(part.values);
        }
        CompiledCondition {
            sql: fragments.join(" AND "),
            values,
        }
    }
}

impl Condition {
    pub fn raw(sql: impl Into<String>) -> Self {
        Condition::Raw(sql.into())
    }

    pub fn positional(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Condition::Positional {
            sql: sql.into(),
            values,
        }
    }

    /// Equality map from any ordered sequence of pairs.
    pub fn equality<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Condition::Equality(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn derived(fields: Vec<String>, values: Vec<Value>, joiner: Joiner) -> Self {
        Condition::Derived {
            fields,
            values,
            joiner,
        }
    }

    /// Parse a dynamic finder name (`name_and_age`, `find_by_email_or_login`).
    pub fn from_finder(name: &str, values: Vec<Value>) -> Result<Self> {
        let attrs = name
            .strip_prefix("find_all_by_")
            .or_else(|| name.strip_prefix("find_by_"))
            .unwrap_or(name);

        let has_and = attrs.contains("_and_");
        let has_or = attrs.contains("_or_");
        if has_and && has_or {
            return Err(Error::builder(format!(
                "finder '{name}' mixes _and_ and _or_; use explicit conditions"
            )));
        }
        let (separator, joiner) = if has_or {
            ("_or_", Joiner::Or)
        } else {
            ("_and_", Joiner::And)
        };

        let fields: Vec<String> = attrs.split(separator).map(str::to_string).collect();
        if fields.iter().any(String::is_empty) {
            return Err(Error::builder(format!("malformed finder name '{name}'")));
        }
        Ok(Condition::derived(fields, values, joiner))
    }

    /// Interpret the loose argument form: one map, or a SQL string followed by its values.
    pub fn from_args(args: Vec<ConditionArg>) -> Result<Self> {
        let mut iter = args.into_iter();
        let Some(first) = iter.next() else {
            return Err(Error::builder("no condition arguments given"));
        };

        match first {
            ConditionArg::Map(pairs) => {
                if iter.next().is_some() {
                    return Err(Error::builder(
                        "a condition map cannot be combined with positional arguments",
                    ));
                }
                Ok(Condition::Equality(pairs))
            }
            ConditionArg::Sql(sql) => {
                let mut values = Vec::new();
                for arg in iter {
                    match arg {
                        ConditionArg::Value(v) => values.push(v),
                        ConditionArg::Map(_) => {
                            return Err(Error::builder(
                                "a condition map cannot be combined with positional arguments",
                            ));
                        }
                        ConditionArg::Sql(_) => {
                            return Err(Error::builder(
                                "only one SQL fragment may be given per condition",
                            ));
                        }
                    }
                }
                if values.is_empty() {
                    Ok(Condition::Raw(sql))
                } else {
                    Ok(Condition::Positional { sql, values })
                }
            }
            ConditionArg::Value(_) => Err(Error::builder(
                "bind values must follow a SQL fragment",
            )),
        }
    }

    /// Compile to SQL plus ordered bind values.
    pub fn compile(&self, dialect: Dialect) -> Result<CompiledCondition> {
        let compiled = match self {
            Condition::Raw(sql) => {
                let placeholders = count_placeholders(sql);
                if placeholders > 0 {
                    return Err(Error::builder(format!(
                        "raw condition contains {placeholders} placeholder(s) but no values"
                    )));
                }
                CompiledCondition::new(sql.clone(), Vec::new())
            }
            Condition::Positional { sql, values } => compile_positional(sql, values)?,
            Condition::Equality(pairs) => {
                let pairs: Vec<(&str, &Value)> =
                    pairs.iter().map(|(k, v)| (k.as_str(), v)).collect();
                compile_pairs(dialect, &pairs, Joiner::And)?
            }
            Condition::Derived {
                fields,
                values,
                joiner,
            } => {
                if fields.is_empty() {
                    return Err(Error::builder("derived condition has no fields"));
                }
                if fields.len() != values.len() {
                    return Err(Error::builder(format!(
                        "derived condition has {} field(s) but {} value(s)",
                        fields.len(),
                        values.len()
                    )));
                }
                let pairs: Vec<(&str, &Value)> = fields
                    .iter()
                    .map(String::as_str)
                    .zip(values.iter())
                    .collect();
                compile_pairs(dialect, &pairs, *joiner)?
            }
        };
        debug_assert_eq!(compiled.placeholder_count(), compiled.values.len());
        Ok(compiled)
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Condition::Raw(sql.to_string())
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Condition::Raw(sql)
    }
}

fn in_list_context() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bIN\s*\(\s*$").expect("IN pattern is valid"))
}

/// Byte offsets of every `?` outside a quoted literal or quoted identifier.
fn placeholder_offsets(sql: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut quote: Option<char> = None;
    for (idx, c) in sql.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '?' => offsets.push(idx),
                _ => {}
            },
        }
    }
    offsets
}

/// Count `?` placeholders outside quoted text.
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_offsets(sql).len()
}

fn compile_positional(sql: &str, values: &[Value]) -> Result<CompiledCondition> {
    let offsets = placeholder_offsets(sql);
    if offsets.len() != values.len() {
        return Err(Error::builder(format!(
            "wrong number of bind values ({} for {} placeholder(s)) in: {sql}",
            values.len(),
            offsets.len()
        )));
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut binds = Vec::with_capacity(values.len());
    let mut cursor = 0;

    for (offset, value) in offsets.into_iter().zip(values) {
        out.push_str(&sql[cursor..offset]);
        cursor = offset + 1;
        match value {
            Value::Array(items) if in_list_context().is_match(&out) => {
                if items.iter().any(|v| matches!(v, Value::Array(_))) {
                    return Err(Error::builder("nested sequences cannot be bound"));
                }
                if items.is_empty() {
                    out.push_str("NULL");
                } else {
                    out.push_str(&vec!["?"; items.len()].join(", "));
                    binds.extend(items.iter().cloned());
                }
            }
            other => {
                out.push('?');
                binds.push(other.clone());
            }
        }
    }
    out.push_str(&sql[cursor..]);

    Ok(CompiledCondition::new(out, binds))
}

fn compile_pairs(
    dialect: Dialect,
    pairs: &[(&str, &Value)],
    joiner: Joiner,
) -> Result<CompiledCondition> {
    let mut fragments = Vec::with_capacity(pairs.len());
    let mut binds = Vec::with_capacity(pairs.len());

    for (column, value) in pairs {
        let quoted = dialect.quote_identifier(column);
        match value {
            Value::Null => fragments.push(format!("{quoted} IS NULL")),
            Value::Array(items) => {
                if items.iter().any(|v| matches!(v, Value::Array(_))) {
                    return Err(Error::builder(format!(
                        "nested sequence given for column '{column}'"
                    )));
                }
                if items.is_empty() {
                    fragments.push("1 = 0".to_string());
                } else {
                    let marks = vec!["?"; items.len()].join(", ");
                    fragments.push(format!("{quoted} IN ({marks})"));
                    binds.extend(items.iter().cloned());
                }
            }
            other => {
                fragments.push(format!("{quoted} = ?"));
                binds.push((*other).clone());
            }
        }
    }

    let separator = format!(" {} ", joiner.keyword());
    Ok(CompiledCondition::new(fragments.join(&separator), binds))
}
