//! Error types for recordkit.
//!
//! Compile-time failures (`Configuration`, `Builder`, `Cast`, `UnknownAttribute`)
//! are raised before any statement reaches the backend. `Database` errors come from
//! the connection or introspection collaborators and are propagated unmodified.

use std::fmt;

use crate::value::Value;

/// Result alias used throughout recordkit.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type for all recordkit operations.
#[derive(Debug)]
pub enum Error {
    /// Invalid declaration or option value.
    Configuration(ConfigurationError),
    /// Malformed or ambiguous query input.
    Builder(BuilderError),
    /// Primary-key lookup returned a different row count than requested.
    NotFound(NotFoundError),
    /// Failure reported by the backend.
    Database(DatabaseError),
    /// A value could not be cast to the column's semantic type.
    Cast(CastError),
    /// Attribute name unknown to the model's access table.
    UnknownAttribute {
        /// Model class name
        model: String,
        /// Requested attribute name
        name: String,
    },
    /// Attempt to persist a record loaded as read-only.
    ReadOnly {
        /// Model class name
        model: String,
        /// Operation that was refused
        operation: &'static str,
    },
    /// Transaction misuse (e.g. nesting when nesting is rejected).
    Transaction(String),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(ConfigurationError {
            message: message.into(),
        })
    }

    /// Shorthand for a builder error.
    pub fn builder(message: impl Into<String>) -> Self {
        Error::Builder(BuilderError {
            message: message.into(),
        })
    }

    /// Shorthand for a database error without an underlying source.
    pub fn database(message: impl Into<String>) -> Self {
        Error::Database(DatabaseError {
            message: message.into(),
            sql: None,
            source: None,
        })
    }

    /// True for errors raised before any SQL was sent.
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_)
                | Error::Builder(_)
                | Error::Cast(_)
                | Error::UnknownAttribute { .. }
        )
    }
}

/// Invalid declaration or option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    pub message: String,
}

/// Malformed or ambiguous condition/statement input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderError {
    pub message: String,
}

/// A primary-key lookup that did not return exactly one row per key.
#[derive(Debug, Clone, PartialEq)]
pub struct NotFoundError {
    /// Model class name
    pub model: String,
    /// The keys that were requested
    pub keys: Vec<Value>,
    /// Number of rows expected (one per key)
    pub expected: usize,
    /// Number of rows the backend returned
    pub found: usize,
}

/// Error reported by the backend.
#[derive(Debug)]
pub struct DatabaseError {
    pub message: String,
    /// Statement that failed, when known
    pub sql: Option<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DatabaseError {
    /// Attach the failing statement.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

/// A value that could not be cast.
#[derive(Debug, Clone, PartialEq)]
pub struct CastError {
    /// Semantic type name the cast targeted
    pub target: &'static str,
    /// Debug rendering of the offending input
    pub input: String,
    pub message: String,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(e) => write!(f, "Configuration error: {}", e.message),
            Error::Builder(e) => write!(f, "Builder error: {}", e.message),
            Error::NotFound(e) => write!(f, "{e}"),
            Error::Database(e) => write!(f, "{e}"),
            Error::Cast(e) => write!(f, "{e}"),
            Error::UnknownAttribute { model, name } => {
                write!(f, "Undefined attribute '{name}' on {model}")
            }
            Error::ReadOnly { model, operation } => {
                write!(f, "{model} was loaded read-only; cannot {operation}")
            }
            Error::Transaction(msg) => write!(f, "Transaction error: {msg}"),
        }
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.keys.iter().map(Value::to_sql_literal).collect();
        if self.expected == 1 {
            write!(
                f,
                "Couldn't find {} with ID={} (found {}, but was looking for 1)",
                self.model,
                keys.join(","),
                self.found
            )
        } else {
            write!(
                f,
                "Couldn't find all {} with IDs ({}) (found {}, but was looking for {})",
                self.model,
                keys.join(","),
                self.found,
                self.expected
            )
        }
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Database error: {}", self.message)?;
        if let Some(sql) = &self.sql {
            write!(f, " [{sql}]")?;
        }
        Ok(())
    }
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot cast {} to {}: {}",
            self.input, self.target, self.message
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(e) => e
                .source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<ConfigurationError> for Error {
    fn from(e: ConfigurationError) -> Self {
        Error::Configuration(e)
    }
}

impl From<BuilderError> for Error {
    fn from(e: BuilderError) -> Self {
        Error::Builder(e)
    }
}

impl From<CastError> for Error {
    fn from(e: CastError) -> Self {
        Error::Cast(e)
    }
}

impl From<DatabaseError> for Error {
    fn from(e: DatabaseError) -> Self {
        Error::Database(e)
    }
}
