//! Session configuration.

use serde::{Deserialize, Serialize};

/// What `transaction` does when called inside another transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestedTransactions {
    /// Fail with `Error::Transaction`.
    #[default]
    Reject,
    /// Run the inner unit of work inside the outer transaction.
    Flatten,
}

/// Configuration for Session behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name recorded on tables loaded through this session.
    pub connection_name: String,
    /// Log every statement (SQL and bind count) at debug level.
    pub log_sql: bool,
    pub nested_transactions: NestedTransactions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connection_name: "default".to_string(),
            log_sql: false,
            nested_transactions: NestedTransactions::Reject,
        }
    }
}

impl SessionConfig {
    pub fn connection_name(mut self, name: impl Into<String>) -> Self {
        self.connection_name = name.into();
        self
    }

    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    pub fn nested_transactions(mut self, mode: NestedTransactions) -> Self {
        self.nested_transactions = mode;
        self
    }
}
