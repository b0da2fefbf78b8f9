//! SQL dialects: quoting, temporal formats, pagination and statement capabilities.

use serde::{Deserialize, Serialize};

/// A backend's SQL syntax variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL
    #[default]
    Postgres,
    /// MySQL / MariaDB
    Mysql,
    /// SQLite
    Sqlite,
    /// Oracle
    Oracle,
}

/// Which pagination strategy a dialect uses by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStyle {
    /// Trailing `LIMIT n OFFSET m`
    LimitOffset,
    /// Wrap the base query and filter on a row-number pseudo-column
    RowNumber,
}

impl Dialect {
    /// Lowercase dialect name.
    pub const fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Oracle => "oracle",
        }
    }

    /// Parse a dialect name (case-insensitive, common aliases accepted).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" | "pg" => Some(Dialect::Postgres),
            "mysql" | "mariadb" => Some(Dialect::Mysql),
            "sqlite" | "sqlite3" => Some(Dialect::Sqlite),
            "oracle" | "oci" => Some(Dialect::Oracle),
            _ => None,
        }
    }

    /// Identifier quote character.
    pub const fn quote_char(self) -> char {
        match self {
            Dialect::Mysql => '`',
            Dialect::Postgres | Dialect::Sqlite | Dialect::Oracle => '"',
        }
    }

    /// Quote an identifier, doubling any embedded quote characters.
    ///
    /// Dotted names (`schema.table`) are quoted per segment.
    pub fn quote_identifier(self, name: &str) -> String {
        let q = self.quote_char();
        name.split('.')
            .map(|part| {
                let escaped = part.replace(q, &format!("{q}{q}"));
                format!("{q}{escaped}{q}")
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// `chrono` format used to parse and render datetime values.
    pub const fn datetime_format(self) -> &'static str {
        match self {
            Dialect::Oracle => "%d-%b-%Y %H:%M:%S%.f",
            Dialect::Postgres | Dialect::Mysql | Dialect::Sqlite => "%Y-%m-%d %H:%M:%S%.f",
        }
    }

    /// `chrono` format used for date values.
    pub const fn date_format(self) -> &'static str {
        match self {
            Dialect::Oracle => "%d-%b-%Y",
            Dialect::Postgres | Dialect::Mysql | Dialect::Sqlite => "%Y-%m-%d",
        }
    }

    /// `chrono` format used for time values.
    pub const fn time_format(self) -> &'static str {
        "%H:%M:%S%.f"
    }

    /// Default pagination strategy.
    pub const fn pagination_style(self) -> PaginationStyle {
        match self {
            Dialect::Oracle => PaginationStyle::RowNumber,
            Dialect::Postgres | Dialect::Mysql | Dialect::Sqlite => PaginationStyle::LimitOffset,
        }
    }

    /// Spelling of "no limit" for offset-only queries, where the dialect needs one.
    pub const fn unbounded_limit(self) -> Option<&'static str> {
        match self {
            Dialect::Mysql => Some("18446744073709551615"),
            Dialect::Sqlite => Some("-1"),
            Dialect::Postgres | Dialect::Oracle => None,
        }
    }

    /// Whether UPDATE/DELETE accept trailing `ORDER BY` and `LIMIT`.
    pub const fn supports_mutation_limit(self) -> bool {
        matches!(self, Dialect::Mysql)
    }

    /// INSERT tail used when no columns are supplied.
    pub const fn empty_insert_clause(self) -> &'static str {
        match self {
            Dialect::Mysql => "() VALUES ()",
            Dialect::Oracle => "VALUES (DEFAULT)",
            Dialect::Postgres | Dialect::Sqlite => "DEFAULT VALUES",
        }
    }

    /// Whether the dialect generates keys from sequences.
    pub const fn uses_sequences(self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::Oracle)
    }

    /// Conventional sequence name for a table's primary key.
    pub fn default_sequence_name(self, table: &str, primary_key: &str) -> Option<String> {
        match self {
            Dialect::Postgres => Some(format!("{table}_{primary_key}_seq")),
            Dialect::Oracle => Some(format!("{table}_seq")),
            Dialect::Mysql | Dialect::Sqlite => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_per_dialect() {
        assert_eq!(Dialect::Postgres.quote_identifier("orders"), "\"orders\"");
        assert_eq!(Dialect::Mysql.quote_identifier("orders"), "`orders`");
        assert_eq!(
            Dialect::Postgres.quote_identifier("shop.orders"),
            "\"shop\".\"orders\""
        );
        assert_eq!(Dialect::Sqlite.quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn names_round_trip() {
        for d in [Dialect::Postgres, Dialect::Mysql, Dialect::Sqlite, Dialect::Oracle] {
            assert_eq!(Dialect::from_name(d.name()), Some(d));
        }
        assert_eq!(Dialect::from_name("PostgreSQL"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_name("db2"), None);
    }

    #[test]
    fn deserializes_lowercase() {
        let d: Dialect = serde_json::from_str("\"oracle\"").unwrap();
        assert_eq!(d, Dialect::Oracle);
        assert_eq!(d.pagination_style(), PaginationStyle::RowNumber);
    }

    #[test]
    fn sequence_naming() {
        assert_eq!(
            Dialect::Postgres.default_sequence_name("orders", "id").as_deref(),
            Some("orders_id_seq")
        );
        assert_eq!(Dialect::Mysql.default_sequence_name("orders", "id"), None);
    }
}
