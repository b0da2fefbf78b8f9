//! Semantic column types.

use serde::{Deserialize, Serialize};

/// The semantic type a column's values are cast to.
///
/// Backends spell their types in many ways (`int4`, `NUMBER(10,0)`,
/// `character varying(255)`); each spelling maps onto exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Integer,
    Decimal,
    Boolean,
    Datetime,
    Date,
    Time,
    Binary,
    Text,
}

impl SemanticType {
    /// Lowercase name of the type.
    pub const fn name(self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::Integer => "integer",
            SemanticType::Decimal => "decimal",
            SemanticType::Boolean => "boolean",
            SemanticType::Datetime => "datetime",
            SemanticType::Date => "date",
            SemanticType::Time => "time",
            SemanticType::Binary => "binary",
            SemanticType::Text => "text",
        }
    }

    /// True for types whose values are character data.
    pub const fn is_textual(self) -> bool {
        matches!(self, SemanticType::String | SemanticType::Text)
    }

    /// Map a backend type spelling to a semantic type.
    ///
    /// `scale` is the numeric scale reported by the backend, if any. Exact
    /// numerics with a scale of zero (`NUMBER(10,0)`, `numeric(12,0)`) are integers.
    pub fn from_raw(raw_type: &str, scale: Option<u32>) -> Self {
        let normalized = raw_type.trim().to_ascii_lowercase();

        // Scale embedded in the spelling wins over a missing reported scale.
        let embedded_scale = parse_embedded_scale(&normalized);
        let scale = scale.or(embedded_scale);

        let base = strip_modifiers(&normalized);

        match base.as_str() {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "int2"
            | "int4" | "int8" | "serial" | "bigserial" | "smallserial" | "long" => {
                SemanticType::Integer
            }
            "numeric" | "number" | "decimal" | "dec" => match scale {
                Some(0) => SemanticType::Integer,
                _ => SemanticType::Decimal,
            },
            "float" | "float4" | "float8" | "double" | "double precision" | "real" | "money" => {
                SemanticType::Decimal
            }
            "bool" | "boolean" | "bit" => SemanticType::Boolean,
            "datetime" | "datetime2" | "timestamp" | "timestamptz" | "smalldatetime" => {
                SemanticType::Datetime
            }
            "date" => SemanticType::Date,
            "time" | "timetz" => SemanticType::Time,
            "text" | "tinytext" | "mediumtext" | "longtext" | "clob" | "nclob" | "ntext" => {
                SemanticType::Text
            }
            "blob" | "tinyblob" | "mediumblob" | "longblob" | "bytea" | "binary"
            | "varbinary" | "raw" | "long raw" | "image" => SemanticType::Binary,
            _ => SemanticType::String,
        }
    }
}

/// Remove length/precision suffixes and trailing modifiers.
fn strip_modifiers(raw: &str) -> String {
    let without_parens = match raw.find('(') {
        Some(open) => {
            let close = raw[open..].find(')').map_or(raw.len(), |c| open + c + 1);
            format!("{}{}", &raw[..open], &raw[close..])
        }
        None => raw.to_string(),
    };

    let mut base = without_parens.trim().to_string();
    for suffix in [
        " with time zone",
        " without time zone",
        " unsigned",
        " zerofill",
        " varying",
    ] {
        if let Some(stripped) = base.strip_suffix(suffix) {
            base = stripped.trim().to_string();
        }
    }
    base.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scale from a spelling like `numeric(10,2)`.
fn parse_embedded_scale(raw: &str) -> Option<u32> {
    let open = raw.find('(')?;
    let close = raw[open..].find(')')? + open;
    let inner = &raw[open + 1..close];
    let (_, scale) = inner.split_once(',')?;
    scale.trim().parse().ok()
}
