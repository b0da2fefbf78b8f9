//! Normalized column metadata.

use std::sync::OnceLock;

use recordkit_core::{
    ColumnCaster, Dialect, Inflector, RawColumn, Result, SemanticType, Value,
};
use regex::Regex;

/// A table column after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Name as the backend reports it
    pub name: String,
    /// Attribute name records use for this column
    pub inflected_name: String,
    pub semantic_type: SemanticType,
    pub raw_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub length: Option<u32>,
    pub scale: Option<u32>,
    /// Sequence named by a `nextval(...)` default
    pub sequence: Option<String>,
    /// Declared default, already cast. `Null` when there is none.
    pub default: Value,
    caster: ColumnCaster,
}

/// A column default as the backend reports it, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DefaultExpr {
    None,
    Literal(String),
    Sequence(String),
    ServerSide(String),
}

const SERVER_KEYWORDS: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIMESTAMP",
    "LOCALTIME",
    "SYSDATE",
    "SYSTIMESTAMP",
    "NOW",
];

fn numeric_literal() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("numeric pattern is valid")
    })
}

fn nextval_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)^nextval\(\s*'"?([^'"]+)"?'"#).expect("nextval pattern is valid")
    })
}

impl DefaultExpr {
    fn parse(raw: &str, dialect: Dialect) -> Self {
        let mut text = raw.trim();
        while let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            text = inner.trim();
        }
        if text.is_empty() || text.eq_ignore_ascii_case("null") {
            return DefaultExpr::None;
        }
        if let Some(caps) = nextval_pattern().captures(text) {
            return DefaultExpr::Sequence(caps[1].to_string());
        }
        if text.starts_with('\'') {
            return match unquote(text) {
                Some(literal) => DefaultExpr::Literal(literal),
                None => DefaultExpr::ServerSide(text.to_string()),
            };
        }
        // Trailing cast on a bare literal, e.g. `0::integer`.
        let bare = text.split("::").next().unwrap_or(text).trim();
        if numeric_literal().is_match(bare)
            || bare.eq_ignore_ascii_case("true")
            || bare.eq_ignore_ascii_case("false")
        {
            return DefaultExpr::Literal(bare.to_string());
        }
        let upper = bare.to_ascii_uppercase();
        if bare.contains('(') || SERVER_KEYWORDS.contains(&upper.as_str()) {
            return DefaultExpr::ServerSide(text.to_string());
        }
        // MySQL reports string defaults without quotes.
        if dialect == Dialect::Mysql {
            return DefaultExpr::Literal(text.to_string());
        }
        DefaultExpr::ServerSide(text.to_string())
    }
}

/// Content of a leading single-quoted literal, with `''` unescaped.
/// Anything after the closing quote (a `::type` cast) is ignored.
fn unquote(text: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = text.chars().skip(1).peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                out.push('\'');
                chars.next();
            } else {
                return Some(out);
            }
        } else {
            out.push(c);
        }
    }
    None
}

impl Column {
    /// Normalize a backend column description.
    pub fn from_raw(raw: &RawColumn, dialect: Dialect, inflector: &dyn Inflector) -> Self {
        let semantic_type = SemanticType::from_raw(&raw.raw_type, raw.scale);
        let caster = ColumnCaster::new(semantic_type, dialect);

        let mut column = Column {
            name: raw.name.clone(),
            inflected_name: inflector.variablize(&raw.name),
            semantic_type,
            raw_type: raw.raw_type.clone(),
            nullable: raw.nullable,
            primary_key: raw.primary_key,
            auto_increment: raw.auto_increment,
            length: raw.length,
            scale: raw.scale,
            sequence: None,
            default: Value::Null,
            caster,
        };

        let Some(raw_default) = raw.raw_default.as_deref() else {
            return column;
        };
        match DefaultExpr::parse(raw_default, dialect) {
            DefaultExpr::None => {}
            DefaultExpr::Sequence(name) => {
                column.auto_increment = true;
                column.sequence = Some(name);
            }
            DefaultExpr::Literal(literal) => {
                match caster.cast_from_raw(&Value::Text(literal)) {
                    Ok(value) => column.default = value,
                    Err(e) => {
                        tracing::warn!(
                            column = %raw.name,
                            default = raw_default,
                            error = %e,
                            "Unparsable column default, treating as no default"
                        );
                    }
                }
            }
            DefaultExpr::ServerSide(expr) => {
                tracing::debug!(
                    column = %raw.name,
                    expr = %expr,
                    "Server-side column default left to the backend"
                );
            }
        }
        column
    }

    pub fn caster(&self) -> ColumnCaster {
        self.caster
    }

    pub fn cast_from_raw(&self, raw: &Value) -> Result<Value> {
        self.caster.cast_from_raw(raw)
    }

    pub fn cast_for_write(&self, value: Value) -> Result<Value> {
        self.caster.cast_for_write(value)
    }
}
