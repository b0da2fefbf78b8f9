//! Per-column value casting.
//!
//! A `ColumnCaster` converts between raw driver values and the canonical value
//! for a column's semantic type. It is used in two directions:
//!
//! - `cast_from_raw` when hydrating rows and consuming declared column defaults,
//! - `cast_for_write` on attribute assignment, so an attribute always holds its
//!   canonical typed value regardless of how the caller spelled it.
//!
//! Casting is pure: a caster is `Copy` and keeps no state between calls.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::dialect::Dialect;
use crate::error::{CastError, Error, Result};
use crate::types::SemanticType;
use crate::value::Value;

/// ISO-8601 forms accepted on assignment in addition to the dialect format.
const ISO_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("decimal pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Read,
    Write,
}

/// Typed cast rules for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnCaster {
    semantic_type: SemanticType,
    dialect: Dialect,
    float_decimals: bool,
}

impl ColumnCaster {
    /// Create a caster for the given semantic type and dialect.
    pub const fn new(semantic_type: SemanticType, dialect: Dialect) -> Self {
        Self {
            semantic_type,
            dialect,
            float_decimals: false,
        }
    }

    /// Cast decimal columns to binary floating point instead of exact text.
    pub const fn float_decimals(mut self, enabled: bool) -> Self {
        self.float_decimals = enabled;
        self
    }

    pub const fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }

    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Cast a raw backend value (row cell or declared default).
    pub fn cast_from_raw(&self, raw: &Value) -> Result<Value> {
        self.cast(raw.clone(), Direction::Read)
    }

    /// Cast an assigned value to the column's canonical representation.
    pub fn cast_for_write(&self, value: Value) -> Result<Value> {
        self.cast(value, Direction::Write)
    }

    fn cast(&self, value: Value, direction: Direction) -> Result<Value> {
        match &value {
            Value::Null => return Ok(Value::Null),
            Value::Array(_) => {
                return Err(self.error(&value, "a sequence cannot be stored in a scalar column"));
            }
            Value::Text(s)
                if s.trim().is_empty()
                    && !self.semantic_type.is_textual()
                    && self.semantic_type != SemanticType::Binary =>
            {
                return Ok(Value::Null);
            }
            _ => {}
        }

        match self.semantic_type {
            SemanticType::Integer => self.to_integer(value),
            SemanticType::Decimal => self.to_decimal(value),
            SemanticType::Boolean => self.to_boolean(value),
            SemanticType::String | SemanticType::Text => self.to_text(value),
            SemanticType::Binary => self.to_binary(value),
            SemanticType::Datetime => self.to_datetime(value, direction),
            SemanticType::Date => self.to_date(value, direction),
            SemanticType::Time => self.to_time(value, direction),
        }
    }

    fn to_integer(&self, value: Value) -> Result<Value> {
        match value {
            Value::BigInt(v) => Ok(Value::BigInt(v)),
            Value::Int(v) => Ok(Value::BigInt(i64::from(v))),
            Value::Bool(b) => Ok(Value::BigInt(i64::from(b))),
            Value::Double(f) => float_to_i64(f)
                .map(Value::BigInt)
                .ok_or_else(|| self.error(&value, "out of range for a 64-bit integer")),
            Value::Text(ref s) | Value::Decimal(ref s) => {
                let trimmed = s.trim();
                if let Ok(v) = trimmed.parse::<i64>() {
                    return Ok(Value::BigInt(v));
                }
                if decimal_pattern().is_match(trimmed) {
                    return trimmed
                        .parse::<f64>()
                        .ok()
                        .and_then(float_to_i64)
                        .map(Value::BigInt)
                        .ok_or_else(|| self.error(&value, "out of range for a 64-bit integer"));
                }
                Err(self.error(&value, "not an integer"))
            }
            other => Err(self.error(&other, "not an integer")),
        }
    }

    fn to_decimal(&self, value: Value) -> Result<Value> {
        let text = match value {
            Value::Decimal(ref s) | Value::Text(ref s) => {
                let trimmed = s.trim();
                if !decimal_pattern().is_match(trimmed) {
                    return Err(self.error(&value, "not a decimal number"));
                }
                trimmed.to_string()
            }
            Value::Int(v) => v.to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::Double(f) if f.is_finite() => {
                if self.float_decimals {
                    return Ok(Value::Double(f));
                }
                f.to_string()
            }
            Value::Bool(b) => (if b { "1" } else { "0" }).to_string(),
            other => return Err(self.error(&other, "not a decimal number")),
        };

        if self.float_decimals {
            let parsed = text
                .parse::<f64>()
                .map_err(|e| self.error(&Value::Text(text.clone()), &e.to_string()))?;
            Ok(Value::Double(parsed))
        } else {
            Ok(Value::Decimal(text))
        }
    }

    fn to_boolean(&self, value: Value) -> Result<Value> {
        match value {
            Value::Bool(b) => Ok(Value::Bool(b)),
            Value::Int(v) => Ok(Value::Bool(v != 0)),
            Value::BigInt(v) => Ok(Value::Bool(v != 0)),
            Value::Double(f) => Ok(Value::Bool(f != 0.0)),
            Value::Text(ref s) | Value::Decimal(ref s) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "1" | "t" | "true" | "y" | "yes" | "on" => Ok(Value::Bool(true)),
                    "0" | "f" | "false" | "n" | "no" | "off" => Ok(Value::Bool(false)),
                    _ => Err(self.error(&value, "not a boolean")),
                }
            }
            other => Err(self.error(&other, "not a boolean")),
        }
    }

    fn to_text(&self, value: Value) -> Result<Value> {
        let text = match value {
            Value::Text(s) | Value::Decimal(s) => s,
            Value::Int(v) => v.to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::Double(f) => f.to_string(),
            Value::Bool(b) => (if b { "1" } else { "0" }).to_string(),
            Value::Bytes(bytes) => String::from_utf8(bytes)
                .map_err(|e| self.error(&Value::Bytes(e.as_bytes().to_vec()), "invalid UTF-8"))?,
            Value::Date(d) => d.format(self.dialect.date_format()).to_string(),
            Value::Time(t) => t.format(self.dialect.time_format()).to_string(),
            Value::Timestamp(ts) => ts.format(self.dialect.datetime_format()).to_string(),
            other => return Err(self.error(&other, "not representable as text")),
        };
        Ok(Value::Text(text))
    }

    fn to_binary(&self, value: Value) -> Result<Value> {
        match value {
            Value::Bytes(b) => Ok(Value::Bytes(b)),
            Value::Text(s) => Ok(Value::Bytes(s.into_bytes())),
            other => Err(self.error(&other, "not binary data")),
        }
    }

    fn to_datetime(&self, value: Value, direction: Direction) -> Result<Value> {
        match value {
            Value::Timestamp(ts) => Ok(Value::Timestamp(ts)),
            Value::Date(d) => d
                .and_hms_opt(0, 0, 0)
                .map(Value::Timestamp)
                .ok_or_else(|| self.error(&Value::Date(d), "date out of range")),
            Value::Text(ref s) => {
                let trimmed = s.trim();
                if let Some(ts) = self.parse_datetime(trimmed, direction) {
                    return Ok(Value::Timestamp(ts));
                }
                Err(self.error(
                    &value,
                    &format!("expected format {}", self.dialect.datetime_format()),
                ))
            }
            other => Err(self.error(&other, "not a datetime")),
        }
    }

    fn to_date(&self, value: Value, direction: Direction) -> Result<Value> {
        match value {
            Value::Date(d) => Ok(Value::Date(d)),
            Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
            Value::Text(ref s) => {
                let trimmed = s.trim();
                if let Ok(d) = NaiveDate::parse_from_str(trimmed, self.dialect.date_format()) {
                    return Ok(Value::Date(d));
                }
                if direction == Direction::Write {
                    if let Ok(d) = NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT) {
                        return Ok(Value::Date(d));
                    }
                }
                // Some drivers report DATE cells with a zero time part.
                if let Some(ts) = self.parse_datetime(trimmed, direction) {
                    return Ok(Value::Date(ts.date()));
                }
                Err(self.error(
                    &value,
                    &format!("expected format {}", self.dialect.date_format()),
                ))
            }
            other => Err(self.error(&other, "not a date")),
        }
    }

    fn to_time(&self, value: Value, direction: Direction) -> Result<Value> {
        match value {
            Value::Time(t) => Ok(Value::Time(t)),
            Value::Timestamp(ts) => Ok(Value::Time(ts.time())),
            Value::Text(ref s) => {
                let trimmed = s.trim();
                if let Ok(t) = NaiveTime::parse_from_str(trimmed, self.dialect.time_format()) {
                    return Ok(Value::Time(t));
                }
                if direction == Direction::Write {
                    if let Ok(t) = NaiveTime::parse_from_str(trimmed, "%H:%M") {
                        return Ok(Value::Time(t));
                    }
                }
                Err(self.error(
                    &value,
                    &format!("expected format {}", self.dialect.time_format()),
                ))
            }
            other => Err(self.error(&other, "not a time")),
        }
    }

    fn parse_datetime(&self, text: &str, direction: Direction) -> Option<NaiveDateTime> {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, self.dialect.datetime_format()) {
            return Some(ts);
        }
        if direction == Direction::Read {
            return None;
        }
        for format in ISO_DATETIME_FORMATS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
                return Some(ts);
            }
        }
        NaiveDate::parse_from_str(text, ISO_DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    fn error(&self, input: &Value, message: &str) -> Error {
        Error::Cast(CastError {
            target: self.semantic_type.name(),
            input: input.to_sql_literal(),
            message: message.to_string(),
        })
    }
}

/// Truncate toward zero, or `None` when the result does not fit an `i64`.
fn float_to_i64(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    let t = f.trunc();
    (t.is_finite() && (-BOUND..BOUND).contains(&t)).then(|| t as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caster(t: SemanticType) -> ColumnCaster {
        ColumnCaster::new(t, Dialect::Postgres)
    }

    #[test]
    fn boolean_raw_forms() {
        let c = caster(SemanticType::Boolean);
        for raw in [Value::Int(1), Value::from("1"), Value::from("t"), Value::from("true")] {
            assert_eq!(c.cast_from_raw(&raw).unwrap(), Value::Bool(true));
        }
        for raw in [Value::Int(0), Value::from("0"), Value::from("f"), Value::from("FALSE")] {
            assert_eq!(c.cast_from_raw(&raw).unwrap(), Value::Bool(false));
        }
        assert!(matches!(c.cast_from_raw(&Value::from("maybe")), Err(Error::Cast(_))));
    }

    #[test]
    fn write_of_raw_is_idempotent_for_bool_and_int() {
        let b = caster(SemanticType::Boolean);
        let i = caster(SemanticType::Integer);
        for raw in [Value::from("t"), Value::Int(0), Value::from("yes")] {
            let once = b.cast_from_raw(&raw).unwrap();
            assert_eq!(b.cast_for_write(once.clone()).unwrap(), once);
        }
        for raw in [Value::from("42"), Value::Int(-3), Value::from(" 7 "), Value::Double(9.9)] {
            let once = i.cast_from_raw(&raw).unwrap();
            assert_eq!(i.cast_for_write(once.clone()).unwrap(), once);
        }
    }

    #[test]
    fn integer_from_text() {
        let c = caster(SemanticType::Integer);
        assert_eq!(c.cast_for_write(Value::from("12")).unwrap(), Value::BigInt(12));
        assert_eq!(c.cast_for_write(Value::from("12.0")).unwrap(), Value::BigInt(12));
        assert_eq!(c.cast_for_write(Value::from("")).unwrap(), Value::Null);
        assert!(c.cast_for_write(Value::from("twelve")).is_err());
    }

    #[test]
    fn integer_out_of_range_is_rejected() {
        let c = caster(SemanticType::Integer);
        for input in [
            Value::from("99999999999999999999"),
            Value::from("-1e30"),
            Value::Double(f64::INFINITY),
            Value::Double(f64::NAN),
            Value::Double(1e19),
        ] {
            assert!(
                matches!(c.cast_for_write(input.clone()), Err(Error::Cast(_))),
                "{input:?}"
            );
        }
        assert_eq!(
            c.cast_for_write(Value::from("9223372036854775807")).unwrap(),
            Value::BigInt(i64::MAX)
        );
        assert_eq!(c.cast_for_write(Value::Double(-3.9)).unwrap(), Value::BigInt(-3));
    }

    #[test]
    fn decimal_keeps_precision() {
        let c = caster(SemanticType::Decimal);
        let v = c
            .cast_from_raw(&Value::from("12345678901234567890.123456789"))
            .unwrap();
        assert_eq!(v, Value::Decimal("12345678901234567890.123456789".to_string()));
        assert_eq!(c.cast_for_write(Value::Int(5)).unwrap(), Value::Decimal("5".into()));
        assert!(c.cast_for_write(Value::from("1.2.3")).is_err());
    }

    #[test]
    fn decimal_as_float_when_requested() {
        let c = caster(SemanticType::Decimal).float_decimals(true);
        assert_eq!(c.cast_from_raw(&Value::from("1.5")).unwrap(), Value::Double(1.5));
    }

    #[test]
    fn datetime_uses_dialect_format() {
        let c = caster(SemanticType::Datetime);
        let v = c.cast_from_raw(&Value::from("2024-01-05 13:45:00")).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();
        assert_eq!(v, Value::Timestamp(expected));
        assert!(matches!(
            c.cast_from_raw(&Value::from("not a date")),
            Err(Error::Cast(_))
        ));
    }

    #[test]
    fn write_accepts_iso_but_read_does_not() {
        let c = caster(SemanticType::Datetime);
        assert!(c.cast_for_write(Value::from("2024-01-05T13:45:00")).is_ok());
        assert!(c.cast_from_raw(&Value::from("2024-01-05T13:45:00")).is_err());
    }

    #[test]
    fn oracle_date_format() {
        let c = ColumnCaster::new(SemanticType::Date, Dialect::Oracle);
        let v = c.cast_from_raw(&Value::from("05-Jan-2024")).unwrap();
        assert_eq!(v, Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()));
    }

    #[test]
    fn text_renders_temporal_values() {
        let c = caster(SemanticType::String);
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(c.cast_for_write(Value::Date(d)).unwrap(), Value::from("2024-02-29"));
        assert_eq!(c.cast_for_write(Value::Int(3)).unwrap(), Value::from("3"));
    }

    #[test]
    fn arrays_are_rejected() {
        let c = caster(SemanticType::Integer);
        assert!(c.cast_for_write(Value::from(vec![1_i64, 2])).is_err());
    }
}
