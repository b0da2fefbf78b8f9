//! Dialect-pluggable pagination strategies.

use std::sync::Arc;

use recordkit_core::{Dialect, PaginationStyle, Row};

/// Rewrites a complete SELECT to return one page of rows.
pub trait Paginator: Send + Sync + std::fmt::Debug {
    /// Apply `limit`/`offset` to `sql`. Either may be absent.
    fn paginate(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String;

    /// Synthetic column the rewrite injects into result rows, if any.
    fn pseudo_column(&self) -> Option<&str> {
        None
    }

    /// Drop the synthetic column from hydrated output.
    fn strip_pseudo_column(&self, rows: Vec<Row>) -> Vec<Row> {
        match self.pseudo_column() {
            Some(column) => rows
                .into_iter()
                .map(|mut row| {
                    row.remove_ignore_case(column);
                    row
                })
                .collect(),
            None => rows,
        }
    }
}

/// Trailing `LIMIT n OFFSET m`.
#[derive(Debug, Clone, Copy)]
pub struct LimitOffset {
    dialect: Dialect,
}

impl LimitOffset {
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }
}

impl Paginator for LimitOffset {
    fn paginate(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut out = sql.to_string();
        match (limit, offset) {
            (Some(limit), Some(offset)) => {
                out.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            (Some(limit), None) => out.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => match self.dialect.unbounded_limit() {
                Some(unbounded) => {
                    out.push_str(&format!(" LIMIT {unbounded} OFFSET {offset}"));
                }
                None => out.push_str(&format!(" OFFSET {offset}")),
            },
            (None, None) => {}
        }
        out
    }
}

/// Name of the row-number column injected by [`RowNumberWrap`].
pub const ROW_NUMBER_COLUMN: &str = "rk_rnum__";

/// Wraps the base query and filters on a row-number pseudo-column.
///
/// ```text
/// SELECT * FROM (SELECT t.*, ROWNUM rk_rnum__ FROM (<base> ) t
///   WHERE ROWNUM <= offset+limit) WHERE rk_rnum__ > offset
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RowNumberWrap;

impl Paginator for RowNumberWrap {
    fn paginate(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        if limit.is_none() && offset.is_none() {
            return sql.to_string();
        }
        let offset = offset.unwrap_or(0);
        let upper = match limit {
            Some(limit) => format!(" WHERE ROWNUM <= {}", offset.saturating_add(limit)),
            None => String::new(),
        };
        format!(
            "SELECT * FROM (SELECT t.*, ROWNUM {ROW_NUMBER_COLUMN} FROM ({sql} ) t{upper}) \
             WHERE {ROW_NUMBER_COLUMN} > {offset}"
        )
    }

    fn pseudo_column(&self) -> Option<&str> {
        Some(ROW_NUMBER_COLUMN)
    }
}

/// The strategy a dialect uses when a builder does not override it.
pub fn default_paginator(dialect: Dialect) -> Arc<dyn Paginator> {
    match dialect.pagination_style() {
        PaginationStyle::LimitOffset => Arc::new(LimitOffset::new(dialect)),
        PaginationStyle::RowNumber => Arc::new(RowNumberWrap),
    }
}
