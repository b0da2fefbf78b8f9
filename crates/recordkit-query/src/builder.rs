//! Statement assembly for SELECT, INSERT, UPDATE and DELETE.
//!
//! A [`SqlBuilder`] accumulates a [`StatementPlan`] and renders it to
//! `(sql, binds)`. Bind order is always: assigned values first, then
//! condition values in the order the conditions were added.

use std::sync::Arc;

use recordkit_core::{Dialect, Error, Result, Value};

use crate::condition::{CompiledCondition, Condition, count_placeholders};
use crate::options::{FindOptions, SetClause};
use crate::pagination::{Paginator, default_paginator};

/// Operation a statement performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        }
    }
}

/// Everything needed to render one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementPlan {
    pub kind: StatementKind,
    /// Unquoted table name, optionally `database.table`
    pub table: String,
    pub select: Option<String>,
    /// Verbatim FROM clause overriding the table
    pub from: Option<String>,
    pub joins: Vec<String>,
    pub conditions: Vec<CompiledCondition>,
    /// Column assignments for INSERT and UPDATE
    pub values: Vec<(String, Value)>,
    /// Literal assignment SQL appended to UPDATE's SET list
    pub raw_set: Option<String>,
    pub group: Option<String>,
    pub having: Option<String>,
    pub order: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl StatementPlan {
    fn new(kind: StatementKind, table: &str) -> Self {
        Self {
            kind,
            table: table.to_string(),
            select: None,
            from: None,
            joins: Vec::new(),
            conditions: Vec::new(),
            values: Vec::new(),
            raw_set: None,
            group: None,
            having: None,
            order: None,
            limit: None,
            offset: None,
        }
    }
}

/// Fluent builder over a [`StatementPlan`].
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    dialect: Dialect,
    plan: StatementPlan,
    paginator: Option<Arc<dyn Paginator>>,
}

impl SqlBuilder {
    fn new(kind: StatementKind, dialect: Dialect, table: &str) -> Self {
        Self {
            dialect,
            plan: StatementPlan::new(kind, table),
            paginator: None,
        }
    }

    pub fn select(dialect: Dialect, table: &str) -> Self {
        Self::new(StatementKind::Select, dialect, table)
    }

    pub fn insert(dialect: Dialect, table: &str) -> Self {
        Self::new(StatementKind::Insert, dialect, table)
    }

    pub fn update(dialect: Dialect, table: &str) -> Self {
        Self::new(StatementKind::Update, dialect, table)
    }

    pub fn delete(dialect: Dialect, table: &str) -> Self {
        Self::new(StatementKind::Delete, dialect, table)
    }

    pub fn plan(&self) -> &StatementPlan {
        &self.plan
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn columns(mut self, select: impl Into<String>) -> Self {
        self.plan.select = Some(select.into());
        self
    }

    pub fn from_clause(mut self, from: impl Into<String>) -> Self {
        self.plan.from = Some(from.into());
        self
    }

    pub fn join(mut self, join: impl Into<String>) -> Self {
        self.plan.joins.push(join.into());
        self
    }

    /// Add an already-compiled condition. Empty conditions are ignored.
    pub fn filter(mut self, condition: CompiledCondition) -> Self {
        if !condition.is_empty() {
            self.plan.conditions.push(condition);
        }
        self
    }

    /// Compile a condition against this builder's dialect and add it.
    pub fn filter_condition(self, condition: &Condition) -> Result<Self> {
        let compiled = condition.compile(self.dialect)?;
        Ok(self.filter(compiled))
    }

    /// Append a column assignment.
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.plan.values.push((column.into(), value.into()));
        self
    }

    pub fn values<I, K>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.plan
            .values
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    pub fn raw_set(mut self, sql: impl Into<String>) -> Self {
        self.plan.raw_set = Some(sql.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.plan.group = Some(group.into());
        self
    }

    pub fn having(mut self, having: impl Into<String>) -> Self {
        self.plan.having = Some(having.into());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.plan.order = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.plan.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.plan.offset = Some(offset);
        self
    }

    /// Override the dialect's default pagination strategy.
    pub fn paginator(mut self, paginator: Arc<dyn Paginator>) -> Self {
        self.paginator = Some(paginator);
        self
    }

    /// The strategy SELECT rendering will use.
    pub fn active_paginator(&self) -> Arc<dyn Paginator> {
        self.paginator
            .clone()
            .unwrap_or_else(|| default_paginator(self.dialect))
    }

    /// Copy the statement-shaping parts of an options structure into the plan.
    ///
    /// `include` and `readonly` concern hydration and are not rendered.
    pub fn apply_options(mut self, options: &FindOptions) -> Result<Self> {
        if let Some(conditions) = &options.conditions {
            self = self.filter_condition(conditions)?;
        }
        if let Some(select) = &options.select {
            self.plan.select = Some(select.clone());
        }
        if let Some(from) = &options.from {
            self.plan.from = Some(from.clone());
        }
        self.plan.joins.extend(options.joins.iter().cloned());
        if let Some(group) = &options.group {
            self.plan.group = Some(group.clone());
        }
        if let Some(having) = &options.having {
            self.plan.having = Some(having.clone());
        }
        if let Some(order) = &options.order {
            self.plan.order = Some(order.clone());
        }
        if options.limit.is_some() {
            self.plan.limit = options.limit;
        }
        if options.offset.is_some() {
            self.plan.offset = options.offset;
        }
        match &options.set {
            Some(SetClause::Values(pairs)) => self.plan.values.extend(pairs.iter().cloned()),
            Some(SetClause::Raw(sql)) => self.plan.raw_set = Some(sql.clone()),
            None => {}
        }
        Ok(self)
    }

    /// Render the statement with the dialect's quoting.
    pub fn build(&self) -> Result<(String, Vec<Value>)> {
        let (sql, binds) = match self.plan.kind {
            StatementKind::Select => self.build_select(),
            StatementKind::Insert => self.build_insert()?,
            StatementKind::Update => self.build_update()?,
            StatementKind::Delete => self.build_delete()?,
        };
        debug_assert_eq!(count_placeholders(&sql), binds.len());
        tracing::trace!(
            kind = self.plan.kind.keyword(),
            table = %self.plan.table,
            binds = binds.len(),
            "Rendered statement"
        );
        Ok((sql, binds))
    }

    fn quoted_table(&self) -> String {
        self.dialect.quote_identifier(&self.plan.table)
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let merged = CompiledCondition::merge(self.plan.conditions.iter().cloned());
        if merged.is_empty() {
            (String::new(), Vec::new())
        } else {
            (format!(" WHERE {}", merged.sql), merged.values)
        }
    }

    fn build_select(&self) -> (String, Vec<Value>) {
        let plan = &self.plan;
        let columns = plan.select.as_deref().unwrap_or("*");
        let from = plan.from.clone().unwrap_or_else(|| self.quoted_table());

        let mut sql = format!("SELECT {columns} FROM {from}");
        for join in &plan.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        let (where_sql, binds) = self.where_clause();
        sql.push_str(&where_sql);
        if let Some(group) = &plan.group {
            sql.push_str(&format!(" GROUP BY {group}"));
        }
        if let Some(having) = &plan.having {
            sql.push_str(&format!(" HAVING {having}"));
        }
        if let Some(order) = &plan.order {
            sql.push_str(&format!(" ORDER BY {order}"));
        }
        if plan.limit.is_some() || plan.offset.is_some() {
            sql = self
                .active_paginator()
                .paginate(&sql, plan.limit, plan.offset);
        }
        (sql, binds)
    }

    fn build_insert(&self) -> Result<(String, Vec<Value>)> {
        let plan = &self.plan;
        if !plan.conditions.is_empty() {
            return Err(Error::builder("INSERT does not accept conditions"));
        }
        if plan.raw_set.is_some() {
            return Err(Error::builder("INSERT does not accept a raw SET clause"));
        }

        let table = self.quoted_table();
        if plan.values.is_empty() {
            return Ok((
                format!("INSERT INTO {table} {}", self.dialect.empty_insert_clause()),
                Vec::new(),
            ));
        }

        let columns: Vec<String> = plan
            .values
            .iter()
            .map(|(col, _)| self.dialect.quote_identifier(col))
            .collect();
        let marks = vec!["?"; plan.values.len()].join(", ");
        let binds = plan.values.iter().map(|(_, v)| v.clone()).collect();
        Ok((
            format!("INSERT INTO {table} ({}) VALUES ({marks})", columns.join(", ")),
            binds,
        ))
    }

    fn build_update(&self) -> Result<(String, Vec<Value>)> {
        let plan = &self.plan;
        let mut assignments: Vec<String> = plan
            .values
            .iter()
            .map(|(col, _)| format!("{} = ?", self.dialect.quote_identifier(col)))
            .collect();
        if let Some(raw) = &plan.raw_set {
            if count_placeholders(raw) > 0 {
                return Err(Error::builder(
                    "a raw SET clause cannot contain placeholders; use column values instead",
                ));
            }
            assignments.push(raw.clone());
        }
        if assignments.is_empty() {
            return Err(Error::builder("UPDATE requires at least one assignment"));
        }

        let mut binds: Vec<Value> = plan.values.iter().map(|(_, v)| v.clone()).collect();
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.quoted_table(),
            assignments.join(", ")
        );
        let (where_sql, where_binds) = self.where_clause();
        sql.push_str(&where_sql);
        binds.extend(where_binds);
        self.push_mutation_tail(&mut sql)?;
        Ok((sql, binds))
    }

    fn build_delete(&self) -> Result<(String, Vec<Value>)> {
        let mut sql = format!("DELETE FROM {}", self.quoted_table());
        let (where_sql, binds) = self.where_clause();
        sql.push_str(&where_sql);
        self.push_mutation_tail(&mut sql)?;
        Ok((sql, binds))
    }

    /// ORDER BY / LIMIT on UPDATE and DELETE.
    fn push_mutation_tail(&self, sql: &mut String) -> Result<()> {
        let plan = &self.plan;
        let keyword = plan.kind.keyword();
        if plan.offset.is_some() {
            return Err(Error::builder(format!("{keyword} does not accept an offset")));
        }
        if plan.order.is_none() && plan.limit.is_none() {
            return Ok(());
        }
        if !self.dialect.supports_mutation_limit() {
            return Err(Error::builder(format!(
                "{} does not support ORDER BY or LIMIT on {keyword}",
                self.dialect.name()
            )));
        }
        if let Some(order) = &plan.order {
            sql.push_str(&format!(" ORDER BY {order}"));
        }
        if let Some(limit) = plan.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Ok(())
    }
}
