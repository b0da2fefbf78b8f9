//! Finders, persistence and transactions for recordkit.
//!
//! The Session owns a connection and drives every statement recordkit sends:
//! it loads table metadata through the schema cache, compiles finders into
//! SQL, turns a record's dirty set into minimal INSERT/UPDATE payloads and
//! brackets persistence with the model's lifecycle hooks.
//!
//! # Design Philosophy
//!
//! - **Minimal writes**: UPDATE carries only flagged attributes; an empty diff
//!   sends nothing.
//! - **Errors before I/O**: malformed conditions and options fail before any
//!   statement reaches the backend; backend errors propagate unchanged.
//! - **Coarse transactions**: one unit of work per `transaction` call; nesting is
//!   rejected unless explicitly flattened.
//!
//! # Example
//!
//! ```ignore
//! let session = Session::new(conn);
//!
//! let mut order = session.find_by_pk::<Order>(cx, 5).await?;
//! order.set("status", "shipped")?;
//! session.save(cx, &mut order).await?;
//! ```

pub mod config;

pub use config::{NestedTransactions, SessionConfig};

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use asupersync::{Cx, Outcome};
use recordkit_core::{
    ColumnCaster, Connection, DefaultInflector, Error, Inflector, NotFoundError, Row,
    SchemaIntrospector, SemanticType, Value,
};
use recordkit_model::{
    ConnectionInfo, HookSignal, Model, Operation, Record, Table, TableSchemaCache, schema_cache,
};
use recordkit_query::{Condition, FindOptions, SqlBuilder};

/// Unwrap an `Outcome`, returning early on anything but `Ok`.
macro_rules! try_outcome {
    ($expr:expr) => {
        match $expr {
            Outcome::Ok(value) => value,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }
    };
}

/// Unwrap a `Result`, returning `Outcome::Err` on failure.
macro_rules! try_result {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => return Outcome::Err(e),
        }
    };
}

enum CacheHandle {
    Global,
    Owned(Arc<TableSchemaCache>),
}

/// Releases the session's transaction claim when a unit of work ends, however it ends.
struct DepthGuard<'a>(&'a AtomicUsize);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Entry point for reading and persisting records over one connection.
pub struct Session<C: Connection + SchemaIntrospector> {
    connection: C,
    cache: CacheHandle,
    inflector: Arc<dyn Inflector>,
    config: SessionConfig,
    transaction_depth: AtomicUsize,
}

impl<C: Connection + SchemaIntrospector> Session<C> {
    /// Create a session using the process-wide schema cache.
    pub fn new(connection: C) -> Self {
        Self::with_config(connection, SessionConfig::default())
    }

    /// Create a session with custom configuration.
    pub fn with_config(connection: C, config: SessionConfig) -> Self {
        Self {
            connection,
            cache: CacheHandle::Global,
            inflector: Arc::new(DefaultInflector),
            config,
            transaction_depth: AtomicUsize::new(0),
        }
    }

    /// Use a private schema cache instead of the process-wide one.
    pub fn with_cache(mut self, cache: Arc<TableSchemaCache>) -> Self {
        self.cache = CacheHandle::Owned(cache);
        self
    }

    /// Replace the naming conventions used for table and attribute names.
    pub fn with_inflector(mut self, inflector: Arc<dyn Inflector>) -> Self {
        self.inflector = inflector;
        self
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cache(&self) -> &TableSchemaCache {
        match &self.cache {
            CacheHandle::Global => schema_cache(),
            CacheHandle::Owned(cache) => cache,
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction_depth.load(Ordering::SeqCst) > 0
    }

    // ========================================================================
    // Schema
    // ========================================================================

    /// `M`'s table, loaded on first use and cached afterwards.
    pub async fn table<M: Model>(&self, cx: &Cx) -> Outcome<Arc<Table>, Error> {
        let info = ConnectionInfo::new(
            self.config.connection_name.clone(),
            self.connection.dialect(),
        );
        self.cache()
            .load::<M, C>(cx, &self.connection, info, self.inflector.as_ref())
            .await
    }

    /// A new, unsaved record of `M` seeded with column defaults.
    pub async fn build<M: Model>(&self, cx: &Cx) -> Outcome<Record, Error> {
        let table = try_outcome!(self.table::<M>(cx).await);
        Outcome::Ok(Record::new(table))
    }

    // ========================================================================
    // Finders
    // ========================================================================

    /// Records matching an options structure.
    #[tracing::instrument(level = "debug", skip(self, cx, options), fields(model = M::CLASS_NAME))]
    pub async fn find<M: Model>(
        &self,
        cx: &Cx,
        options: FindOptions,
    ) -> Outcome<Vec<Record>, Error> {
        let table = try_outcome!(self.table::<M>(cx).await);
        let builder = try_result!(self.select_builder(&table, &options));
        self.fetch(cx, &table, &builder, options.readonly).await
    }

    /// Every record of `M`.
    pub async fn all<M: Model>(&self, cx: &Cx) -> Outcome<Vec<Record>, Error> {
        self.find::<M>(cx, FindOptions::default()).await
    }

    /// First record matching the options, if any.
    pub async fn first<M: Model>(
        &self,
        cx: &Cx,
        options: FindOptions,
    ) -> Outcome<Option<Record>, Error> {
        let records = try_outcome!(self.find::<M>(cx, options.limit(1)).await);
        Outcome::Ok(records.into_iter().next())
    }

    /// Last record: the given order reversed, or primary key descending.
    pub async fn last<M: Model>(
        &self,
        cx: &Cx,
        options: FindOptions,
    ) -> Outcome<Option<Record>, Error> {
        let table = try_outcome!(self.table::<M>(cx).await);
        let order = match &options.order {
            Some(order) => reverse_order(order),
            None => table
                .primary_key()
                .iter()
                .map(|pk| {
                    format!(
                        "{} DESC",
                        table.dialect().quote_identifier(table.raw_column_name(pk))
                    )
                })
                .collect::<Vec<_>>()
                .join(", "),
        };
        self.first::<M>(cx, options.order(order)).await
    }

    /// Number of records matching the options.
    pub async fn count<M: Model>(&self, cx: &Cx, options: FindOptions) -> Outcome<u64, Error> {
        let table = try_outcome!(self.table::<M>(cx).await);
        let options = FindOptions {
            select: Some("COUNT(*)".to_string()),
            order: None,
            limit: None,
            offset: None,
            ..options
        };
        let builder = try_result!(self.select_builder(&table, &options));
        let (sql, binds) = try_result!(builder.build());
        let rows = try_outcome!(self.run_query(cx, &sql, &binds).await);

        let raw = rows
            .first()
            .and_then(|row| row.get_index(0))
            .cloned()
            .unwrap_or(Value::Null);
        let caster = ColumnCaster::new(SemanticType::Integer, table.dialect());
        let count = try_result!(caster.cast_from_raw(&raw));
        Outcome::Ok(count.as_i64().map_or(0, |n| u64::try_from(n).unwrap_or(0)))
    }

    /// Whether any record matches the options.
    pub async fn exists<M: Model>(&self, cx: &Cx, options: FindOptions) -> Outcome<bool, Error> {
        let table = try_outcome!(self.table::<M>(cx).await);
        let options = FindOptions {
            select: Some("1".to_string()),
            limit: Some(1),
            ..options
        };
        let builder = try_result!(self.select_builder(&table, &options));
        let (sql, binds) = try_result!(builder.build());
        let rows = try_outcome!(self.run_query(cx, &sql, &binds).await);
        Outcome::Ok(!rows.is_empty())
    }

    /// The record with primary key `pk`, or `NotFound`.
    pub async fn find_by_pk<M: Model>(
        &self,
        cx: &Cx,
        pk: impl Into<Value>,
    ) -> Outcome<Record, Error> {
        self.find_by_pk_with::<M>(cx, pk, FindOptions::default())
            .await
    }

    /// The record with primary key `pk` that also satisfies the options' conditions.
    pub async fn find_by_pk_with<M: Model>(
        &self,
        cx: &Cx,
        pk: impl Into<Value>,
        options: FindOptions,
    ) -> Outcome<Record, Error> {
        let key = pk.into();
        let records = try_outcome!(self.lookup_pks::<M>(cx, vec![key.clone()], options).await);
        match records.into_iter().next() {
            Some(record) => Outcome::Ok(record),
            None => Outcome::Err(Error::NotFound(NotFoundError {
                model: M::CLASS_NAME.to_string(),
                keys: vec![key],
                expected: 1,
                found: 0,
            })),
        }
    }

    /// One record per key, or `NotFound` naming expected and actual counts.
    pub async fn find_all_by_pk<M: Model>(
        &self,
        cx: &Cx,
        pks: Vec<Value>,
    ) -> Outcome<Vec<Record>, Error> {
        self.lookup_pks::<M>(cx, pks, FindOptions::default()).await
    }

    #[tracing::instrument(
        level = "debug",
        skip(self, cx, keys, options),
        fields(model = M::CLASS_NAME)
    )]
    async fn lookup_pks<M: Model>(
        &self,
        cx: &Cx,
        keys: Vec<Value>,
        options: FindOptions,
    ) -> Outcome<Vec<Record>, Error> {
        let table = try_outcome!(self.table::<M>(cx).await);
        let pk_condition = try_result!(pk_condition(&table, &keys));
        let builder = try_result!(self.select_builder(&table, &options));
        let builder = try_result!(builder.filter_condition(&pk_condition));

        let records = try_outcome!(self.fetch(cx, &table, &builder, options.readonly).await);
        if records.len() != keys.len() {
            tracing::debug!(
                model = M::CLASS_NAME,
                expected = keys.len(),
                found = records.len(),
                "Primary-key lookup row count mismatch"
            );
            return Outcome::Err(Error::NotFound(NotFoundError {
                model: M::CLASS_NAME.to_string(),
                expected: keys.len(),
                found: records.len(),
                keys,
            }));
        }
        Outcome::Ok(records)
    }

    /// First record matching a dynamic finder such as `name_and_status`.
    pub async fn find_by<M: Model>(
        &self,
        cx: &Cx,
        finder: &str,
        values: Vec<Value>,
    ) -> Outcome<Option<Record>, Error> {
        let records = try_outcome!(self.find_all_by_inner::<M>(cx, finder, values, Some(1)).await);
        Outcome::Ok(records.into_iter().next())
    }

    /// Every record matching a dynamic finder.
    pub async fn find_all_by<M: Model>(
        &self,
        cx: &Cx,
        finder: &str,
        values: Vec<Value>,
    ) -> Outcome<Vec<Record>, Error> {
        self.find_all_by_inner::<M>(cx, finder, values, None).await
    }

    async fn find_all_by_inner<M: Model>(
        &self,
        cx: &Cx,
        finder: &str,
        values: Vec<Value>,
        limit: Option<u64>,
    ) -> Outcome<Vec<Record>, Error> {
        let table = try_outcome!(self.table::<M>(cx).await);
        let condition = try_result!(finder_condition(&table, finder, values));
        let options = FindOptions {
            conditions: Some(condition),
            limit,
            ..FindOptions::default()
        };
        let builder = try_result!(self.select_builder(&table, &options));
        self.fetch(cx, &table, &builder, false).await
    }

    /// Hydrate records from hand-written SQL with positional binds.
    pub async fn find_by_sql<M: Model>(
        &self,
        cx: &Cx,
        sql: &str,
        values: Vec<Value>,
    ) -> Outcome<Vec<Record>, Error> {
        let table = try_outcome!(self.table::<M>(cx).await);
        let compiled = try_result!(Condition::positional(sql, values).compile(table.dialect()));
        let rows = try_outcome!(self.run_query(cx, &compiled.sql, &compiled.values).await);
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(try_result!(Record::from_row(Arc::clone(&table), row, false)));
        }
        Outcome::Ok(records)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// INSERT a new record or UPDATE a persisted one.
    ///
    /// Returns `false` when a before-hook aborted the operation.
    pub async fn save(&self, cx: &Cx, record: &mut Record) -> Outcome<bool, Error> {
        if record.is_new_record() {
            self.insert(cx, record).await
        } else {
            self.update(cx, record).await
        }
    }

    /// INSERT a record.
    ///
    /// Writes the flagged attributes, or every column when nothing is flagged.
    /// A null auto-generated primary key is left out and back-filled afterwards.
    #[tracing::instrument(
        level = "debug",
        skip(self, cx, record),
        fields(model = record.model_name())
    )]
    pub async fn insert(&self, cx: &Cx, record: &mut Record) -> Outcome<bool, Error> {
        try_result!(verify_writable(record, "insert"));
        let table = Arc::clone(record.table());

        if table.callbacks().run_before(Operation::Create, record) == HookSignal::Abort {
            return Outcome::Ok(false);
        }

        let attributes: Vec<(String, Value)> = if record.is_dirty() {
            record.dirty_attributes()
        } else {
            table
                .columns()
                .iter()
                .filter_map(|c| {
                    record
                        .read_attribute(&c.inflected_name)
                        .map(|v| (c.inflected_name.clone(), v.clone()))
                })
                .collect()
        };

        let values: Vec<(String, Value)> = attributes
            .into_iter()
            .filter_map(|(attribute, value)| {
                let column = table.column_by_inflected_name(&attribute)?;
                if column.auto_increment && value.is_null() {
                    return None;
                }
                Some((column.name.clone(), value))
            })
            .collect();

        tracing::info!(
            model = table.class_name(),
            table = table.table_name(),
            columns = values.len(),
            "Inserting record"
        );

        let builder = SqlBuilder::insert(table.dialect(), &table.qualified_name()).values(values);
        let (sql, binds) = try_result!(builder.build());
        try_outcome!(self.run_execute(cx, &sql, &binds).await);

        if let [pk] = table.primary_key() {
            let missing = record.read_attribute(pk).is_none_or(Value::is_null);
            let generated = table
                .column_by_inflected_name(pk)
                .is_some_and(|c| c.auto_increment)
                || table.sequence().is_some();
            if missing && generated {
                let id = try_outcome!(self.connection.last_insert_id(cx, table.sequence()).await);
                try_result!(record.assign_generated_key(pk, id));
            }
        }

        record.mark_persisted();
        record.reset_dirty();
        table.callbacks().run_after(Operation::Create, record);
        Outcome::Ok(true)
    }

    /// UPDATE a persisted record with its flagged attributes.
    ///
    /// A clean record sends no statement and succeeds.
    #[tracing::instrument(
        level = "debug",
        skip(self, cx, record),
        fields(model = record.model_name())
    )]
    pub async fn update(&self, cx: &Cx, record: &mut Record) -> Outcome<bool, Error> {
        try_result!(verify_writable(record, "update"));
        if record.is_new_record() {
            return Outcome::Err(Error::builder(format!(
                "{}: cannot update a record that has not been inserted",
                record.model_name()
            )));
        }
        if !record.is_dirty() {
            return Outcome::Ok(true);
        }
        let table = Arc::clone(record.table());
        let pk = try_result!(pk_equality(&table, record));

        if table.callbacks().run_before(Operation::Update, record) == HookSignal::Abort {
            return Outcome::Ok(false);
        }

        let diff = record.dirty_attributes();
        if diff.is_empty() {
            record.reset_dirty();
            return Outcome::Ok(true);
        }

        let values: Vec<(String, Value)> = diff
            .into_iter()
            .map(|(attribute, value)| (table.raw_column_name(&attribute).to_string(), value))
            .collect();

        tracing::info!(
            model = table.class_name(),
            table = table.table_name(),
            columns = values.len(),
            "Updating record"
        );

        let builder = SqlBuilder::update(table.dialect(), &table.qualified_name()).values(values);
        let builder = try_result!(builder.filter_condition(&pk));
        let (sql, binds) = try_result!(builder.build());
        try_outcome!(self.run_execute(cx, &sql, &binds).await);

        record.reset_dirty();
        table.callbacks().run_after(Operation::Update, record);
        Outcome::Ok(true)
    }

    /// DELETE a persisted record by primary key.
    #[tracing::instrument(
        level = "debug",
        skip(self, cx, record),
        fields(model = record.model_name())
    )]
    pub async fn delete(&self, cx: &Cx, record: &mut Record) -> Outcome<bool, Error> {
        try_result!(verify_writable(record, "delete"));
        let table = Arc::clone(record.table());
        let pk = try_result!(pk_equality(&table, record));

        if table.callbacks().run_before(Operation::Destroy, record) == HookSignal::Abort {
            return Outcome::Ok(false);
        }

        tracing::info!(
            model = table.class_name(),
            table = table.table_name(),
            "Deleting record"
        );

        let builder = try_result!(
            SqlBuilder::delete(table.dialect(), &table.qualified_name()).filter_condition(&pk)
        );
        let (sql, binds) = try_result!(builder.build());
        try_outcome!(self.run_execute(cx, &sql, &binds).await);

        table.callbacks().run_after(Operation::Destroy, record);
        Outcome::Ok(true)
    }

    /// Bulk UPDATE from the options' `set` and conditions. Returns affected rows.
    #[tracing::instrument(level = "debug", skip(self, cx, options), fields(model = M::CLASS_NAME))]
    pub async fn update_all<M: Model>(&self, cx: &Cx, options: FindOptions) -> Outcome<u64, Error> {
        let table = try_outcome!(self.table::<M>(cx).await);
        let builder = try_result!(
            SqlBuilder::update(table.dialect(), &table.qualified_name()).apply_options(&options)
        );
        let (sql, binds) = try_result!(builder.build());
        self.run_execute(cx, &sql, &binds).await
    }

    /// Bulk DELETE by the options' conditions. Returns affected rows.
    #[tracing::instrument(level = "debug", skip(self, cx, options), fields(model = M::CLASS_NAME))]
    pub async fn delete_all<M: Model>(&self, cx: &Cx, options: FindOptions) -> Outcome<u64, Error> {
        let table = try_outcome!(self.table::<M>(cx).await);
        let builder = try_result!(
            SqlBuilder::delete(table.dialect(), &table.qualified_name()).apply_options(&options)
        );
        let (sql, binds) = try_result!(builder.build());
        self.run_execute(cx, &sql, &binds).await
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Run `work` inside BEGIN/COMMIT.
    ///
    /// An error from `work`, or `Ok(false)`, rolls back and is returned as-is.
    /// Calling this inside another transaction fails unless the session is
    /// configured with [`NestedTransactions::Flatten`], in which case `work`
    /// runs as part of the outer transaction.
    #[tracing::instrument(level = "debug", skip(self, cx, work))]
    pub async fn transaction<F, Fut>(&self, cx: &Cx, work: F) -> Outcome<bool, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<bool, Error>>,
    {
        // The claim precedes BEGIN: at most one transaction is open per session.
        let claimed = self
            .transaction_depth
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if !claimed {
            return match self.config.nested_transactions {
                NestedTransactions::Reject => Outcome::Err(Error::Transaction(
                    "a transaction is already open on this session".to_string(),
                )),
                NestedTransactions::Flatten => {
                    tracing::debug!("Flattening nested transaction into the outer one");
                    work().await
                }
            };
        }
        let _depth = DepthGuard(&self.transaction_depth);

        tracing::info!("Beginning transaction");
        try_outcome!(self.connection.begin(cx).await);

        match work().await {
            Outcome::Ok(true) => {
                tracing::info!("Committing transaction");
                try_outcome!(self.connection.commit(cx).await);
                Outcome::Ok(true)
            }
            Outcome::Ok(false) => {
                tracing::info!("Rolling back transaction");
                try_outcome!(self.connection.rollback(cx).await);
                Outcome::Ok(false)
            }
            failed => {
                tracing::info!("Rolling back transaction after failure");
                if let Outcome::Err(e) = self.connection.rollback(cx).await {
                    tracing::warn!(error = %e, "Rollback failed");
                }
                failed
            }
        }
    }

    // ========================================================================
    // Statement plumbing
    // ========================================================================

    fn select_builder(
        &self,
        table: &Table,
        options: &FindOptions,
    ) -> recordkit_core::Result<SqlBuilder> {
        SqlBuilder::select(table.dialect(), &table.qualified_name()).apply_options(options)
    }

    async fn fetch(
        &self,
        cx: &Cx,
        table: &Arc<Table>,
        builder: &SqlBuilder,
        readonly: bool,
    ) -> Outcome<Vec<Record>, Error> {
        let (sql, binds) = try_result!(builder.build());
        let rows = try_outcome!(self.run_query(cx, &sql, &binds).await);
        let rows = builder.active_paginator().strip_pseudo_column(rows);

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(try_result!(Record::from_row(Arc::clone(table), row, readonly)));
        }
        Outcome::Ok(records)
    }

    async fn run_query(&self, cx: &Cx, sql: &str, binds: &[Value]) -> Outcome<Vec<Row>, Error> {
        self.log_statement(sql, binds);
        self.connection.query(cx, sql, binds).await
    }

    async fn run_execute(&self, cx: &Cx, sql: &str, binds: &[Value]) -> Outcome<u64, Error> {
        self.log_statement(sql, binds);
        self.connection.execute(cx, sql, binds).await
    }

    fn log_statement(&self, sql: &str, binds: &[Value]) {
        if self.config.log_sql {
            tracing::debug!(sql = sql, binds = binds.len(), "Executing statement");
        }
    }
}

fn verify_writable(record: &Record, operation: &'static str) -> recordkit_core::Result<()> {
    if record.is_readonly() {
        return Err(Error::ReadOnly {
            model: record.model_name().to_string(),
            operation,
        });
    }
    Ok(())
}

/// Equality on the record's primary-key columns. Every key part must be set.
fn pk_equality(table: &Table, record: &Record) -> recordkit_core::Result<Condition> {
    let values = record.primary_key_values();
    if values.iter().any(Value::is_null) {
        return Err(Error::configuration(format!(
            "{}: primary key is not set",
            table.class_name()
        )));
    }
    Ok(Condition::equality(
        table
            .primary_key()
            .iter()
            .map(|pk| table.raw_column_name(pk).to_string())
            .zip(values),
    ))
}

/// Condition selecting the rows for `keys`.
///
/// Single-column keys compile to `= ?` or `IN (...)`. Composite keys take one
/// array per key and compile to OR-joined groups.
fn pk_condition(table: &Table, keys: &[Value]) -> recordkit_core::Result<Condition> {
    let columns: Vec<&str> = table
        .primary_key()
        .iter()
        .map(|pk| table.raw_column_name(pk))
        .collect();

    if let [column] = columns.as_slice() {
        let value = match keys {
            [single] => single.clone(),
            many => Value::Array(many.to_vec()),
        };
        return Ok(Condition::equality([(column.to_string(), value)]));
    }

    let dialect = table.dialect();
    let group = columns
        .iter()
        .map(|c| format!("{} = ?", dialect.quote_identifier(c)))
        .collect::<Vec<_>>()
        .join(" AND ");
    let mut fragments = Vec::with_capacity(keys.len());
    let mut values = Vec::new();
    for key in keys {
        let Some(parts) = key.as_array().filter(|parts| parts.len() == columns.len()) else {
            return Err(Error::builder(format!(
                "{} has a {}-column primary key; each key must list {} values",
                table.class_name(),
                columns.len(),
                columns.len()
            )));
        };
        fragments.push(format!("({group})"));
        values.extend(parts.iter().cloned());
    }
    if fragments.is_empty() {
        return Ok(Condition::raw("1 = 0"));
    }
    Ok(Condition::positional(fragments.join(" OR "), values))
}

/// Derived condition for a dynamic finder, with attribute names mapped to columns.
fn finder_condition(
    table: &Table,
    finder: &str,
    values: Vec<Value>,
) -> recordkit_core::Result<Condition> {
    match Condition::from_finder(finder, values)? {
        Condition::Derived {
            fields,
            values,
            joiner,
        } => {
            let mut columns = Vec::with_capacity(fields.len());
            for field in fields {
                let Some(column) = table.column_by_inflected_name(&field) else {
                    return Err(Error::UnknownAttribute {
                        model: table.class_name().to_string(),
                        name: field,
                    });
                };
                columns.push(column.name.clone());
            }
            Ok(Condition::derived(columns, values, joiner))
        }
        other => Ok(other),
    }
}

/// Flip the direction of every term in an ORDER BY list.
fn reverse_order(order: &str) -> String {
    order
        .split(',')
        .map(|term| {
            let term = term.trim();
            let upper = term.to_ascii_uppercase();
            if upper.ends_with(" DESC") {
                format!("{} ASC", term[..term.len() - 5].trim_end())
            } else if upper.ends_with(" ASC") {
                format!("{} DESC", term[..term.len() - 4].trim_end())
            } else {
                format!("{term} DESC")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
