//! Scripted in-memory connection shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use asupersync::runtime::RuntimeBuilder;
use recordkit::prelude::*;
use recordkit::TableSchemaCache;

#[derive(Default)]
struct MockState {
    statements: Mutex<Vec<(String, Vec<Value>)>>,
    query_results: Mutex<VecDeque<Vec<Row>>>,
    execute_results: Mutex<VecDeque<u64>>,
    schemas: Mutex<HashMap<String, Vec<RawColumn>>>,
    describe_calls: AtomicUsize,
    next_id: Mutex<Option<Value>>,
    id_requests: Mutex<Vec<Option<String>>>,
    failure: Mutex<Option<String>>,
    transaction_log: Mutex<Vec<&'static str>>,
    slow_begin: AtomicBool,
}

/// Pending on the first poll, ready on the second.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Records every statement and replays scripted results.
///
/// Clones share state, so a test can keep a handle after moving one into a session.
#[derive(Clone)]
pub struct MockConnection {
    dialect: Dialect,
    state: Arc<MockState>,
}

impl MockConnection {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            state: Arc::new(MockState::default()),
        }
    }

    pub fn with_table(self, table: &str, columns: Vec<RawColumn>) -> Self {
        self.state
            .schemas
            .lock()
            .unwrap()
            .insert(table.to_string(), columns);
        self
    }

    /// Queue the rows returned by the next query.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state.query_results.lock().unwrap().push_back(rows);
    }

    /// Queue the affected-row count returned by the next execute.
    pub fn push_affected(&self, count: u64) {
        self.state.execute_results.lock().unwrap().push_back(count);
    }

    pub fn set_next_id(&self, id: impl Into<Value>) {
        *self.state.next_id.lock().unwrap() = Some(id.into());
    }

    /// Make the next query or execute fail with a database error.
    pub fn fail_next(&self, message: &str) {
        *self.state.failure.lock().unwrap() = Some(message.to_string());
    }

    /// Make the next BEGIN suspend once before completing.
    pub fn slow_next_begin(&self) {
        self.state.slow_begin.store(true, Ordering::SeqCst);
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.state.statements.lock().unwrap().clone()
    }

    pub fn last_statement(&self) -> (String, Vec<Value>) {
        self.statements().pop().expect("no statement was sent")
    }

    pub fn describe_calls(&self) -> usize {
        self.state.describe_calls.load(Ordering::SeqCst)
    }

    pub fn id_requests(&self) -> Vec<Option<String>> {
        self.state.id_requests.lock().unwrap().clone()
    }

    pub fn transaction_log(&self) -> Vec<&'static str> {
        self.state.transaction_log.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, params: &[Value]) -> Option<Error> {
        self.state
            .statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        self.state
            .failure
            .lock()
            .unwrap()
            .take()
            .map(|message| Error::database(message))
    }

    fn log_transaction(&self, step: &'static str) {
        self.state.transaction_log.lock().unwrap().push(step);
    }
}

impl Connection for MockConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn query(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        let result = match self.record(sql, params) {
            Some(e) => Outcome::Err(e),
            None => Outcome::Ok(
                self.state
                    .query_results
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_default(),
            ),
        };
        async move { result }
    }

    fn execute(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let result = match self.record(sql, params) {
            Some(e) => Outcome::Err(e),
            None => Outcome::Ok(
                self.state
                    .execute_results
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or(1),
            ),
        };
        async move { result }
    }

    fn last_insert_id(
        &self,
        _cx: &Cx,
        sequence: Option<&str>,
    ) -> impl Future<Output = Outcome<Value, Error>> + Send {
        self.state
            .id_requests
            .lock()
            .unwrap()
            .push(sequence.map(str::to_string));
        let id = self.state.next_id.lock().unwrap().take().unwrap_or(Value::Null);
        async move { Outcome::Ok(id) }
    }

    fn begin(&self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        self.log_transaction("begin");
        let slow = self.state.slow_begin.swap(false, Ordering::SeqCst);
        async move {
            if slow {
                YieldOnce(false).await;
            }
            Outcome::Ok(())
        }
    }

    fn commit(&self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        self.log_transaction("commit");
        async { Outcome::Ok(()) }
    }

    fn rollback(&self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        self.log_transaction("rollback");
        async { Outcome::Ok(()) }
    }
}

impl SchemaIntrospector for MockConnection {
    fn describe_columns(
        &self,
        _cx: &Cx,
        table: &str,
    ) -> impl Future<Output = Outcome<Vec<RawColumn>, Error>> + Send {
        self.state.describe_calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.state.schemas.lock().unwrap().get(table) {
            Some(columns) => Outcome::Ok(columns.clone()),
            None => Outcome::Err(Error::database(format!("no such table: {table}"))),
        };
        async move { result }
    }
}

/// A session over `conn` with its own schema cache.
pub fn session(conn: &MockConnection) -> Session<MockConnection> {
    Session::new(conn.clone()).with_cache(Arc::new(TableSchemaCache::new()))
}

pub fn session_with(conn: &MockConnection, config: SessionConfig) -> Session<MockConnection> {
    Session::with_config(conn.clone(), config).with_cache(Arc::new(TableSchemaCache::new()))
}

pub struct Order;

impl Model for Order {
    const CLASS_NAME: &'static str = "Order";
}

pub fn order_columns() -> Vec<RawColumn> {
    vec![
        RawColumn::new("id", "integer")
            .primary_key()
            .default_expr("nextval('orders_id_seq'::regclass)"),
        RawColumn::new("status", "character varying(20)")
            .default_expr("'open'::character varying"),
        RawColumn::new("total", "numeric(10,2)").scale(2),
        RawColumn::new("customer_id", "int4"),
        RawColumn::new("paid", "boolean").default_expr("false"),
    ]
}

/// A Postgres connection that knows the `orders` table.
pub fn orders_connection() -> MockConnection {
    MockConnection::new(Dialect::Postgres).with_table("orders", order_columns())
}

pub fn order_row(id: i64, status: &str) -> Row {
    Row::from_pairs([
        ("id", Value::Int(id as i32)),
        ("status", Value::from(status)),
        ("total", Value::from("19.90")),
        ("customer_id", Value::Int(7)),
        ("paid", Value::from("f")),
    ])
}

pub fn run<F: Future>(future: F) -> F::Output {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    rt.block_on(future)
}

pub fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(value) => value,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

pub fn expect_err<T>(outcome: Outcome<T, Error>) -> Error {
    match outcome {
        Outcome::Err(e) => e,
        Outcome::Ok(_) => panic!("expected an error"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}
