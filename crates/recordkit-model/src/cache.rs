//! Process-wide table metadata cache.
//!
//! One [`Table`] per model type, loaded lazily on first access and kept for
//! the life of the process. Concurrent first loads may both introspect the
//! backend; only one result is published and every caller gets that one.
//! A table is published only once it is completely built.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use asupersync::{Cx, Outcome};
use recordkit_core::{Error, Inflector, SchemaIntrospector};

use crate::model::Model;
use crate::table::{ConnectionInfo, Table};

/// Registry of loaded tables keyed by model type.
#[derive(Debug, Default)]
pub struct TableSchemaCache {
    tables: RwLock<HashMap<TypeId, Arc<Table>>>,
}

impl TableSchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached table for `M`, if it has been loaded.
    pub fn get<M: Model>(&self) -> Option<Arc<Table>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<M>())
            .cloned()
    }

    /// Load `M`'s table, introspecting the backend on first use.
    ///
    /// Introspection failures (including a table that does not exist) are
    /// returned unchanged and nothing is cached.
    #[tracing::instrument(
        level = "debug",
        skip(self, cx, introspector, inflector),
        fields(model = M::CLASS_NAME)
    )]
    pub async fn load<M: Model, I: SchemaIntrospector>(
        &self,
        cx: &Cx,
        introspector: &I,
        connection: ConnectionInfo,
        inflector: &dyn Inflector,
    ) -> Outcome<Arc<Table>, Error> {
        if let Some(table) = self.get::<M>() {
            return Outcome::Ok(table);
        }

        let physical = Table::physical_name::<M>(inflector);
        let qualified = match M::DATABASE {
            Some(db) => format!("{db}.{physical}"),
            None => physical,
        };
        tracing::info!(
            model = M::CLASS_NAME,
            table = %qualified,
            "Loading table schema"
        );

        let raw_columns = match introspector.describe_columns(cx, &qualified).await {
            Outcome::Ok(columns) => columns,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        let table = match Table::build::<M>(connection, &raw_columns, inflector) {
            Ok(table) => table,
            Err(e) => return Outcome::Err(e),
        };

        Outcome::Ok(self.publish(table))
    }

    /// Publish a fully built table, keeping an existing entry if one won the race.
    pub fn publish(&self, table: Table) -> Arc<Table> {
        let type_id = table.type_id();
        let mut tables = self
            .tables
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = tables.get(&type_id) {
            tracing::debug!(
                model = table.class_name(),
                "Table already published by a concurrent load; discarding duplicate"
            );
            return Arc::clone(existing);
        }
        let table = Arc::new(table);
        tables.insert(type_id, Arc::clone(&table));
        table
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The process-wide cache.
pub fn schema_cache() -> &'static TableSchemaCache {
    static CACHE: OnceLock<TableSchemaCache> = OnceLock::new();
    CACHE.get_or_init(TableSchemaCache::new)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::manual_async_fn)]

    use super::*;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use asupersync::runtime::RuntimeBuilder;
    use recordkit_core::{DefaultInflector, Dialect, RawColumn};

    use crate::table::tests::{Order, order_columns};

    struct FakeIntrospector {
        calls: AtomicUsize,
        missing: bool,
    }

    impl FakeIntrospector {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                missing: false,
            }
        }
    }

    impl SchemaIntrospector for FakeIntrospector {
        fn describe_columns(
            &self,
            _cx: &Cx,
            table: &str,
        ) -> impl Future<Output = Outcome<Vec<RawColumn>, Error>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = if self.missing {
                Outcome::Err(Error::database(format!("relation \"{table}\" does not exist")))
            } else {
                Outcome::Ok(order_columns())
            };
            async move { result }
        }
    }

    fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
        match outcome {
            Outcome::Ok(v) => v,
            Outcome::Err(e) => panic!("unexpected error: {e}"),
            Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
            Outcome::Panicked(p) => panic!("panicked: {p:?}"),
        }
    }

    fn info() -> ConnectionInfo {
        ConnectionInfo::new("primary", Dialect::Postgres)
    }

    #[test]
    fn load_is_idempotent() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        let cache = TableSchemaCache::new();
        let introspector = FakeIntrospector::new();

        rt.block_on(async {
            let first = unwrap_outcome(
                cache
                    .load::<Order, _>(&cx, &introspector, info(), &DefaultInflector)
                    .await,
            );
            let second = unwrap_outcome(
                cache
                    .load::<Order, _>(&cx, &introspector, info(), &DefaultInflector)
                    .await,
            );
            assert!(Arc::ptr_eq(&first, &second));
        });
        assert_eq!(introspector.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn introspection_failure_propagates_and_caches_nothing() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        let cache = TableSchemaCache::new();
        let introspector = FakeIntrospector {
            calls: AtomicUsize::new(0),
            missing: true,
        };

        rt.block_on(async {
            let outcome = cache
                .load::<Order, _>(&cx, &introspector, info(), &DefaultInflector)
                .await;
            match outcome {
                Outcome::Err(Error::Database(e)) => assert!(e.message.contains("orders")),
                Outcome::Err(e) => panic!("expected database error, got {e}"),
                Outcome::Ok(_) => panic!("expected database error, table loaded"),
                Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
                Outcome::Panicked(p) => panic!("panicked: {p:?}"),
            }
        });
        assert!(cache.is_empty());
    }

    #[test]
    fn publish_keeps_first_winner() {
        let cache = TableSchemaCache::new();
        let build = || {
            Table::build::<Order>(info(), &order_columns(), &DefaultInflector).unwrap()
        };
        let first = cache.publish(build());
        let second = cache.publish(build());
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&cache.get::<Order>().unwrap(), &first));
    }

    #[test]
    fn concurrent_first_loads_converge() {
        let cache = Arc::new(TableSchemaCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let table =
                        Table::build::<Order>(info(), &order_columns(), &DefaultInflector)
                            .unwrap();
                    cache.publish(table)
                })
            })
            .collect();
        let tables: Vec<Arc<Table>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for table in &tables {
            assert!(Arc::ptr_eq(table, &tables[0]));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn global_cache_is_shared() {
        assert!(std::ptr::eq(schema_cache(), schema_cache()));
    }
}
