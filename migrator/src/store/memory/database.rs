use crate::errors::{ErrorKind, MigratorError, MigratorResult};
use crate::store::memory::InMemoryHistory;
use crate::store::{HistoryCollection, MigrationDatabase, MigrationRecord, WriteConcern};
use crossbeam_skiplist::SkipMap;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory document database.
///
/// # Purpose
/// `InMemoryDatabase` keeps migration histories in concurrent skip lists
/// keyed by version, so history reads come back ordered without sorting.
/// Besides histories it tracks a set of plain collection names, which
/// gives migration bodies real schema state to create and drop.
///
/// # Characteristics
/// - **Thread-Safe**: clones share the same state
/// - **Ordered**: history records iterate in ascending version order
/// - **Closable**: once closed every operation fails with a store error,
///   which makes it useful for exercising I/O failure paths
///
/// # Usage
/// ```
/// use migrator::store::memory::InMemoryDatabase;
///
/// let db = InMemoryDatabase::new();
/// db.create_collection("users").unwrap();
/// assert!(db.has_collection("users"));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    inner: Arc<InMemoryDatabaseInner>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        InMemoryDatabase {
            inner: Arc::new(InMemoryDatabaseInner::default()),
        }
    }

    /// Creates a plain collection. Creating an existing collection is a no-op.
    pub fn create_collection(&self, name: &str) -> MigratorResult<()> {
        self.inner.check_opened()?;
        self.inner.collections.insert(name.to_string());
        Ok(())
    }

    /// Drops a plain or history collection. Returns `true` if it existed.
    pub fn drop_collection(&self, name: &str) -> MigratorResult<bool> {
        self.inner.check_opened()?;
        let plain = self.inner.collections.remove(name).is_some();
        let history = self.inner.histories.remove(name).is_some();
        Ok(plain || history)
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.inner.collections.contains(name) || self.inner.histories.contains_key(name)
    }

    /// Names of all collections, plain and history, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .collections
            .iter()
            .map(|name| name.key().clone())
            .chain(self.inner.histories.iter().map(|entry| entry.key().clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Closes the database. Every later operation fails.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Relaxed);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Relaxed)
    }

    pub(crate) fn check_opened(&self) -> MigratorResult<()> {
        self.inner.check_opened()
    }

    pub(crate) fn history_map(&self, name: &str) -> Option<Arc<SkipMap<i64, MigrationRecord>>> {
        self.inner.histories.get(name).map(|entry| entry.value().clone())
    }

    pub(crate) fn history_map_or_create(&self, name: &str) -> Arc<SkipMap<i64, MigrationRecord>> {
        self.inner
            .histories
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(SkipMap::new()))
            .value()
            .clone()
    }

    pub(crate) fn remove_history(&self, name: &str) -> bool {
        self.inner.histories.remove(name).is_some()
    }
}

impl MigrationDatabase for InMemoryDatabase {
    fn history(&self, name: &str, write_concern: WriteConcern) -> MigratorResult<HistoryCollection> {
        self.check_opened()?;
        Ok(HistoryCollection::new(InMemoryHistory::new(
            name,
            write_concern,
            self.clone(),
        )))
    }
}

#[derive(Default)]
struct InMemoryDatabaseInner {
    histories: DashMap<String, Arc<SkipMap<i64, MigrationRecord>>>,
    collections: DashSet<String>,
    closed: AtomicBool,
}

impl InMemoryDatabaseInner {
    fn check_opened(&self) -> MigratorResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            log::error!("In-memory database is closed");
            return Err(MigratorError::new(
                "In-memory database is closed",
                ErrorKind::StoreError,
            ));
        }
        Ok(())
    }
}
