use migrator::errors::{ErrorKind, MigratorError, MigratorResult};
use migrator::migration::Migration;
use migrator::migrator::Migrator;
use migrator::store::memory::{InMemoryDatabase, InMemoryHistory};
use migrator::store::{
    HistoryCollection, HistoryCollectionProvider, MigrationDatabase, MigrationRecord,
    RecordFilter, WriteConcern,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub const HISTORY: &str = "migrations";

/// Runs a test against a fresh context. `after` always runs, even when the
/// test body returns an error or panics, so the database is closed before
/// the failure surfaces.
pub fn run_test<B, T, A>(before: B, test: T, after: A)
where
    B: Fn() -> MigratorResult<TestContext>,
    T: Fn(TestContext) -> MigratorResult<()>,
    A: Fn(TestContext) -> MigratorResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let test_result = panic::catch_unwind(AssertUnwindSafe(|| test(ctx.clone())));
    let after_result = after(ctx);

    match test_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic_err) => {
            log::error!("Test panicked, context cleaned up before unwinding");
            panic::resume_unwind(panic_err)
        }
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    db: TestDatabase,
    migrator: Migrator<TestDatabase>,
}

impl TestContext {
    pub fn new(db: TestDatabase, migrator: Migrator<TestDatabase>) -> Self {
        Self { db, migrator }
    }

    pub fn db(&self) -> &TestDatabase {
        &self.db
    }

    pub fn migrator(&self) -> &Migrator<TestDatabase> {
        &self.migrator
    }

    /// Runs a textual command, e.g. `ctx.run(&["up", "2"])`.
    pub fn run(&self, args: &[&str]) -> MigratorResult<(i64, i64)> {
        let change = self.migrator.run(&self.db, args)?;
        Ok((change.old_version, change.new_version))
    }
}

/// A context whose migrator knows tracked migrations for `versions`.
pub fn create_test_context(versions: &[i64]) -> MigratorResult<TestContext> {
    let migrator = Migrator::builder()
        .add_migrations(tracked_migrations(versions))
        .build()?;
    Ok(TestContext::new(TestDatabase::new(), migrator))
}

pub fn cleanup(ctx: TestContext) -> MigratorResult<()> {
    ctx.db().store().close();
    Ok(())
}

/// A migration whose bodies create and drop the collection `table_<version>`
/// and append `apply:<version>` / `revert:<version>` to the journal.
pub fn tracked_migration(version: i64) -> Migration<TestDatabase> {
    Migration::new(
        version,
        &format!("migration_{}", version),
        move |db: &TestDatabase| db.apply_step(version),
        move |db: &TestDatabase| db.revert_step(version),
    )
}

pub fn tracked_migrations(versions: &[i64]) -> Vec<Migration<TestDatabase>> {
    versions.iter().map(|v| tracked_migration(*v)).collect()
}

pub fn table_name(version: i64) -> String {
    format!("table_{}", version)
}

/// Failures a [`TestDatabase`] injects on demand.
#[derive(Default)]
struct Faults {
    apply: HashSet<i64>,
    revert: HashSet<i64>,
    insert: HashSet<i64>,
    delete: HashSet<i64>,
    drop: bool,
}

/// An [`InMemoryDatabase`] wrapped with a journal of executed migration
/// bodies, a log of requested write concerns and fault injection for both
/// bodies and history writes.
#[derive(Clone)]
pub struct TestDatabase {
    inner: Arc<TestDatabaseInner>,
}

struct TestDatabaseInner {
    store: InMemoryDatabase,
    journal: Mutex<Vec<String>>,
    write_concerns: Mutex<Vec<WriteConcern>>,
    faults: Mutex<Faults>,
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDatabase {
    pub fn new() -> Self {
        TestDatabase {
            inner: Arc::new(TestDatabaseInner {
                store: InMemoryDatabase::new(),
                journal: Mutex::new(Vec::new()),
                write_concerns: Mutex::new(Vec::new()),
                faults: Mutex::new(Faults::default()),
            }),
        }
    }

    pub fn store(&self) -> &InMemoryDatabase {
        &self.inner.store
    }

    pub fn journal(&self) -> Vec<String> {
        self.inner.journal.lock().clone()
    }

    pub fn clear_journal(&self) {
        self.inner.journal.lock().clear();
    }

    pub fn write_concerns(&self) -> Vec<WriteConcern> {
        self.inner.write_concerns.lock().clone()
    }

    /// Versions persisted in `collection`, ascending.
    pub fn persisted_versions(&self, collection: &str) -> MigratorResult<Vec<i64>> {
        let history = self.store().history(collection, WriteConcern::Majority)?;
        Ok(history.history()?.iter().map(|r| r.version).collect())
    }

    /// Writes history records directly, bypassing the migrator.
    pub fn seed_history(&self, collection: &str, versions: &[i64]) -> MigratorResult<()> {
        let history = self.store().history(collection, WriteConcern::Majority)?;
        history.insert_many(
            versions
                .iter()
                .map(|v| MigrationRecord::new(*v, &format!("migration_{}", v)))
                .collect(),
        )
    }

    pub fn fail_apply(&self, version: i64) {
        self.inner.faults.lock().apply.insert(version);
    }

    pub fn fail_revert(&self, version: i64) {
        self.inner.faults.lock().revert.insert(version);
    }

    pub fn fail_insert(&self, version: i64) {
        self.inner.faults.lock().insert.insert(version);
    }

    pub fn fail_delete(&self, version: i64) {
        self.inner.faults.lock().delete.insert(version);
    }

    pub fn fail_drop(&self) {
        self.inner.faults.lock().drop = true;
    }

    pub fn clear_faults(&self) {
        *self.inner.faults.lock() = Faults::default();
    }

    fn apply_step(&self, version: i64) -> MigratorResult<()> {
        if self.inner.faults.lock().apply.contains(&version) {
            return Err(injected(&format!("apply of {}", version), ErrorKind::MigrationFailed));
        }
        self.store().create_collection(&table_name(version))?;
        self.inner.journal.lock().push(format!("apply:{}", version));
        Ok(())
    }

    fn revert_step(&self, version: i64) -> MigratorResult<()> {
        if self.inner.faults.lock().revert.contains(&version) {
            return Err(injected(&format!("revert of {}", version), ErrorKind::MigrationFailed));
        }
        self.store().drop_collection(&table_name(version))?;
        self.inner.journal.lock().push(format!("revert:{}", version));
        Ok(())
    }
}

impl MigrationDatabase for TestDatabase {
    fn history(&self, name: &str, write_concern: WriteConcern) -> MigratorResult<HistoryCollection> {
        self.inner.write_concerns.lock().push(write_concern);
        Ok(HistoryCollection::new(FaultyHistory {
            inner: InMemoryHistory::new(name, write_concern, self.store().clone()),
            db: self.clone(),
        }))
    }
}

/// History provider that fails history writes selected through
/// [`TestDatabase`].
struct FaultyHistory {
    inner: InMemoryHistory,
    db: TestDatabase,
}

impl FaultyHistory {
    fn check(&self, select: impl Fn(&Faults) -> bool, operation: &str) -> MigratorResult<()> {
        if select(&self.db.inner.faults.lock()) {
            return Err(injected(operation, ErrorKind::StoreError));
        }
        Ok(())
    }
}

impl HistoryCollectionProvider for FaultyHistory {
    fn find_ascending(&self, filter: &RecordFilter) -> MigratorResult<Vec<MigrationRecord>> {
        self.inner.find_ascending(filter)
    }

    fn find_one_descending(&self, filter: &RecordFilter) -> MigratorResult<Option<MigrationRecord>> {
        self.inner.find_one_descending(filter)
    }

    fn insert_one(&self, record: MigrationRecord) -> MigratorResult<()> {
        let version = record.version;
        self.check(|f| f.insert.contains(&version), &format!("insert of {}", version))?;
        self.inner.insert_one(record)
    }

    fn insert_many(&self, records: Vec<MigrationRecord>) -> MigratorResult<()> {
        for record in &records {
            let version = record.version;
            self.check(|f| f.insert.contains(&version), &format!("insert of {}", version))?;
        }
        self.inner.insert_many(records)
    }

    fn delete_one(&self, version: i64) -> MigratorResult<()> {
        self.check(|f| f.delete.contains(&version), &format!("delete of {}", version))?;
        self.inner.delete_one(version)
    }

    fn drop_collection(&self) -> MigratorResult<()> {
        self.check(|f| f.drop, "drop")?;
        self.inner.drop_collection()
    }

    fn write_concern(&self) -> WriteConcern {
        self.inner.write_concern()
    }
}

fn injected(operation: &str, kind: ErrorKind) -> MigratorError {
    log::debug!("Injecting failure into {}", operation);
    MigratorError::new(&format!("Injected failure: {}", operation), kind)
}
