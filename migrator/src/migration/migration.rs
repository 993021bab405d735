use crate::common::{ZERO_MIGRATION_NAME, ZERO_VERSION};
use crate::errors::MigratorResult;
use crate::store::MigrationRecord;
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Body of a migration: receives the database handle, reports success or failure.
pub type MigrationFn<D> = Arc<dyn Fn(&D) -> MigratorResult<()> + Send + Sync>;

/// A versioned, reversible unit of schema change.
///
/// # Ordering
/// Migrations compare and order by `version` alone. The name is
/// descriptive and never takes part in comparisons.
///
/// # Stored migrations
/// A migration rebuilt from a [`MigrationRecord`] is marked *stored* and has
/// no-op bodies: the record says it was applied, but the code that did so
/// is not part of the record.
///
/// # Examples
///
/// ```rust
/// use migrator::migration::Migration;
/// use migrator::store::memory::InMemoryDatabase;
///
/// let migration = Migration::new(
///     1,
///     "create_users",
///     |db: &InMemoryDatabase| db.create_collection("users"),
///     |db: &InMemoryDatabase| db.drop_collection("users").map(|_| ()),
/// );
///
/// let db = InMemoryDatabase::new();
/// migration.apply(&db).unwrap();
/// assert!(db.has_collection("users"));
/// ```
pub struct Migration<D> {
    version: i64,
    name: String,
    apply: MigrationFn<D>,
    revert: MigrationFn<D>,
    stored: bool,
}

impl<D: 'static> Migration<D> {
    /// Creates a migration from its apply and revert bodies.
    pub fn new<A, R>(version: i64, name: &str, apply: A, revert: R) -> Self
    where
        A: Fn(&D) -> MigratorResult<()> + Send + Sync + 'static,
        R: Fn(&D) -> MigratorResult<()> + Send + Sync + 'static,
    {
        Migration {
            version,
            name: name.to_string(),
            apply: Arc::new(apply),
            revert: Arc::new(revert),
            stored: false,
        }
    }

    /// Creates a migration whose bodies do nothing.
    pub fn noop(version: i64, name: &str) -> Self {
        Migration::new(version, name, |_: &D| Ok(()), |_: &D| Ok(()))
    }

    /// The floor of every known set: version 0, named "-", no-op bodies.
    pub fn zero() -> Self {
        Migration::noop(ZERO_VERSION, ZERO_MIGRATION_NAME)
    }

    /// Rebuilds a stored migration from a persisted record.
    pub fn from_record(record: &MigrationRecord) -> Self {
        let mut migration = Migration::noop(record.version, &record.name);
        migration.stored = true;
        migration
    }
}

impl<D> Migration<D> {
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` when this migration came from the persisted history.
    pub fn is_stored(&self) -> bool {
        self.stored
    }

    pub fn is_zero(&self) -> bool {
        self.version == ZERO_VERSION
    }

    pub(crate) fn mark_stored(&mut self) {
        self.stored = true;
    }

    /// Runs the forward body.
    pub fn apply(&self, db: &D) -> MigratorResult<()> {
        (self.apply)(db)
    }

    /// Runs the backward body.
    pub fn revert(&self, db: &D) -> MigratorResult<()> {
        (self.revert)(db)
    }

    /// The persisted form of this migration.
    pub fn record(&self) -> MigrationRecord {
        MigrationRecord::new(self.version, &self.name)
    }
}

// manual impl: a derive would demand `D: Clone`
impl<D> Clone for Migration<D> {
    fn clone(&self) -> Self {
        Migration {
            version: self.version,
            name: self.name.clone(),
            apply: self.apply.clone(),
            revert: self.revert.clone(),
            stored: self.stored,
        }
    }
}

impl<D> Debug for Migration<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("name", &self.name)
            .field("stored", &self.stored)
            .finish()
    }
}

impl<D> PartialEq for Migration<D> {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl<D> Eq for Migration<D> {}

impl<D> PartialOrd for Migration<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<D> Ord for Migration<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}
