use crate::errors::MigratorResult;
use crate::store::{MigrationRecord, RecordFilter, WriteConcern};
use std::ops::Deref;
use std::sync::Arc;

/// Low-level access to the collection that stores applied migrations.
///
/// # Purpose
/// Defines the contract a database adapter fulfils so the command engine
/// can read and rewrite the migration history. Mutations must be made
/// durable at the adapter's [`WriteConcern`] before returning; each write
/// is the durability boundary of one migration step.
///
/// # Missing collection
/// A collection that does not exist must read as empty. The engine treats
/// an empty history as "not initialized".
///
/// # Thread Safety
/// Implementers must be `Send + Sync`.
pub trait HistoryCollectionProvider: Send + Sync {
    /// Returns the matching records sorted by version, lowest first.
    fn find_ascending(&self, filter: &RecordFilter) -> MigratorResult<Vec<MigrationRecord>>;

    /// Returns the matching record with the highest version.
    fn find_one_descending(&self, filter: &RecordFilter) -> MigratorResult<Option<MigrationRecord>>;

    /// Inserts a single record.
    fn insert_one(&self, record: MigrationRecord) -> MigratorResult<()>;

    /// Inserts records in the given order.
    fn insert_many(&self, records: Vec<MigrationRecord>) -> MigratorResult<()>;

    /// Deletes the record with `version`. Deleting a missing record is not an error.
    fn delete_one(&self, version: i64) -> MigratorResult<()>;

    /// Drops the whole collection.
    fn drop_collection(&self) -> MigratorResult<()>;

    /// The acknowledgement level applied to mutations.
    fn write_concern(&self) -> WriteConcern;
}

/// Cheaply cloneable handle to a [`HistoryCollectionProvider`].
#[derive(Clone)]
pub struct HistoryCollection {
    inner: Arc<dyn HistoryCollectionProvider>,
}

impl HistoryCollection {
    pub fn new<T: HistoryCollectionProvider + 'static>(inner: T) -> Self {
        HistoryCollection {
            inner: Arc::new(inner),
        }
    }

    /// Reads the whole history, lowest version first.
    pub fn history(&self) -> MigratorResult<Vec<MigrationRecord>> {
        self.inner.find_ascending(&RecordFilter::All)
    }

    /// Reads the record with the highest version, if any.
    pub fn latest(&self) -> MigratorResult<Option<MigrationRecord>> {
        self.inner.find_one_descending(&RecordFilter::All)
    }
}

impl Deref for HistoryCollection {
    type Target = Arc<dyn HistoryCollectionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
