use crate::errors::MigratorResult;
use crate::store::{HistoryCollection, WriteConcern};

/// A database handle the migrator can run against.
///
/// The same handle is passed to every migration body, so it is usually a
/// thin wrapper around the client of the target database. The migrator only
/// needs it to open the history collection.
pub trait MigrationDatabase: Send + Sync {
    /// Opens the history collection `name`, applying `write_concern` to
    /// every mutation made through the returned handle.
    ///
    /// Opening a collection that does not exist yet is not an error.
    fn history(&self, name: &str, write_concern: WriteConcern) -> MigratorResult<HistoryCollection>;
}
