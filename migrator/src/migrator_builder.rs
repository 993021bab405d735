use crate::common::AdvisoryLock;
use crate::errors::{MigratorError, MigratorResult};
use crate::migration::{Migration, MigrationSet};
use crate::migrator::Migrator;
use crate::migrator_config::MigratorConfig;
use crate::store::{MigrationDatabase, WriteConcern};
use std::sync::Arc;

/// Builder for creating and configuring a [`Migrator`].
///
/// `MigratorBuilder` captures the first configuration error and returns it
/// from [`build`](MigratorBuilder::build), so a chain of calls never has to
/// be interrupted to check results.
///
/// # Examples
///
/// ```rust
/// use migrator::migration::Migration;
/// use migrator::migrator::Migrator;
/// use migrator::store::memory::InMemoryDatabase;
/// use migrator::store::WriteConcern;
///
/// let migrator = Migrator::<InMemoryDatabase>::builder()
///     .collection_name("schema_history")
///     .write_concern(WriteConcern::Majority)
///     .add_migration(Migration::noop(1, "first"))
///     .build()
///     .unwrap();
///
/// assert_eq!(migrator.migrations().len(), 2);
/// ```
pub struct MigratorBuilder<D> {
    error: Option<MigratorError>,
    config: MigratorConfig,
    migrations: Vec<Migration<D>>,
}

impl<D> Default for MigratorBuilder<D> {
    fn default() -> Self {
        MigratorBuilder {
            error: None,
            config: MigratorConfig::new(),
            migrations: Vec::new(),
        }
    }
}

impl<D: MigrationDatabase + 'static> MigratorBuilder<D> {
    /// Creates a new builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name of the history collection. Defaults to `migrations`.
    pub fn collection_name(mut self, name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_collection_name(name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the acknowledgement level for history writes. Defaults to majority.
    pub fn write_concern(mut self, write_concern: WriteConcern) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_write_concern(write_concern) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Guards every mutating command with `lock`.
    pub fn advisory_lock<L: AdvisoryLock + 'static>(mut self, lock: L) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_advisory_lock(Arc::new(lock)) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Adds a migration. Order does not matter.
    pub fn add_migration(mut self, migration: Migration<D>) -> Self {
        self.migrations.push(migration);
        self
    }

    /// Adds several migrations. Order does not matter.
    pub fn add_migrations<I>(mut self, migrations: I) -> Self
    where
        I: IntoIterator<Item = Migration<D>>,
    {
        self.migrations.extend(migrations);
        self
    }

    /// Validates the migrations and creates the migrator.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error, or a registry error for
    /// duplicate or reserved migration versions.
    pub fn build(self) -> MigratorResult<Migrator<D>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let migrations = MigrationSet::new(self.migrations)?;
        Ok(Migrator::with_config(self.config, migrations))
    }
}
