//! Configuration management for the migrator.

use crate::common::{AdvisoryLock, DEFAULT_COLLECTION_NAME, LOCK_RESOURCE_PREFIX};
use crate::errors::{ErrorKind, MigratorError, MigratorResult};
use crate::store::WriteConcern;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Public interface for migrator configuration.
///
/// Settings can only change before the configuration is handed to a
/// [`Migrator`](crate::migrator::Migrator); afterwards every setter fails.
///
/// # Examples
///
/// ```rust
/// use migrator::migrator_config::MigratorConfig;
/// use migrator::store::WriteConcern;
///
/// let config = MigratorConfig::new();
/// assert_eq!(config.collection_name(), "migrations");
/// assert_eq!(config.write_concern(), WriteConcern::Majority);
/// ```
#[derive(Clone)]
pub struct MigratorConfig {
    /// The pointer to implementation. Uses Arc for cheap cloning and thread safety.
    inner: Arc<MigratorConfigInner>,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MigratorConfig {
    /// Creates a new configuration instance with default values.
    pub fn new() -> Self {
        MigratorConfig {
            inner: Arc::new(MigratorConfigInner::new()),
        }
    }

    /// Name of the history collection.
    pub fn collection_name(&self) -> String {
        self.inner.collection_name.read().clone()
    }

    /// Sets the name of the history collection.
    ///
    /// # Errors
    ///
    /// Returns error if already initialized or if the name is empty.
    pub fn set_collection_name(&self, name: &str) -> MigratorResult<()> {
        self.inner.check_not_initialized("Collection name")?;
        if name.trim().is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(MigratorError::new(
                "Collection name cannot be empty",
                ErrorKind::InvalidConfiguration,
            ));
        }
        *self.inner.collection_name.write() = name.to_string();
        Ok(())
    }

    /// Acknowledgement level for history mutations.
    pub fn write_concern(&self) -> WriteConcern {
        *self.inner.write_concern.read()
    }

    /// Sets the acknowledgement level for history mutations.
    ///
    /// # Errors
    ///
    /// Returns error if already initialized.
    pub fn set_write_concern(&self, write_concern: WriteConcern) -> MigratorResult<()> {
        self.inner.check_not_initialized("Write concern")?;
        *self.inner.write_concern.write() = write_concern;
        Ok(())
    }

    /// The advisory lock guarding mutating commands, if any.
    pub fn advisory_lock(&self) -> Option<Arc<dyn AdvisoryLock>> {
        self.inner.advisory_lock.read().clone()
    }

    /// Sets the advisory lock guarding mutating commands.
    ///
    /// # Errors
    ///
    /// Returns error if already initialized.
    pub fn set_advisory_lock(&self, lock: Arc<dyn AdvisoryLock>) -> MigratorResult<()> {
        self.inner.check_not_initialized("Advisory lock")?;
        *self.inner.advisory_lock.write() = Some(lock);
        Ok(())
    }

    /// Resource name used with the advisory lock.
    pub fn lock_resource(&self) -> String {
        format!("{}:{}", LOCK_RESOURCE_PREFIX, self.collection_name())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Relaxed)
    }

    /// Freezes the configuration. Called when a migrator takes ownership.
    pub(crate) fn initialize(&self) {
        self.inner.initialized.store(true, Ordering::Relaxed);
    }
}

/// Private implementation of migrator configuration.
struct MigratorConfigInner {
    initialized: AtomicBool,
    collection_name: RwLock<String>,
    write_concern: RwLock<WriteConcern>,
    advisory_lock: RwLock<Option<Arc<dyn AdvisoryLock>>>,
}

impl MigratorConfigInner {
    fn new() -> Self {
        MigratorConfigInner {
            initialized: AtomicBool::from(false),
            collection_name: RwLock::new(DEFAULT_COLLECTION_NAME.to_string()),
            write_concern: RwLock::new(WriteConcern::default()),
            advisory_lock: RwLock::new(None),
        }
    }

    fn check_not_initialized(&self, setting: &str) -> MigratorResult<()> {
        if self.initialized.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after initialization", setting);
            return Err(MigratorError::new(
                &format!("{} cannot be changed after initialization", setting),
                ErrorKind::InvalidConfiguration,
            ));
        }
        Ok(())
    }
}
