use crate::errors::{ErrorKind, MigratorError, MigratorResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Mutual exclusion between migrator runs against the same database.
///
/// The command engine acquires a lease before it reads the history and
/// keeps it until the last persistence write of the command. The lease is
/// released when the returned [`LockLease`] is dropped.
///
/// Implementations decide the scope of the exclusion. [`LockRegistry`]
/// only excludes runs inside one process; excluding runs across a fleet
/// needs an implementation backed by the database or an external service.
pub trait AdvisoryLock: Send + Sync {
    /// Tries to acquire the lock for `resource` without blocking.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::LockUnavailable` if another holder owns the lock.
    fn acquire(&self, resource: &str) -> MigratorResult<LockLease>;
}

/// A held advisory lock. Dropping the lease releases the lock.
pub struct LockLease {
    resource: String,
    holder: String,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockLease {
    /// Creates a lease which runs `release` exactly once when dropped.
    pub fn new<F>(resource: &str, holder: &str, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        LockLease {
            resource: resource.to_string(),
            holder: holder.to_string(),
            release: Some(Box::new(release)),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }
}

impl Debug for LockLease {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockLease")
            .field("resource", &self.resource)
            .field("holder", &self.holder)
            .finish()
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            log::debug!("Releasing lock on {} held by {}", self.resource, self.holder);
            release();
        }
    }
}

/// In-process registry of named advisory locks.
///
/// Each resource has at most one holder, identified by a random id handed
/// out at acquisition. A second `acquire` on a held resource fails
/// immediately instead of waiting, so a competing migrator run reports the
/// conflict rather than queueing behind it.
///
/// Clones share the same registry.
///
/// # Examples
///
/// ```
/// use migrator::common::{AdvisoryLock, LockRegistry};
///
/// let registry = LockRegistry::new();
/// let lease = registry.acquire("migrations").unwrap();
/// assert!(registry.is_locked("migrations"));
/// assert!(registry.acquire("migrations").is_err());
///
/// drop(lease);
/// assert!(!registry.is_locked("migrations"));
/// ```
#[derive(Clone)]
pub struct LockRegistry {
    holders: Arc<Mutex<HashMap<String, String>>>,
}

impl LockRegistry {
    /// Creates a new empty lock registry.
    pub fn new() -> Self {
        LockRegistry {
            holders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns `true` if `resource` currently has a holder.
    pub fn is_locked(&self, resource: &str) -> bool {
        self.holders.lock().contains_key(resource)
    }

    /// Returns the holder id of `resource`, if any.
    pub fn holder(&self, resource: &str) -> Option<String> {
        self.holders.lock().get(resource).cloned()
    }

    /// Returns the number of resources currently locked.
    pub fn lock_count(&self) -> usize {
        self.holders.lock().len()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisoryLock for LockRegistry {
    fn acquire(&self, resource: &str) -> MigratorResult<LockLease> {
        let holder = Uuid::new_v4().to_string();
        {
            let mut holders = self.holders.lock();
            if let Some(current) = holders.get(resource) {
                log::warn!("Lock on {} is already held by {}", resource, current);
                return Err(MigratorError::of_kind(ErrorKind::LockUnavailable {
                    resource: resource.to_string(),
                    holder: current.clone(),
                }));
            }
            holders.insert(resource.to_string(), holder.clone());
        }

        log::debug!("Acquired lock on {} as {}", resource, holder);
        let holders = self.holders.clone();
        let name = resource.to_string();
        let owner = holder.clone();
        Ok(LockLease::new(resource, &holder, move || {
            let mut holders = holders.lock();
            // only release our own hold
            if holders.get(&name) == Some(&owner) {
                holders.remove(&name);
            }
        }))
    }
}
