use crate::common::ZERO_VERSION;
use crate::errors::{ErrorKind, MigratorError, MigratorResult};
use crate::migration::Migration;
use crate::store::MigrationRecord;
use std::ops::Deref;

/// The normalized set of migrations known to the running code.
///
/// Built from the caller's migrations plus the zero migration, sorted by
/// version. The caller's collection is copied, never modified.
///
/// # Invariants
/// - the first element is the zero migration
/// - versions are strictly ascending
///
/// # Examples
///
/// ```rust
/// use migrator::migration::{Migration, MigrationSet};
///
/// let set = MigrationSet::<()>::new(vec![
///     Migration::noop(2, "b"),
///     Migration::noop(1, "a"),
/// ]).unwrap();
///
/// let versions: Vec<i64> = set.iter().map(|m| m.version()).collect();
/// assert_eq!(versions, vec![0, 1, 2]);
/// ```
pub struct MigrationSet<D> {
    migrations: Vec<Migration<D>>,
}

impl<D: 'static> MigrationSet<D> {
    /// Normalizes `migrations` into a sorted set anchored at the zero migration.
    ///
    /// # Errors
    ///
    /// - `ErrorKind::InvalidMigrationVersion` if a migration declares a
    ///   version at or below zero, which is reserved for the floor.
    /// - `ErrorKind::DuplicateMigrationVersion` if two migrations share a version.
    pub fn new<I>(migrations: I) -> MigratorResult<Self>
    where
        I: IntoIterator<Item = Migration<D>>,
    {
        let mut all: Vec<Migration<D>> = Vec::new();
        for migration in migrations {
            if migration.version() <= ZERO_VERSION {
                log::error!(
                    "Migration {} declares reserved version {}",
                    migration.name(),
                    migration.version()
                );
                return Err(MigratorError::of_kind(ErrorKind::InvalidMigrationVersion {
                    version: migration.version(),
                }));
            }
            all.push(migration);
        }

        all.push(Migration::zero());
        all.sort();

        if let Some(pair) = all.windows(2).find(|pair| pair[0] == pair[1]) {
            let version = pair[0].version();
            log::error!("Duplicate migration version {}", version);
            return Err(MigratorError::of_kind(
                ErrorKind::DuplicateMigrationVersion { version },
            ));
        }

        Ok(MigrationSet { migrations: all })
    }

    /// Position of `version` in the set.
    pub fn position(&self, version: i64) -> Option<usize> {
        self.migrations
            .binary_search_by_key(&version, |m| m.version())
            .ok()
    }

    pub fn get(&self, version: i64) -> Option<&Migration<D>> {
        self.position(version).map(|index| &self.migrations[index])
    }

    /// The highest known version.
    pub fn max_version(&self) -> i64 {
        self.migrations
            .last()
            .map(|m| m.version())
            .unwrap_or(ZERO_VERSION)
    }

    /// Records of every migration up to and including `version`, or `None`
    /// when `version` is not in the set.
    pub fn records_through(&self, version: i64) -> Option<Vec<MigrationRecord>> {
        self.position(version).map(|index| {
            self.migrations[..=index]
                .iter()
                .map(|m| m.record())
                .collect()
        })
    }

    pub fn as_slice(&self) -> &[Migration<D>] {
        &self.migrations
    }
}

impl<D> Clone for MigrationSet<D> {
    fn clone(&self) -> Self {
        MigrationSet {
            migrations: self.migrations.clone(),
        }
    }
}

impl<D> Deref for MigrationSet<D> {
    type Target = [Migration<D>];

    fn deref(&self) -> &Self::Target {
        &self.migrations
    }
}
