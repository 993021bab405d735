use crate::command::Command;
use crate::common::ZERO_VERSION;
use crate::errors::{ErrorKind, MigratorError, MigratorResult, VersionChange};
use crate::migration::{correlate, merge, status, Migration, MigrationSet, StatusEntry};
use crate::migrator_builder::MigratorBuilder;
use crate::migrator_config::MigratorConfig;
use crate::store::{HistoryCollection, MigrationDatabase, MigrationRecord, RecordFilter};
use std::sync::Arc;

/// Applies and reverts migrations against a database, keeping its
/// persisted version pointer in a history collection.
///
/// The current version of a database is the highest version recorded in
/// its history. An empty or missing history means the database has not
/// been initialized yet.
///
/// Every command returns the [`VersionChange`] it produced. On failure the
/// error carries the change reached so far in
/// [`MigratorError::progress`]; nothing that already ran is rolled back,
/// so re-running `up` after a transient failure applies only what is left.
///
/// # Concurrency
/// Commands run sequentially with no internal parallelism. Two migrators
/// running against one database at the same time are only excluded when
/// an [`AdvisoryLock`](crate::common::AdvisoryLock) is configured.
///
/// # Examples
///
/// ```rust
/// use migrator::migration::Migration;
/// use migrator::migrator::Migrator;
/// use migrator::store::memory::InMemoryDatabase;
///
/// let migrator = Migrator::new(vec![
///     Migration::new(
///         1,
///         "create_users",
///         |db: &InMemoryDatabase| db.create_collection("users"),
///         |db: &InMemoryDatabase| db.drop_collection("users").map(|_| ()),
///     ),
/// ]).unwrap();
///
/// let db = InMemoryDatabase::new();
/// migrator.run(&db, &["init"]).unwrap();
///
/// let change = migrator.run(&db, &["up"]).unwrap();
/// assert_eq!((change.old_version, change.new_version), (0, 1));
/// assert!(db.has_collection("users"));
/// ```
pub struct Migrator<D> {
    inner: Arc<MigratorInner<D>>,
}

impl<D> Clone for Migrator<D> {
    fn clone(&self) -> Self {
        Migrator {
            inner: self.inner.clone(),
        }
    }
}

impl<D: MigrationDatabase + 'static> Migrator<D> {
    /// Creates a migrator with the default configuration.
    ///
    /// # Errors
    ///
    /// Fails if the migrations contain duplicate or reserved versions.
    pub fn new<I>(migrations: I) -> MigratorResult<Self>
    where
        I: IntoIterator<Item = Migration<D>>,
    {
        Ok(Migrator::with_config(
            MigratorConfig::new(),
            MigrationSet::new(migrations)?,
        ))
    }

    pub fn builder() -> MigratorBuilder<D> {
        MigratorBuilder::new()
    }

    pub(crate) fn with_config(config: MigratorConfig, migrations: MigrationSet<D>) -> Self {
        config.initialize();
        Migrator {
            inner: Arc::new(MigratorInner { config, migrations }),
        }
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.inner.config
    }

    /// The known migrations, zero migration first.
    pub fn migrations(&self) -> &MigrationSet<D> {
        &self.inner.migrations
    }

    /// Parses `args` as a command and executes it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use migrator::errors::ErrorKind;
    /// use migrator::migrator::Migrator;
    /// use migrator::store::memory::InMemoryDatabase;
    ///
    /// let migrator = Migrator::<InMemoryDatabase>::new(Vec::new()).unwrap();
    /// let db = InMemoryDatabase::new();
    ///
    /// let err = migrator.run(&db, &["version"]).unwrap_err();
    /// assert_eq!(err.kind(), &ErrorKind::MigrationsNotInitialized);
    /// ```
    pub fn run<S: AsRef<str>>(&self, db: &D, args: &[S]) -> MigratorResult<VersionChange> {
        let command = Command::parse(args)?;
        self.execute(db, command)
    }

    /// Executes a typed command.
    ///
    /// Mutating commands run inside a lease of the configured advisory
    /// lock, released once the command returns.
    pub fn execute(&self, db: &D, command: Command) -> MigratorResult<VersionChange> {
        let result = self.guarded(command, || match command {
            Command::Init => self.init_history(db),
            Command::Up { target } => self.apply_pending(db, target),
            Command::Down => self.revert_current(db),
            Command::Reset => self.revert_all(db),
            Command::Version => self.read_version(db),
            Command::SetVersion { target } => self.force_version(db, target),
        });

        match &result {
            Ok(change) => log::info!("Command '{}' finished: {}", command, change),
            Err(e) => log::error!("Command '{}' failed: {}", command, e),
        }
        result
    }

    /// Records the zero migration, marking the database as initialized.
    ///
    /// # Errors
    ///
    /// `ErrorKind::MigrationsCollectionAlreadyExists` if the zero record is
    /// already present.
    pub fn init(&self, db: &D) -> MigratorResult<VersionChange> {
        self.execute(db, Command::Init)
    }

    /// Applies every pending migration up to `target`, or all of them when
    /// `target` is `None`, in ascending version order.
    ///
    /// Pending migrations below the current version (gaps in the history)
    /// are applied as well. The reported new version is the version pointer
    /// afterwards, so filling a gap never lowers it.
    pub fn up(&self, db: &D, target: Option<i64>) -> MigratorResult<VersionChange> {
        self.execute(db, Command::Up { target })
    }

    /// Reverts the current migration and removes it from the history.
    ///
    /// At version 0 there is nothing left to revert and the command is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// `ErrorKind::SomeMigrationsAreAbsent` if the current version has no
    /// code in the known set.
    pub fn down(&self, db: &D) -> MigratorResult<VersionChange> {
        self.execute(db, Command::Down)
    }

    /// Reverts every applied migration, highest first, down to version 0.
    ///
    /// The zero record is never removed.
    ///
    /// # Errors
    ///
    /// `ErrorKind::SomeMigrationsAreAbsent` if any applied version has no
    /// code. In that case nothing is reverted; the error carries the
    /// partial plan, and its progress reports the first absent version as
    /// the new version.
    pub fn reset(&self, db: &D) -> MigratorResult<VersionChange> {
        self.execute(db, Command::Reset)
    }

    /// Reports the current version without changing anything.
    pub fn version(&self, db: &D) -> MigratorResult<VersionChange> {
        self.execute(db, Command::Version)
    }

    /// Rewrites the history so it holds exactly the known migrations up to
    /// and including `target`. No apply or revert body runs.
    ///
    /// # Errors
    ///
    /// `ErrorKind::TargetVersionNotFound` if `target` is not a known version.
    pub fn set_version(&self, db: &D, target: i64) -> MigratorResult<VersionChange> {
        self.execute(db, Command::SetVersion { target })
    }

    fn init_history(&self, db: &D) -> MigratorResult<VersionChange> {
        let history = self.history(db)?;

        if history
            .find_one_descending(&RecordFilter::Version(ZERO_VERSION))?
            .is_some()
        {
            return Err(MigratorError::of_kind(
                ErrorKind::MigrationsCollectionAlreadyExists,
            ));
        }

        history.insert_one(Migration::<D>::zero().record())?;
        log::info!(
            "Initialized migration history in {}",
            self.inner.config.collection_name()
        );
        Ok(VersionChange::unchanged(ZERO_VERSION))
    }

    fn apply_pending(&self, db: &D, target: Option<i64>) -> MigratorResult<VersionChange> {
        let history = self.history(db)?;
        let applied = self.applied(&history)?;

        let old_version = current_version(&applied);
        let mut new_version = old_version;

        let plan = merge(&applied, self.inner.migrations.as_slice(), target);
        log::debug!(
            "Up plan {:?}",
            plan.iter()
                .map(|m| (m.version(), m.is_stored()))
                .collect::<Vec<_>>()
        );

        for mut migration in plan.into_iter().filter(|m| !m.is_stored()) {
            log::info!(
                "Applying migration {} ({})",
                migration.version(),
                migration.name()
            );
            migration
                .apply(db)
                .map_err(at(old_version, new_version))?;

            migration.mark_stored();
            history
                .insert_one(migration.record())
                .map_err(at(old_version, new_version))?;

            new_version = new_version.max(migration.version());
        }

        Ok(VersionChange::new(old_version, new_version))
    }

    fn revert_current(&self, db: &D) -> MigratorResult<VersionChange> {
        let history = self.history(db)?;
        let current = history.latest()?.ok_or_else(not_initialized)?;
        let old_version = current.version;

        let migrations = &self.inner.migrations;
        let index = match migrations.position(old_version) {
            Some(index) => index,
            None => {
                log::warn!("No code found for current migration {}", current);
                return Err(MigratorError::of_kind(ErrorKind::SomeMigrationsAreAbsent {
                    version: old_version,
                    plan: vec![current],
                })
                .with_progress(VersionChange::unchanged(old_version)));
            }
        };

        if index == 0 {
            log::warn!("Already at version {}, nothing to revert", old_version);
            return Ok(VersionChange::unchanged(old_version));
        }

        let migration = &migrations[index];
        log::info!(
            "Reverting migration {} ({})",
            migration.version(),
            migration.name()
        );
        migration
            .revert(db)
            .map_err(at(old_version, old_version))?;
        history
            .delete_one(migration.version())
            .map_err(at(old_version, old_version))?;

        Ok(VersionChange::new(
            old_version,
            migrations[index - 1].version(),
        ))
    }

    fn revert_all(&self, db: &D) -> MigratorResult<VersionChange> {
        let history = self.history(db)?;
        let applied = self.applied(&history)?;
        let old_version = current_version(&applied);

        let correlated = correlate(&applied, self.inner.migrations.as_slice()).map_err(|absent| {
            let version = absent.first_absent_version();
            log::warn!("Cannot reset, no code found for migration {}", version);
            MigratorError::from(absent).with_progress(VersionChange::new(old_version, version))
        })?;

        let mut new_version = old_version;
        for (index, migration) in correlated.iter().enumerate().rev() {
            if migration.is_zero() {
                continue;
            }

            log::info!(
                "Reverting migration {} ({})",
                migration.version(),
                migration.name()
            );
            migration
                .revert(db)
                .map_err(at(old_version, new_version))?;
            history
                .delete_one(migration.version())
                .map_err(at(old_version, new_version))?;

            new_version = match index {
                0 => ZERO_VERSION,
                _ => correlated[index - 1].version(),
            };
        }

        Ok(VersionChange::new(old_version, new_version))
    }

    fn read_version(&self, db: &D) -> MigratorResult<VersionChange> {
        let history = self.history(db)?;
        let current = history.latest()?.ok_or_else(not_initialized)?;
        Ok(VersionChange::unchanged(current.version))
    }

    fn force_version(&self, db: &D, target: i64) -> MigratorResult<VersionChange> {
        let history = self.history(db)?;
        let old_version = history.latest()?.ok_or_else(not_initialized)?.version;

        let records = self
            .inner
            .migrations
            .records_through(target)
            .ok_or_else(|| {
                MigratorError::of_kind(ErrorKind::TargetVersionNotFound { version: target })
                    .with_progress(VersionChange::unchanged(old_version))
            })?;

        if old_version == target {
            return Ok(VersionChange::unchanged(old_version));
        }

        log::info!("Forcing version {} over {}", target, old_version);
        history
            .drop_collection()
            .map_err(at(old_version, old_version))?;
        history
            .insert_many(records)
            .map_err(at(old_version, old_version))?;

        Ok(VersionChange::new(old_version, target))
    }

    /// Records of the migrations `up` would apply with `target`, in order.
    /// Nothing is executed.
    pub fn pending(&self, db: &D, target: Option<i64>) -> MigratorResult<Vec<MigrationRecord>> {
        let history = self.history(db)?;
        let applied = self.applied(&history)?;
        Ok(merge(&applied, self.inner.migrations.as_slice(), target)
            .iter()
            .filter(|m| !m.is_stored())
            .map(|m| m.record())
            .collect())
    }

    /// Every known or recorded version with its state.
    pub fn status(&self, db: &D) -> MigratorResult<Vec<StatusEntry>> {
        let history = self.history(db)?;
        let applied = self.applied(&history)?;
        Ok(status(&applied, self.inner.migrations.as_slice()))
    }

    fn history(&self, db: &D) -> MigratorResult<HistoryCollection> {
        let config = &self.inner.config;
        db.history(&config.collection_name(), config.write_concern())
    }

    /// Reads the history as stored migrations, lowest version first.
    fn applied(&self, history: &HistoryCollection) -> MigratorResult<Vec<Migration<D>>> {
        let records = history.history()?;
        if records.is_empty() {
            return Err(not_initialized());
        }
        Ok(records.iter().map(Migration::from_record).collect())
    }

    fn guarded<F>(&self, command: Command, run: F) -> MigratorResult<VersionChange>
    where
        F: FnOnce() -> MigratorResult<VersionChange>,
    {
        let _lease = match self.inner.config.advisory_lock() {
            Some(lock) if command.is_mutating() => {
                Some(lock.acquire(&self.inner.config.lock_resource())?)
            }
            _ => None,
        };
        run()
    }
}

struct MigratorInner<D> {
    config: MigratorConfig,
    migrations: MigrationSet<D>,
}

fn current_version<D>(applied: &[Migration<D>]) -> i64 {
    applied.last().map(|m| m.version()).unwrap_or(ZERO_VERSION)
}

fn not_initialized() -> MigratorError {
    MigratorError::of_kind(ErrorKind::MigrationsNotInitialized)
}

/// Attaches the progress reached so far to an error.
fn at(old_version: i64, new_version: i64) -> impl FnOnce(MigratorError) -> MigratorError {
    move |e| e.with_progress(VersionChange::new(old_version, new_version))
}
