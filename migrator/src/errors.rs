use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};
use crate::store::MigrationRecord;

/// Error kinds for migrator operations.
///
/// Every failure the command engine can surface maps to exactly one kind.
/// Kinds carry the context needed to act on them (the offending version,
/// the unknown command name, the partial rollback plan) so callers can
/// match on structure instead of parsing messages.
///
/// # Examples
///
/// ```rust
/// use migrator::errors::{ErrorKind, MigratorError, MigratorResult};
///
/// fn example() -> MigratorResult<()> {
///     Err(MigratorError::new(
///         "Target migration version was not found",
///         ErrorKind::TargetVersionNotFound { version: 42 },
///     ))
/// }
///
/// assert!(example().is_err());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Command line errors
    /// No command name was given
    CommandRequired,
    /// The command name is not one of the known commands
    UnexpectedCommand { command: String },
    /// A version argument could not be parsed as a 64-bit integer
    InvalidVersionFormat { argument: String },
    /// `set_version` was invoked without a target version
    VersionNumberRequired,

    // History state errors
    /// `init` was invoked when the zero record already exists
    MigrationsCollectionAlreadyExists,
    /// The history collection is missing or empty
    MigrationsNotInitialized,
    /// The requested version is not part of the known migration set
    TargetVersionNotFound { version: i64 },
    /// A persisted version has no corresponding migration code.
    ///
    /// `plan` is the partial correlation result; its last element is the
    /// first unmapped record, whose version is repeated in `version`.
    SomeMigrationsAreAbsent {
        version: i64,
        plan: Vec<MigrationRecord>,
    },

    // Registry errors
    /// Two known migrations declare the same version
    DuplicateMigrationVersion { version: i64 },
    /// A known migration declares a version at or below the zero floor
    InvalidMigrationVersion { version: i64 },

    // Locking errors
    /// The advisory lock for the resource is held by someone else
    LockUnavailable { resource: String, holder: String },

    // Configuration errors
    /// The migrator was configured with an invalid value
    InvalidConfiguration,

    // Backend errors
    /// Error from the persistence adapter
    StoreError,
    /// Error raised by a migration body
    MigrationFailed,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::CommandRequired => write!(f, "Command required"),
            ErrorKind::UnexpectedCommand { command } => {
                write!(f, "Unexpected command '{}'", command)
            }
            ErrorKind::InvalidVersionFormat { argument } => {
                write!(f, "Invalid version argument format '{}'", argument)
            }
            ErrorKind::VersionNumberRequired => write!(f, "Version number required"),
            ErrorKind::MigrationsCollectionAlreadyExists => {
                write!(f, "Migrations collection already exists")
            }
            ErrorKind::MigrationsNotInitialized => write!(f, "Migrations are not initialized"),
            ErrorKind::TargetVersionNotFound { version } => {
                write!(f, "Target migration version {} was not found", version)
            }
            ErrorKind::SomeMigrationsAreAbsent { version, .. } => {
                write!(f, "Some migrations are absent, first missing version {}", version)
            }
            ErrorKind::DuplicateMigrationVersion { version } => {
                write!(f, "Duplicate migration version {}", version)
            }
            ErrorKind::InvalidMigrationVersion { version } => {
                write!(f, "Invalid migration version {}", version)
            }
            ErrorKind::LockUnavailable { resource, holder } => {
                write!(f, "Lock on '{}' is held by {}", resource, holder)
            }
            ErrorKind::InvalidConfiguration => write!(f, "Invalid configuration"),
            ErrorKind::StoreError => write!(f, "Store error"),
            ErrorKind::MigrationFailed => write!(f, "Migration failed"),
        }
    }
}

/// The (old, new) version pair a command produced.
///
/// Returned on success, and attached to a [`MigratorError`] on failure so
/// partial progress stays visible: `new_version` is the version pointer
/// after the last fully persisted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionChange {
    pub old_version: i64,
    pub new_version: i64,
}

impl VersionChange {
    pub fn new(old_version: i64, new_version: i64) -> Self {
        VersionChange {
            old_version,
            new_version,
        }
    }

    /// A change where nothing moved.
    pub fn unchanged(version: i64) -> Self {
        VersionChange::new(version, version)
    }

    pub fn is_unchanged(&self) -> bool {
        self.old_version == self.new_version
    }
}

impl Display for VersionChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.old_version, self.new_version)
    }
}

/// Custom migrator error type.
///
/// `MigratorError` encapsulates the error message, its kind, an optional
/// cause and, for command failures, the [`VersionChange`] reached before
/// the failure.
///
/// # Examples
///
/// ```rust
/// use migrator::errors::{ErrorKind, MigratorError, VersionChange};
///
/// let cause = MigratorError::new("connection reset", ErrorKind::StoreError);
/// let err = MigratorError::new_with_cause("insert failed", ErrorKind::StoreError, cause)
///     .with_progress(VersionChange::new(0, 2));
///
/// assert_eq!(err.progress(), Some(VersionChange::new(0, 2)));
/// ```
#[derive(Clone)]
pub struct MigratorError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<MigratorError>>,
    progress: Option<VersionChange>,
    backtrace: Atomic<Backtrace>,
}

impl MigratorError {
    /// Creates a new `MigratorError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        MigratorError {
            message: message.to_string(),
            error_kind,
            cause: None,
            progress: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `MigratorError` with a cause error.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: MigratorError) -> Self {
        MigratorError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            progress: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Builds an error whose message is the display form of its kind.
    pub fn of_kind(error_kind: ErrorKind) -> Self {
        let message = error_kind.to_string();
        MigratorError::new(&message, error_kind)
    }

    /// Attaches the version pair reached before this error occurred.
    pub fn with_progress(mut self, progress: VersionChange) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&MigratorError> {
        self.cause.as_deref()
    }

    pub fn progress(&self) -> Option<VersionChange> {
        self.progress
    }
}

impl Display for MigratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for MigratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for MigratorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for migrator operations.
pub type MigratorResult<T> = Result<T, MigratorError>;

impl From<std::io::Error> for MigratorError {
    fn from(err: std::io::Error) -> Self {
        MigratorError::new(&format!("IO error: {}", err), ErrorKind::StoreError)
    }
}
