use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The persisted part of a migration.
///
/// Only the version and the name survive storage. The apply and revert
/// bodies are code, so a record read back from the history can never be
/// executed on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
}

impl MigrationRecord {
    pub fn new(version: i64, name: &str) -> Self {
        MigrationRecord {
            version,
            name: name.to_string(),
        }
    }
}

impl Display for MigrationRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.version, self.name)
    }
}

/// Selects records of the history collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    /// Every record.
    All,
    /// The record with exactly this version.
    Version(i64),
}

impl RecordFilter {
    pub fn matches(&self, record: &MigrationRecord) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::Version(version) => record.version == *version,
        }
    }
}

/// Acknowledgement level requested for history mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteConcern {
    /// Acknowledged by the node that received the write.
    Acknowledged,
    /// Acknowledged by a majority of replicas before it counts as committed.
    #[default]
    Majority,
}

impl Display for WriteConcern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteConcern::Acknowledged => write!(f, "acknowledged"),
            WriteConcern::Majority => write!(f, "majority"),
        }
    }
}
