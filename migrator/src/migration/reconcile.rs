//! Reconciliation of the persisted history with the known migration set.
//!
//! Both inputs are version-ascending: `applied` comes from the history
//! (every item stored), `actual` is the normalized known set. All three
//! walks here are linear merges over the two sequences.

use crate::errors::{ErrorKind, MigratorError};
use crate::migration::Migration;
use crate::store::MigrationRecord;
use itertools::EitherOrBoth::{Both, Left, Right};
use itertools::Itertools;
use std::fmt::{Debug, Display, Formatter};

/// Builds the execution plan for a forward run.
///
/// The result holds every `applied` item plus every `actual` item with a
/// version at or below the bound, one item per version, ascending. When a
/// version is in both inputs the stored copy wins, so it is not applied
/// again. The bound is `target` when given, otherwise the highest known
/// version. It only cuts the `actual` side: history beyond the bound stays
/// in the plan.
///
/// Items that are not stored are the ones left to apply, in plan order.
pub fn merge<D>(
    applied: &[Migration<D>],
    actual: &[Migration<D>],
    target: Option<i64>,
) -> Vec<Migration<D>> {
    let limit = target.or_else(|| actual.last().map(|m| m.version()));
    let bounded = actual
        .iter()
        .take_while(|m| limit.map_or(true, |limit| m.version() <= limit));

    applied
        .iter()
        .merge_join_by(bounded, |a, b| a.version().cmp(&b.version()))
        .map(|pair| match pair {
            Left(stored) | Both(stored, _) => stored.clone(),
            Right(known) => known.clone(),
        })
        .collect()
}

/// Replaces every `applied` item with its executable counterpart from `actual`.
///
/// Known migrations that were never applied are skipped. The walk stops at
/// the first applied version without code and returns the plan built so
/// far, ending with that orphaned item.
pub fn correlate<D>(
    applied: &[Migration<D>],
    actual: &[Migration<D>],
) -> Result<Vec<Migration<D>>, AbsentMigrations<D>> {
    let mut correlated = Vec::with_capacity(applied.len());

    for pair in applied
        .iter()
        .merge_join_by(actual.iter(), |a, b| a.version().cmp(&b.version()))
    {
        match pair {
            Left(orphan) => {
                correlated.push(orphan.clone());
                return Err(AbsentMigrations { plan: correlated });
            }
            // known but never applied
            Right(_) => {}
            Both(_, known) => correlated.push(known.clone()),
        }
    }

    Ok(correlated)
}

/// A correlation that found applied history without matching code.
pub struct AbsentMigrations<D> {
    plan: Vec<Migration<D>>,
}

impl<D> AbsentMigrations<D> {
    /// The partial plan; its last element is the first absent migration.
    pub fn plan(&self) -> &[Migration<D>] {
        &self.plan
    }

    pub fn into_plan(self) -> Vec<Migration<D>> {
        self.plan
    }

    /// Version of the first applied migration without code.
    pub fn first_absent_version(&self) -> i64 {
        // never empty: built by pushing the orphan before returning
        self.plan.last().map(|m| m.version()).unwrap_or_default()
    }
}

impl<D> Debug for AbsentMigrations<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbsentMigrations")
            .field("plan", &self.plan)
            .finish()
    }
}

impl<D> Display for AbsentMigrations<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Some migrations are absent, corresponding code could not be found for version {}",
            self.first_absent_version()
        )
    }
}

impl<D> From<AbsentMigrations<D>> for MigratorError {
    fn from(absent: AbsentMigrations<D>) -> Self {
        let message = absent.to_string();
        let version = absent.first_absent_version();
        let plan = absent
            .plan
            .iter()
            .map(|m| MigrationRecord::new(m.version(), m.name()))
            .collect();
        MigratorError::new(
            &message,
            ErrorKind::SomeMigrationsAreAbsent { version, plan },
        )
    }
}

/// Where a migration stands relative to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// Known and recorded in the history.
    Applied,
    /// Known but not recorded.
    Pending,
    /// Recorded but unknown to the running code.
    Orphaned,
}

/// One line of a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub version: i64,
    pub name: String,
    pub state: MigrationState,
}

/// Lists every version found in either input with its state, ascending.
pub fn status<D>(applied: &[Migration<D>], actual: &[Migration<D>]) -> Vec<StatusEntry> {
    applied
        .iter()
        .merge_join_by(actual.iter(), |a, b| a.version().cmp(&b.version()))
        .map(|pair| {
            let (migration, state) = match pair {
                Left(stored) => (stored, MigrationState::Orphaned),
                Right(known) => (known, MigrationState::Pending),
                Both(_, known) => (known, MigrationState::Applied),
            };
            StatusEntry {
                version: migration.version(),
                name: migration.name().to_string(),
                state,
            }
        })
        .collect()
}
