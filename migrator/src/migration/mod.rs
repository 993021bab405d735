//! Migrations and the reconciliation of code with history.
//!
//! A [`Migration`] pairs a version with apply and revert bodies. Caller
//! migrations are normalized into a [`MigrationSet`], which always starts
//! with the zero migration. The [`reconcile`] functions then line that set
//! up against the persisted history:
//!
//! - [`merge`] builds the forward plan for `up`
//! - [`correlate`] builds the rollback plan for `reset`
//! - [`status`] reports which versions are applied, pending or orphaned

mod migration;
pub mod reconcile;
mod set;

pub use migration::{Migration, MigrationFn};
pub use reconcile::{correlate, merge, status, AbsentMigrations, MigrationState, StatusEntry};
pub use set::MigrationSet;
