//! Persistence contracts for the migration history.
//!
//! The command engine never talks to a database directly. It reads and
//! writes [`MigrationRecord`]s through a [`HistoryCollection`], which a
//! [`MigrationDatabase`] hands out by name. An in-memory implementation
//! lives in [`memory`].

mod database;
mod history;
pub mod memory;
mod record;

pub use database::*;
pub use history::*;
pub use record::*;
