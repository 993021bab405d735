//! # Migrator - Versioned Schema Migrations for Document Databases
//!
//! Migrator tracks and applies ordered, reversible schema changes
//! ("migrations") against a document database. The versions applied so far
//! are persisted in a history collection inside the database itself, so
//! every instance of an application converges on the same schema state.
//!
//! ## Key Features
//!
//! - **Ordered**: migrations run strictly by version, each exactly once
//! - **Reversible**: step back one migration or reset to the zero state
//! - **Resumable**: every step is persisted on its own; a failed run keeps
//!   its progress and the next run continues where it stopped
//! - **Forced versions**: rewrite the history to a version without running code
//! - **Pluggable storage**: any database implementing [`store::MigrationDatabase`]
//! - **Advisory locking**: optional mutual exclusion between migrator runs
//!
//! ## Quick Start
//!
//! ```rust
//! use migrator::migration::Migration;
//! use migrator::migrator::Migrator;
//! use migrator::store::memory::InMemoryDatabase;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let migrator = Migrator::builder()
//!     .add_migration(Migration::new(
//!         1,
//!         "create_users",
//!         |db: &InMemoryDatabase| db.create_collection("users"),
//!         |db: &InMemoryDatabase| db.drop_collection("users").map(|_| ()),
//!     ))
//!     .build()?;
//!
//! let db = InMemoryDatabase::new();
//! migrator.run(&db, &["init"])?;
//! migrator.run(&db, &["up"])?;
//! assert_eq!(migrator.run(&db, &["version"])?.new_version, 1);
//!
//! migrator.run(&db, &["reset"])?;
//! assert!(!db.has_collection("users"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Commands
//!
//! | Command | Effect |
//! |---|---|
//! | `init` | records the zero migration |
//! | `up [target]` | applies pending migrations up to `target` (all by default) |
//! | `down` | reverts the current migration |
//! | `reset` | reverts everything back to version 0 |
//! | `version` | reports the current version |
//! | `set_version <target>` | rewrites the history to `target` without running code |
//!
//! ## Module Organization
//!
//! - [`command`] - Textual command parsing
//! - [`common`] - Constants and advisory locking
//! - [`errors`] - Error types and result definitions
//! - [`migration`] - Migrations, the known set and reconciliation
//! - [`migrator`] - The command engine
//! - [`migrator_builder`] - Migrator builder
//! - [`migrator_config`] - Migrator configuration
//! - [`store`] - History persistence contracts and the in-memory database

pub mod command;
pub mod common;
pub mod errors;
pub mod migration;
pub mod migrator;
pub mod migrator_builder;
pub mod migrator_config;
pub mod store;
