//! In-memory database for tests, demos and embedded use.

mod database;
mod history;

pub use database::InMemoryDatabase;
pub use history::InMemoryHistory;
