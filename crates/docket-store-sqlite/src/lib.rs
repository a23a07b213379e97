//! SQLite backend for the Docket incident store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Conditional writes run inside a
//! single SQLite transaction each, so a precondition and the write it guards
//! commit or roll back together.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
