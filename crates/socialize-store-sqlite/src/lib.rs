//! SQLite backend for the Socialize store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every trait call is one closure on
//! that thread, so each call is atomic with respect to the others; the
//! multi-statement ones (cascading deletes, counter adjustment, recount) also
//! run inside a transaction.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
