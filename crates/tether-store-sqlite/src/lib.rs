//! SQLite backend for the Tether contact store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each `identify` call is one
//! immediate-mode transaction on that thread.

mod encode;
mod schema;
mod store;
mod unit;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
