//! SQLite backend for the Catalogi store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every mutation validates and writes
//! inside one `IMMEDIATE` transaction.

mod encode;
mod reader;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use reader::TxReader;
pub use store::SqliteStore;
