//! Core types, trait definitions and business rules for the Catalogi API.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! validators in [`validate`] are synchronous predicates over read-only
//! snapshots supplied by a [`store::CatalogReader`]; storage backends run them
//! inside their write transaction.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod archival;
pub mod classification;
pub mod error;
pub mod scope;
pub mod store;
pub mod types;
pub mod validate;

pub use error::{Error, ErrorCode, PermissionError, Result, ValidationError};
pub use scope::{Scope, Scopes};
