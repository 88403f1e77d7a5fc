//! HTTP client for the selection-list ("selectielijst") reference-data
//! service.
//!
//! Result types point at a classification by URL; [`SelectielijstClient`]
//! fetches it and implements [`catalogi_core::classification::ClassificationClient`]
//! so the API layer can resolve URLs before a write transaction starts.

mod client;

pub use client::{ClientConfig, ClientError, SelectielijstClient};
