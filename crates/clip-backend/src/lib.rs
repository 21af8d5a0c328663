//! Client for the backend internal job API.
//!
//! This crate provides:
//! - The [`JobBackend`] trait the worker talks to
//! - A reqwest implementation with bearer auth and worker identity headers
//! - Claim response parsing that separates "no job" from malformed bodies

pub mod backend;
pub mod client;
pub mod error;
pub mod types;

pub use backend::JobBackend;
pub use client::{BackendClient, BackendConfig};
pub use error::{BackendError, BackendResult};
pub use types::parse_claim_response;
