//! Common types and utilities shared across the harvest crates.
//!
//! This crate holds the shared error type and the observability helpers used by
//! every binary and integration test in the workspace. It stays small so that all
//! crates can depend on it without pulling in the HTTP or storage stacks.
//!
//! # Overview
//!
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`HarvestError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use harvest_common::HarvestError;
//!
//! let err = HarvestError::Config("twitter.bearer_token is empty".into());
//! assert_eq!(
//!     err.to_string(),
//!     "Configuration error: twitter.bearer_token is empty"
//! );
//! ```
pub mod observability;

/// Error types used across a harvest run.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Search, pagination or serialization failed; the whole cause chain is kept.
    #[error("Social error: {0:#}")]
    Social(#[from] anyhow::Error),

    /// The document store rejected or could not receive a document.
    #[error("Store error: {0}")]
    Store(String),
}

/// Convenient alias for results that use [`HarvestError`].
pub type Result<T> = std::result::Result<T, HarvestError>;
