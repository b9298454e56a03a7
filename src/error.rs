//! Error handling for Tributec
//!
//! Core calculations return the typed [`TaxError`] so callers can tell a bad
//! input value apart from a broken configuration. Application layers (CSV
//! loading, reports, CLI) use `anyhow` for context chaining.

use thiserror::Error;

/// Core error types for tax and drawback operations
#[derive(Error, Debug)]
pub enum TaxError {
    /// Invalid input value or rate (rate >= 1, non-positive FOB value, ...)
    #[error("domain error: {0}")]
    Domain(String),

    /// Malformed configuration (bucket gaps, unordered thresholds, ...)
    #[error("config error: {0}")]
    Config(String),
}

impl TaxError {
    pub fn domain(msg: impl Into<String>) -> Self {
        TaxError::Domain(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        TaxError::Config(msg.into())
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, TaxError::Domain(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, TaxError::Config(_))
    }
}

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;
