//! # Core Error Types
//!
//! The runtime keeps errors off the hot path: absence is `Option`, and
//! structural misuse is defensively idempotent. What remains is the
//! startup surface - configuration that cannot be parsed or validated.

use thiserror::Error;

/// Errors that can occur while setting up the runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be parsed.
    #[error("malformed configuration: {0}")]
    ConfigParse(String),
}

/// Result type for runtime setup operations.
pub type CoreResult<T> = Result<T, CoreError>;
