//! Error types for the MiniRocket transform.
//!
//! Every module imports its error type from here so the hierarchy stays in
//! one place.
//!
//! ## Hierarchy
//!
//! ```text
//! MiniRocketError (top-level)
//! ├── InvalidInput                (shape / rank of the batch)
//! ├── InvalidConfiguration        (dilations that do not fit, bad plans)
//! ├── InternalInvariantViolation  (feature accounting mismatch)
//! └── ConfigError                 (config validation / file loading)
//! ```

use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Convenient `Result` alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MiniRocketError>;

// ---------------------------------------------------------------------------
// MiniRocketError
// ---------------------------------------------------------------------------

/// Top-level error type for fitting and applying the transform.
///
/// None of these are transient: the computation is deterministic, so every
/// error points at a bad input, a bad configuration, or a bug.
#[derive(Debug, Error)]
pub enum MiniRocketError {
    /// The input batch has the wrong rank or shape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The dilation plan or feature budget cannot be applied to the input.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Quantile, bias, and feature counts disagree with the dilation plan.
    #[error("Internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// A configuration validation or loading error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl MiniRocketError {
    /// Construct a [`MiniRocketError::InvalidInput`].
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        MiniRocketError::InvalidInput(msg.into())
    }

    /// Construct a [`MiniRocketError::InvalidConfiguration`].
    pub fn invalid_configuration<S: Into<String>>(msg: S) -> Self {
        MiniRocketError::InvalidConfiguration(msg.into())
    }

    /// Construct a [`MiniRocketError::InternalInvariantViolation`].
    pub fn invariant<S: Into<String>>(msg: S) -> Self {
        MiniRocketError::InternalInvariantViolation(msg.into())
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors produced when loading or validating a [`MiniRocketConfig`].
///
/// [`MiniRocketConfig`]: crate::config::MiniRocketConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A configuration file could not be read or written.
    #[error("Cannot access config file `{path}`: {source}")]
    FileRead {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file contains malformed JSON.
    #[error("Cannot parse config file `{path}`: {source}")]
    ParseError {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying JSON parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Construct a [`ConfigError::InvalidValue`].
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
