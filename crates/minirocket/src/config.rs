//! Transform configuration.
//!
//! [`MiniRocketConfig`] holds the feature budget, the per-kernel dilation cap,
//! and the execution mode. It is serializable via [`serde`] so it can be
//! stored next to fitted parameters and restored from JSON.
//!
//! # Example
//!
//! ```rust
//! use minirocket::config::MiniRocketConfig;
//!
//! let cfg = MiniRocketConfig::default();
//! cfg.validate().expect("default config is valid");
//!
//! assert_eq!(cfg.num_features, 10_000);
//! assert_eq!(cfg.max_dilations_per_kernel, 32);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::kernels::NUM_KERNELS;

// ---------------------------------------------------------------------------
// MiniRocketConfig
// ---------------------------------------------------------------------------

/// Configuration for fitting and applying the transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniRocketConfig {
    /// Target number of output features.
    ///
    /// The realised count is `84 * (num_features / 84)`. Default: **10 000**.
    pub num_features: usize,

    /// Upper bound on the number of distinct dilations each kernel is
    /// evaluated at. Default: **32**.
    pub max_dilations_per_kernel: usize,

    /// Spread per-series work across the rayon thread pool.
    ///
    /// Sequential and parallel execution give bit-identical output.
    /// Default: **true**.
    pub parallel: bool,
}

impl Default for MiniRocketConfig {
    fn default() -> Self {
        MiniRocketConfig {
            num_features: 10_000,
            max_dilations_per_kernel: 32,
            parallel: true,
        }
    }
}

impl MiniRocketConfig {
    /// Load a [`MiniRocketConfig`] from a JSON file at `path`.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be opened,
    /// [`ConfigError::ParseError`] if the JSON is malformed, and
    /// [`ConfigError::InvalidValue`] if the loaded values fail validation.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: MiniRocketConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize this configuration to pretty-printed JSON and write it to
    /// `path`, creating parent directories if necessary.
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileRead {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Validate all fields.
    ///
    /// # Validated invariants
    ///
    /// - `num_features` must be at least one feature per kernel (84).
    /// - `max_dilations_per_kernel` must be at least 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_features < NUM_KERNELS {
            return Err(ConfigError::invalid_value(
                "num_features",
                format!("must be >= {NUM_KERNELS} (one feature per kernel)"),
            ));
        }
        if self.max_dilations_per_kernel == 0 {
            return Err(ConfigError::invalid_value(
                "max_dilations_per_kernel",
                "must be > 0",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
