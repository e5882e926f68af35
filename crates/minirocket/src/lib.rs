//! # MiniRocket
//!
//! Deterministic time-series transform that turns a batch of fixed-length
//! series into a wide feature matrix for a linear classifier.
//!
//! A fixed bank of 84 nine-tap kernels is evaluated at several dilations.
//! For every `(dilation, kernel)` pair, biases are calibrated as quantiles of
//! the convolution output pooled over the batch, and every bias yields one
//! feature: the proportion of outputs above it.
//!
//! ## Architecture
//!
//! ```text
//! MiniRocketConfig ──► fit_dilations ──► DilationPlan
//!                           │
//!                  quantile_sequence
//!                           │
//!   batch ──► ConvolutionBasis (per series, per dilation)
//!                           │
//!           84 kernels × dilations: convolve ► calibrate ► ppv
//!                           │
//!              FittedParameters + feature matrix
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use minirocket::{MiniRocket, MiniRocketConfig};
//! use ndarray::Array2;
//!
//! let train = Array2::from_shape_fn((8, 64), |(i, t)| ((t * (i + 1)) as f32 * 0.05).sin());
//! let test = Array2::from_shape_fn((2, 64), |(i, t)| ((t + i) as f32 * 0.1).cos());
//!
//! let mut model = MiniRocket::new(MiniRocketConfig {
//!     num_features: 1_008,
//!     ..MiniRocketConfig::default()
//! })
//! .unwrap();
//!
//! let train_features = model.fit_transform(train.view()).unwrap();
//! let test_features = model.transform(test.view()).unwrap();
//! assert_eq!(train_features.ncols(), test_features.ncols());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod convolution;
pub mod dilations;
pub mod error;
pub mod kernels;
pub mod ppv;
pub mod quantiles;
pub mod transform;

// Convenient re-exports at the crate root.
pub use config::MiniRocketConfig;
pub use convolution::{direct_convolution, ConvolutionBasis, TapWindow, TapWindows};
pub use dilations::{fit_dilations, DilationPlan};
pub use error::{ConfigError, MiniRocketError, Result};
pub use kernels::{crop_parity, kernel_span, padding, KERNEL_INDICES, KERNEL_LENGTH, NUM_KERNELS};
pub use ppv::ppv;
pub use quantiles::{quantile_sequence, QuantileSampler};
pub use transform::{
    fit, fit_biases_transform, fit_transform, fit_transform_dyn, transform, FittedParameters,
    MiniRocket,
};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::MiniRocketConfig;
    pub use crate::dilations::DilationPlan;
    pub use crate::transform::{fit_transform, transform, FittedParameters, MiniRocket};
    pub use crate::{MiniRocketError, Result};
}
