//! Fused bias calibration and feature extraction.
//!
//! The transform walks the `(dilation, kernel)` grid in plan order. Each
//! grid cell is a [`FeatureUnit`] owning a contiguous range of output
//! columns, and moves through three stages:
//!
//! ```text
//! FeatureUnit ──convolve──► ConvolvedUnit ──calibrate──► CalibratedUnit ──emit──► columns
//!                                        └─with_biases─┘
//! ```
//!
//! Each stage consumes the previous one, so a unit cannot emit features
//! before its biases exist, and biases are only computed once every series'
//! convolution output for the unit is in its buffer.
//!
//! Work inside a unit is split across series with rayon when
//! [`MiniRocketConfig::parallel`] is set. Every series is processed by the
//! same code either way, so sequential and parallel runs are bit-identical.

use ndarray::{
    s, Array2, ArrayView1, ArrayView2, ArrayViewD, ArrayViewMut1, ArrayViewMut2, Axis, Ix2, Zip,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, info, trace};

use crate::config::MiniRocketConfig;
use crate::convolution::ConvolutionBasis;
use crate::dilations::{fit_dilations, DilationPlan};
use crate::error::{MiniRocketError, Result};
use crate::kernels::{crop_parity, padding, KERNEL_INDICES, KERNEL_LENGTH, NUM_KERNELS};
use crate::ppv::ppv;
use crate::quantiles::{quantile_sequence, QuantileSampler};

// ---------------------------------------------------------------------------
// FittedParameters
// ---------------------------------------------------------------------------

/// Everything learned by a fit: the dilation plan and one bias per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedParameters {
    /// Dilations, strictly increasing.
    pub dilations: Vec<usize>,
    /// Features per kernel at each dilation.
    pub num_features_per_dilation: Vec<usize>,
    /// One bias per feature, ordered dilation, kernel, feature.
    pub biases: Vec<f32>,
}

impl FittedParameters {
    /// The dilation plan these parameters were fitted with.
    pub fn plan(&self) -> Result<DilationPlan> {
        DilationPlan::new(
            self.dilations.clone(),
            self.num_features_per_dilation.clone(),
        )
    }

    /// Width of the feature matrix these parameters produce.
    pub fn num_features(&self) -> usize {
        self.biases.len()
    }
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Where a unit's biases come from.
#[derive(Debug, Clone, Copy)]
enum Thresholds<'a> {
    /// Calibrate from the pooled output at these quantile levels.
    Calibrate(&'a [f32]),
    /// Reuse biases from an earlier fit.
    Fitted(&'a [f32]),
}

impl<'a> Thresholds<'a> {
    fn len(&self) -> usize {
        match self {
            Thresholds::Calibrate(v) | Thresholds::Fitted(v) => v.len(),
        }
    }
}

/// One `(dilation, kernel)` cell of the grid, not yet computed.
#[derive(Debug, Clone)]
struct FeatureUnit {
    dilation_index: usize,
    kernel_index: usize,
    padding: usize,
    columns: Range<usize>,
}

impl FeatureUnit {
    /// Reduce over `row[padding..L - padding]` instead of the full row.
    fn crops(&self) -> bool {
        crop_parity(self.dilation_index, self.kernel_index)
    }

    /// Evaluate this unit's kernel for every series.
    fn convolve(
        self,
        bases: &[ConvolutionBasis],
        input_length: usize,
        parallel: bool,
    ) -> ConvolvedUnit {
        let taps = &KERNEL_INDICES[self.kernel_index];
        let mut output = Array2::<f32>::zeros((bases.len(), input_length));

        if parallel {
            output
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(bases.par_iter())
                .for_each(|(row, basis)| basis.kernel_output_into(taps, row));
        } else {
            for (row, basis) in output.axis_iter_mut(Axis(0)).zip(bases.iter()) {
                basis.kernel_output_into(taps, row);
            }
        }

        ConvolvedUnit { unit: self, output }
    }
}

/// A unit whose `(N, L)` output buffer is fully written.
struct ConvolvedUnit {
    unit: FeatureUnit,
    output: Array2<f32>,
}

impl ConvolvedUnit {
    /// Biases are quantiles of the output pooled over all series.
    fn calibrate(self, levels: &[f32]) -> CalibratedUnit {
        let mut sampler = QuantileSampler::new(self.output.iter().copied().collect());
        let biases = sampler.quantiles(levels);
        CalibratedUnit {
            unit: self.unit,
            output: self.output,
            biases,
        }
    }

    fn with_biases(self, biases: &[f32]) -> CalibratedUnit {
        CalibratedUnit {
            unit: self.unit,
            output: self.output,
            biases: biases.to_vec(),
        }
    }
}

/// A unit with its biases fixed, ready to reduce.
struct CalibratedUnit {
    unit: FeatureUnit,
    output: Array2<f32>,
    biases: Vec<f32>,
}

impl CalibratedUnit {
    /// Write this unit's feature columns and biases.
    fn emit(self, features: &mut ArrayViewMut2<'_, f32>, biases: &mut [f32], parallel: bool) {
        let CalibratedUnit {
            unit,
            output,
            biases: unit_biases,
        } = self;
        let input_length = output.ncols();
        let window = if unit.crops() {
            unit.padding..input_length - unit.padding
        } else {
            0..input_length
        };

        let mut block = features.slice_mut(s![.., unit.columns.start..unit.columns.end]);
        let zip = Zip::from(block.rows_mut()).and(output.rows());
        if parallel {
            zip.par_for_each(|feature_row, conv_row| {
                reduce_row(feature_row, conv_row, &window, &unit_biases)
            });
        } else {
            zip.for_each(|feature_row, conv_row| {
                reduce_row(feature_row, conv_row, &window, &unit_biases)
            });
        }

        biases[unit.columns.clone()].copy_from_slice(&unit_biases);
        trace!(
            dilation_index = unit.dilation_index,
            kernel_index = unit.kernel_index,
            cropped = unit.crops(),
            "unit emitted"
        );
    }
}

/// PPV of `conv_row[window]` against every bias, into `feature_row`.
fn reduce_row(
    mut feature_row: ArrayViewMut1<'_, f32>,
    conv_row: ArrayView1<'_, f32>,
    window: &Range<usize>,
    biases: &[f32],
) {
    let values = conv_row.slice(s![window.start..window.end]);
    for (f, &bias) in feature_row.iter_mut().zip(biases.iter()) {
        *f = ppv(values.iter(), bias);
    }
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

fn validate_batch(x: &ArrayView2<'_, f32>) -> Result<()> {
    let (num_series, input_length) = x.dim();
    if num_series == 0 {
        return Err(MiniRocketError::invalid_input("batch contains no series"));
    }
    if input_length < KERNEL_LENGTH {
        return Err(MiniRocketError::invalid_input(format!(
            "series length {input_length} is shorter than the kernel length {KERNEL_LENGTH}"
        )));
    }
    Ok(())
}

fn build_bases(x: &ArrayView2<'_, f32>, dilation: usize, parallel: bool) -> Vec<ConvolutionBasis> {
    if parallel {
        x.axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| ConvolutionBasis::new(row, dilation))
            .collect()
    } else {
        x.axis_iter(Axis(0))
            .map(|row| ConvolutionBasis::new(row, dilation))
            .collect()
    }
}

fn run(
    x: ArrayView2<'_, f32>,
    plan: &DilationPlan,
    thresholds: Thresholds<'_>,
    parallel: bool,
) -> Result<(Vec<f32>, Array2<f32>)> {
    validate_batch(&x)?;
    plan.validate()?;
    let (num_series, input_length) = x.dim();
    plan.check_fits(input_length)?;

    let num_features = plan.total_features();
    if thresholds.len() != num_features {
        return Err(MiniRocketError::invariant(format!(
            "plan yields {num_features} features but {} thresholds were supplied",
            thresholds.len()
        )));
    }

    let mut biases = vec![0.0f32; num_features];
    let mut features = Array2::<f32>::zeros((num_series, num_features));
    let mut features_view = features.view_mut();

    let mut column = 0usize;
    for (dilation_index, (&dilation, &per_kernel)) in plan
        .dilations
        .iter()
        .zip(plan.num_features_per_dilation.iter())
        .enumerate()
    {
        debug!(
            dilation_index,
            dilation,
            features_per_kernel = per_kernel,
            padding = padding(dilation),
            "processing dilation"
        );
        let bases = build_bases(&x, dilation, parallel);

        for kernel_index in 0..NUM_KERNELS {
            let columns = column..column + per_kernel;
            let unit = FeatureUnit {
                dilation_index,
                kernel_index,
                padding: padding(dilation),
                columns: columns.clone(),
            };
            let convolved = unit.convolve(&bases, input_length, parallel);
            let calibrated = match thresholds {
                Thresholds::Calibrate(levels) => convolved.calibrate(&levels[columns]),
                Thresholds::Fitted(fitted) => convolved.with_biases(&fitted[columns]),
            };
            calibrated.emit(&mut features_view, &mut biases, parallel);
            column += per_kernel;
        }
    }

    Ok((biases, features))
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Calibrate biases on `x` and extract its features in one pass.
///
/// `quantiles` holds one level per feature in dilation, kernel, feature
/// order; its length must equal `plan.total_features()`.
///
/// # Errors
///
/// - [`MiniRocketError::InvalidInput`] for an empty batch or series shorter
///   than one kernel.
/// - [`MiniRocketError::InvalidConfiguration`] for a malformed plan or a
///   dilation whose span exceeds the series length.
/// - [`MiniRocketError::InternalInvariantViolation`] when `quantiles` does
///   not match the plan's feature count.
pub fn fit_biases_transform(
    x: ArrayView2<'_, f32>,
    plan: &DilationPlan,
    quantiles: &[f32],
    parallel: bool,
) -> Result<(Vec<f32>, Array2<f32>)> {
    run(x, plan, Thresholds::Calibrate(quantiles), parallel)
}

/// Fit the transform on `x` and return the fitted parameters together with
/// the features of `x`.
///
/// ```rust
/// use minirocket::{fit_transform, MiniRocketConfig};
/// use ndarray::Array2;
///
/// let x = Array2::from_shape_fn((4, 32), |(i, t)| ((i + t) as f32 * 0.3).sin());
/// let cfg = MiniRocketConfig { num_features: 840, ..MiniRocketConfig::default() };
/// let (params, features) = fit_transform(x.view(), &cfg).unwrap();
///
/// assert_eq!(features.dim(), (4, 840));
/// assert_eq!(params.biases.len(), 840);
/// ```
pub fn fit_transform(
    x: ArrayView2<'_, f32>,
    config: &MiniRocketConfig,
) -> Result<(FittedParameters, Array2<f32>)> {
    config.validate()?;
    validate_batch(&x)?;
    let (num_series, input_length) = x.dim();

    let plan = fit_dilations(
        input_length,
        config.num_features,
        config.max_dilations_per_kernel,
    )?;
    let quantiles = quantile_sequence(plan.total_features());

    info!(
        num_series,
        input_length,
        num_dilations = plan.len(),
        num_features = plan.total_features(),
        "fitting transform"
    );
    let (biases, features) = fit_biases_transform(x, &plan, &quantiles, config.parallel)?;
    info!(num_features = features.ncols(), "transform fitted");

    let DilationPlan {
        dilations,
        num_features_per_dilation,
    } = plan;
    Ok((
        FittedParameters {
            dilations,
            num_features_per_dilation,
            biases,
        },
        features,
    ))
}

/// Fit the transform on `x`, discarding the features.
pub fn fit(x: ArrayView2<'_, f32>, config: &MiniRocketConfig) -> Result<FittedParameters> {
    fit_transform(x, config).map(|(params, _)| params)
}

/// Apply fitted parameters to a new batch.
///
/// Series may have a different length from the fitting batch as long as the
/// widest fitted dilation still fits.
pub fn transform(
    x: ArrayView2<'_, f32>,
    params: &FittedParameters,
    parallel: bool,
) -> Result<Array2<f32>> {
    let plan = params.plan()?;
    if params.biases.len() != plan.total_features() {
        return Err(MiniRocketError::invariant(format!(
            "parameters hold {} biases for {} features",
            params.biases.len(),
            plan.total_features()
        )));
    }
    info!(
        num_series = x.nrows(),
        input_length = x.ncols(),
        num_features = plan.total_features(),
        "applying fitted transform"
    );
    run(x, &plan, Thresholds::Fitted(&params.biases), parallel).map(|(_, features)| features)
}

/// [`fit_transform`] for input of unchecked rank.
///
/// # Errors
///
/// [`MiniRocketError::InvalidInput`] unless `x` is two-dimensional.
pub fn fit_transform_dyn(
    x: ArrayViewD<'_, f32>,
    config: &MiniRocketConfig,
) -> Result<(FittedParameters, Array2<f32>)> {
    let ndim = x.ndim();
    let x = x.into_dimensionality::<Ix2>().map_err(|e| {
        MiniRocketError::invalid_input(format!("expected a 2-D batch, got {ndim} dimensions ({e})"))
    })?;
    fit_transform(x, config)
}

// ---------------------------------------------------------------------------
// MiniRocket
// ---------------------------------------------------------------------------

/// Stateful wrapper holding a configuration and, once fitted, its parameters.
#[derive(Debug, Clone)]
pub struct MiniRocket {
    config: MiniRocketConfig,
    parameters: Option<FittedParameters>,
}

impl MiniRocket {
    /// Create an unfitted transform.
    pub fn new(config: MiniRocketConfig) -> Result<Self> {
        config.validate()?;
        Ok(MiniRocket {
            config,
            parameters: None,
        })
    }

    /// Create a transform from previously fitted parameters.
    pub fn from_parameters(config: MiniRocketConfig, parameters: FittedParameters) -> Result<Self> {
        config.validate()?;
        parameters.plan()?;
        Ok(MiniRocket {
            config,
            parameters: Some(parameters),
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &MiniRocketConfig {
        &self.config
    }

    /// Fitted parameters, if [`fit`](Self::fit) or
    /// [`fit_transform`](Self::fit_transform) has run.
    pub fn parameters(&self) -> Option<&FittedParameters> {
        self.parameters.as_ref()
    }

    /// `true` once parameters are available.
    pub fn is_fitted(&self) -> bool {
        self.parameters.is_some()
    }

    /// Fit on `x` and return its features.
    pub fn fit_transform(&mut self, x: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        let (params, features) = fit_transform(x, &self.config)?;
        self.parameters = Some(params);
        Ok(features)
    }

    /// Fit on `x`.
    pub fn fit(&mut self, x: ArrayView2<'_, f32>) -> Result<&FittedParameters> {
        let params = fit(x, &self.config)?;
        Ok(self.parameters.insert(params))
    }

    /// Features of `x` under the fitted parameters.
    ///
    /// # Errors
    ///
    /// [`MiniRocketError::InvalidConfiguration`] before fitting.
    pub fn transform(&self, x: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        let params = self.parameters.as_ref().ok_or_else(|| {
            MiniRocketError::invalid_configuration("transform called before fit")
        })?;
        transform(x, params, self.config.parallel)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
