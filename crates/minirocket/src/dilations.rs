//! Dilation allocation.
//!
//! Chooses which dilations the kernel bank is evaluated at and how many
//! biases (features) each dilation receives per kernel. Dilations are spread
//! exponentially from 1 up to the largest dilation whose kernel span still
//! fits the series, so short- and long-range patterns share the budget.

use serde::{Deserialize, Serialize};

use crate::error::{MiniRocketError, Result};
use crate::kernels::{kernel_span, KERNEL_LENGTH, NUM_KERNELS};

// ---------------------------------------------------------------------------
// DilationPlan
// ---------------------------------------------------------------------------

/// Dilations and the number of features each contributes per kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilationPlan {
    /// Strictly increasing dilation values.
    pub dilations: Vec<usize>,
    /// Features per kernel at the matching dilation.
    pub num_features_per_dilation: Vec<usize>,
}

impl DilationPlan {
    /// Build a plan from explicit parts, checking that it is well formed.
    ///
    /// # Errors
    ///
    /// [`MiniRocketError::InvalidConfiguration`] if the parts are empty, have
    /// different lengths, or contain a zero dilation or zero feature count.
    pub fn new(dilations: Vec<usize>, num_features_per_dilation: Vec<usize>) -> Result<Self> {
        let plan = DilationPlan {
            dilations,
            num_features_per_dilation,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Check the structural invariants of the plan.
    pub fn validate(&self) -> Result<()> {
        if self.dilations.is_empty() {
            return Err(MiniRocketError::invalid_configuration(
                "dilation plan has no dilations",
            ));
        }
        if self.dilations.len() != self.num_features_per_dilation.len() {
            return Err(MiniRocketError::invalid_configuration(format!(
                "{} dilations but {} per-dilation feature counts",
                self.dilations.len(),
                self.num_features_per_dilation.len()
            )));
        }
        if self.dilations.iter().any(|&d| d == 0) {
            return Err(MiniRocketError::invalid_configuration(
                "dilations must be positive",
            ));
        }
        if self.num_features_per_dilation.iter().any(|&n| n == 0) {
            return Err(MiniRocketError::invalid_configuration(
                "every dilation needs at least one feature",
            ));
        }
        Ok(())
    }

    /// Number of dilations in the plan.
    pub fn len(&self) -> usize {
        self.dilations.len()
    }

    /// `true` when the plan has no dilations.
    pub fn is_empty(&self) -> bool {
        self.dilations.is_empty()
    }

    /// Features each kernel contributes across all dilations.
    pub fn features_per_kernel(&self) -> usize {
        self.num_features_per_dilation.iter().sum()
    }

    /// Width of the feature matrix this plan produces.
    pub fn total_features(&self) -> usize {
        NUM_KERNELS * self.features_per_kernel()
    }

    /// Largest dilation in the plan, if any.
    pub fn max_dilation(&self) -> Option<usize> {
        self.dilations.iter().copied().max()
    }

    /// Reject the plan if its widest kernel does not fit `input_length`.
    ///
    /// # Errors
    ///
    /// [`MiniRocketError::InvalidConfiguration`] when
    /// `kernel_span(max_dilation) > input_length`.
    pub fn check_fits(&self, input_length: usize) -> Result<()> {
        if let Some(d) = self.max_dilation() {
            let span = kernel_span(d);
            if span > input_length {
                return Err(MiniRocketError::invalid_configuration(format!(
                    "dilation {d} spans {span} positions but series length is {input_length}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// fit_dilations
// ---------------------------------------------------------------------------

/// Allocate dilations and per-dilation feature counts for series of
/// `input_length` under a `num_features` budget.
///
/// Candidate dilations are `floor(2^e)` for `max_dilations_per_kernel`
/// (or fewer) exponents spaced evenly over `[0, log2((L - 1) / 8)]`.
/// Duplicates collapse into one dilation whose share of the budget grows
/// with its multiplicity; any remainder goes round-robin from dilation 1.
///
/// # Errors
///
/// [`MiniRocketError::InvalidConfiguration`] if the budget is below one
/// feature per kernel, the cap is zero, or the series is shorter than one
/// kernel.
pub fn fit_dilations(
    input_length: usize,
    num_features: usize,
    max_dilations_per_kernel: usize,
) -> Result<DilationPlan> {
    if input_length < KERNEL_LENGTH {
        return Err(MiniRocketError::invalid_configuration(format!(
            "series length {input_length} is shorter than the kernel length {KERNEL_LENGTH}"
        )));
    }
    let num_features_per_kernel = num_features / NUM_KERNELS;
    if num_features_per_kernel == 0 {
        return Err(MiniRocketError::invalid_configuration(format!(
            "num_features {num_features} is below one feature per kernel ({NUM_KERNELS})"
        )));
    }
    if max_dilations_per_kernel == 0 {
        return Err(MiniRocketError::invalid_configuration(
            "max_dilations_per_kernel must be > 0",
        ));
    }

    let true_max_dilations_per_kernel = num_features_per_kernel.min(max_dilations_per_kernel);
    let multiplier = num_features_per_kernel as f64 / true_max_dilations_per_kernel as f64;
    let max_exponent = ((input_length - 1) as f64 / (KERNEL_LENGTH - 1) as f64).log2();

    // Candidates come out non-decreasing, so run-length encoding is a
    // sorted unique-with-counts.
    let mut dilations: Vec<usize> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    for exponent in linspace(0.0, max_exponent, true_max_dilations_per_kernel) {
        let dilation = 2f64.powf(exponent) as usize;
        match dilations.last() {
            Some(&last) if last == dilation => {
                if let Some(count) = counts.last_mut() {
                    *count += 1;
                }
            }
            _ => {
                dilations.push(dilation);
                counts.push(1);
            }
        }
    }

    let mut num_features_per_dilation: Vec<usize> = counts
        .iter()
        .map(|&c| (c as f64 * multiplier) as usize)
        .collect();

    let mut remainder =
        num_features_per_kernel.saturating_sub(num_features_per_dilation.iter().sum::<usize>());
    let mut i = 0;
    while remainder > 0 {
        num_features_per_dilation[i] += 1;
        remainder -= 1;
        i = (i + 1) % num_features_per_dilation.len();
    }

    DilationPlan::new(dilations, num_features_per_dilation)
}

/// `num` evenly spaced values over `[start, stop]`, endpoint exact.
fn linspace(start: f64, stop: f64, num: usize) -> impl Iterator<Item = f64> {
    let step = if num > 1 {
        (stop - start) / (num - 1) as f64
    } else {
        0.0
    };
    (0..num).map(move |i| {
        if num > 1 && i == num - 1 {
            stop
        } else {
            i as f64 * step + start
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_length_uses_dilation_one_only() {
        let plan = fit_dilations(9, 10_000, 32).unwrap();
        assert_eq!(plan.dilations, vec![1]);
        assert_eq!(plan.num_features_per_dilation, vec![119]);
    }

    #[test]
    fn short_series_splits_budget_over_two_dilations() {
        let plan = fit_dilations(20, 10_000, 32).unwrap();
        assert_eq!(plan.dilations, vec![1, 2]);
        assert_eq!(plan.num_features_per_dilation, vec![93, 26]);
        assert_eq!(plan.total_features(), 84 * 119);
    }

    #[test]
    fn dilation_cap_limits_distinct_dilations() {
        let plan = fit_dilations(64, 1000, 4).unwrap();
        assert_eq!(plan.dilations, vec![1, 3, 7]);
        assert_eq!(plan.num_features_per_dilation, vec![6, 3, 2]);
    }

    #[test]
    fn small_budget_gives_single_feature_per_kernel() {
        let plan = fit_dilations(100, 84, 32).unwrap();
        assert_eq!(plan.dilations, vec![1]);
        assert_eq!(plan.num_features_per_dilation, vec![1]);
        assert_eq!(plan.total_features(), 84);
    }

    #[test]
    fn allocation_sums_to_budget_and_fits_length() {
        for &length in &[9usize, 16, 20, 57, 100, 150, 500, 1024] {
            for &budget in &[84usize, 840, 1000, 10_000] {
                let plan = fit_dilations(length, budget, 32).unwrap();
                assert_eq!(plan.features_per_kernel(), budget / NUM_KERNELS);
                assert!(plan.dilations.windows(2).all(|w| w[0] < w[1]));
                assert_eq!(plan.dilations[0], 1);
                plan.check_fits(length).unwrap();
            }
        }
    }

    #[test]
    fn rejects_budget_below_kernel_count() {
        assert!(matches!(
            fit_dilations(100, 83, 32),
            Err(MiniRocketError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_series_shorter_than_kernel() {
        assert!(fit_dilations(8, 10_000, 32).is_err());
    }

    #[test]
    fn plan_rejects_mismatched_parts() {
        assert!(DilationPlan::new(vec![1, 2], vec![1]).is_err());
        assert!(DilationPlan::new(vec![], vec![]).is_err());
        assert!(DilationPlan::new(vec![0], vec![1]).is_err());
        assert!(DilationPlan::new(vec![1], vec![0]).is_err());
    }

    #[test]
    fn check_fits_rejects_wide_dilation() {
        let plan = DilationPlan::new(vec![1, 2], vec![1, 1]).unwrap();
        assert!(plan.check_fits(17).is_ok());
        assert!(matches!(
            plan.check_fits(16),
            Err(MiniRocketError::InvalidConfiguration(_))
        ));
    }
}
