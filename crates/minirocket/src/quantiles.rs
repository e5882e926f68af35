//! Quantile levels and quantile estimation.
//!
//! [`quantile_sequence`] produces the data-independent quantile level assigned
//! to every feature. [`QuantileSampler`] evaluates those levels against a
//! pooled convolution output with linear interpolation between order
//! statistics.

use std::cmp::Ordering;

/// Golden ratio, `(1 + sqrt(5)) / 2`.
const PHI: f64 = 1.618_033_988_749_895;

/// Low-discrepancy quantile levels `frac(i * phi)` for `i = 1..=n`.
///
/// Consecutive levels are well spread over `(0, 1)`, so the few biases a
/// kernel gets at one dilation cover its output distribution evenly.
pub fn quantile_sequence(n: usize) -> Vec<f32> {
    (1..=n)
        .map(|i| (i as f64 * PHI).rem_euclid(1.0) as f32)
        .collect()
}

/// Weighted-sum interpolation `a (1 - t) + b t`, evaluated in f64.
///
/// This is the form the compiled NumPy quantile uses, not NumPy's two-sided
/// lerp. Both operands are widened f32 values, so equal neighbours round back
/// to the same f32 either way.
#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Quantile estimator over a private, reorderable copy of a pool.
///
/// Order statistics are located with `select_nth_unstable`, so evaluating a
/// handful of levels costs linear time per level instead of a full sort.
pub struct QuantileSampler {
    pool: Vec<f32>,
    has_nan: bool,
}

impl QuantileSampler {
    /// Take ownership of `pool`.
    pub fn new(pool: Vec<f32>) -> Self {
        let has_nan = pool.iter().any(|v| v.is_nan());
        QuantileSampler { pool, has_nan }
    }

    /// Number of pooled values.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// `true` when the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Quantile at level `q` in `[0, 1]`.
    ///
    /// With `n` values, position `h = q (n - 1)` falls between order
    /// statistics `floor(h)` and `floor(h) + 1`; the result interpolates
    /// linearly between them. NaN anywhere in the pool yields NaN, as does
    /// an empty pool.
    pub fn quantile(&mut self, q: f32) -> f32 {
        let n = self.pool.len();
        if n == 0 || self.has_nan || q.is_nan() {
            return f32::NAN;
        }
        let h = (q as f64).clamp(0.0, 1.0) * (n - 1) as f64;
        let lo = (h.floor() as usize).min(n - 1);
        let t = h - lo as f64;

        let (_, &mut a, upper) = self.pool.select_nth_unstable_by(lo, f32::total_cmp);
        // Everything right of `lo` is >= a, so the next order statistic is
        // the minimum of that side.
        let b = upper
            .iter()
            .copied()
            .min_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal))
            .unwrap_or(a);

        lerp(a as f64, b as f64, t) as f32
    }

    /// Quantiles for every level in `levels`, in order.
    pub fn quantiles(&mut self, levels: &[f32]) -> Vec<f32> {
        levels.iter().map(|&q| self.quantile(q)).collect()
    }
}
