//! Proportion of positive values.

/// Fraction of `values` strictly greater than `threshold`.
///
/// Accepts anything that iterates over `&f32` with a known length: slices,
/// vectors, or `ndarray` views via `.iter()`. NaN never exceeds a threshold,
/// and a NaN threshold is never exceeded. No values yields `0.0`.
#[inline]
pub fn ppv<'a, I>(values: I, threshold: f32) -> f32
where
    I: IntoIterator<Item = &'a f32>,
    I::IntoIter: ExactSizeIterator,
{
    let iter = values.into_iter();
    let len = iter.len();
    if len == 0 {
        return 0.0;
    }
    let count = iter.filter(|&&v| v > threshold).count();
    (count as f64 / len as f64) as f32
}
