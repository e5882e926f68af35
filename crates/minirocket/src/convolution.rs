//! Dilated convolution via the alpha/gamma decomposition.
//!
//! Every kernel has weight -1 on all nine taps plus an extra +3 on its three
//! positive taps. Split that way, the -1 part is shared by all 84 kernels and
//! is accumulated once per series per dilation (`alpha`), and the +3 part is
//! nine shifted copies of `3x` (`gamma`), of which each kernel picks three:
//!
//! ```text
//! output = alpha + gamma[i0] + gamma[i1] + gamma[i2]
//! ```
//!
//! The effective weights are therefore -1 and +2. Positions that would read
//! past either end of the series contribute nothing (zero padding).

use ndarray::{s, Array1, Array2, ArrayView1, ArrayViewMut1, Zip};
use std::ops::Range;

use crate::kernels::{padding, CENTRE_TAP, KERNEL_LENGTH};

// ---------------------------------------------------------------------------
// TapWindow
// ---------------------------------------------------------------------------

/// One off-centre tap, described by the window of the output it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapWindow {
    /// Tap left of centre: `out[L - len..] += src[..len]`.
    Trailing {
        /// Tap index in `0..4`.
        tap: usize,
        /// Number of output positions the tap reaches.
        len: usize,
    },
    /// Tap right of centre: `out[..L - start] += src[start..]`.
    Leading {
        /// Tap index in `5..9`.
        tap: usize,
        /// First source position the tap reads.
        start: usize,
    },
}

impl TapWindow {
    /// Tap index this window belongs to.
    pub fn tap(&self) -> usize {
        match *self {
            TapWindow::Trailing { tap, .. } | TapWindow::Leading { tap, .. } => tap,
        }
    }

    /// `(output range, source range)` for a series of `input_length`.
    pub fn ranges(&self, input_length: usize) -> (Range<usize>, Range<usize>) {
        match *self {
            TapWindow::Trailing { len, .. } => {
                let len = len.min(input_length);
                (input_length - len..input_length, 0..len)
            }
            TapWindow::Leading { start, .. } => {
                let start = start.min(input_length);
                (0..input_length - start, start..input_length)
            }
        }
    }
}

/// The eight shift steps for one dilation, left taps first.
///
/// Left windows start at `L - padding` and grow by `dilation` per step; right
/// windows start reading at `dilation` and move out by `dilation` per step.
#[derive(Debug, Clone)]
pub struct TapWindows {
    dilation: usize,
    len: usize,
    start: usize,
    step: usize,
}

impl TapWindows {
    /// Shift schedule for a series of `input_length` at `dilation`.
    pub fn new(input_length: usize, dilation: usize) -> Self {
        TapWindows {
            dilation,
            len: input_length.saturating_sub(padding(dilation)),
            start: dilation,
            step: 0,
        }
    }
}

impl Iterator for TapWindows {
    type Item = TapWindow;

    fn next(&mut self) -> Option<TapWindow> {
        let window = match self.step {
            step if step < CENTRE_TAP => {
                let w = TapWindow::Trailing {
                    tap: step,
                    len: self.len,
                };
                self.len += self.dilation;
                w
            }
            step if step < KERNEL_LENGTH - 1 => {
                let w = TapWindow::Leading {
                    tap: step + 1,
                    start: self.start,
                };
                self.start += self.dilation;
                w
            }
            _ => return None,
        };
        self.step += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (KERNEL_LENGTH - 1).saturating_sub(self.step);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TapWindows {}

// ---------------------------------------------------------------------------
// ConvolutionBasis
// ---------------------------------------------------------------------------

/// Shared partial sums for one series at one dilation.
#[derive(Debug, Clone)]
pub struct ConvolutionBasis {
    /// Sum of `-x` over all nine taps.
    alpha: Array1<f32>,
    /// `3x` shifted to each tap position, shape `(9, L)`.
    gamma: Array2<f32>,
}

impl ConvolutionBasis {
    /// Build the basis for series `x` at `dilation`.
    pub fn new(x: ArrayView1<f32>, dilation: usize) -> Self {
        let input_length = x.len();
        let a = x.mapv(|v| -v);
        let g = x.mapv(|v| v + v + v);

        let mut alpha = a.clone();
        let mut gamma = Array2::<f32>::zeros((KERNEL_LENGTH, input_length));
        gamma.row_mut(CENTRE_TAP).assign(&g);

        for window in TapWindows::new(input_length, dilation) {
            let (out, src) = window.ranges(input_length);
            let mut acc = alpha.slice_mut(s![out.start..out.end]);
            acc += &a.slice(s![src.start..src.end]);
            gamma
                .slice_mut(s![window.tap(), out.start..out.end])
                .assign(&g.slice(s![src.start..src.end]));
        }

        ConvolutionBasis { alpha, gamma }
    }

    /// Length of the underlying series.
    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    /// `true` for an empty series.
    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// Write the output of the kernel with positive taps `taps` into `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is not the length of the series or a tap is `>= 9`.
    pub fn kernel_output_into(&self, taps: &[usize; 3], mut out: ArrayViewMut1<f32>) {
        let [i0, i1, i2] = *taps;
        Zip::from(&mut out)
            .and(&self.alpha)
            .and(self.gamma.row(i0))
            .and(self.gamma.row(i1))
            .and(self.gamma.row(i2))
            .for_each(|o, &a, &g0, &g1, &g2| *o = a + g0 + g1 + g2);
    }

    /// Output of the kernel with positive taps `taps` as a new array.
    pub fn kernel_output(&self, taps: &[usize; 3]) -> Array1<f32> {
        let mut out = Array1::<f32>::zeros(self.len());
        self.kernel_output_into(taps, out.view_mut());
        out
    }
}

/// Reference evaluation of one kernel, tap by tap.
///
/// Quadratic in the kernel length; used to check [`ConvolutionBasis`].
pub fn direct_convolution(x: ArrayView1<f32>, taps: &[usize; 3], dilation: usize) -> Array1<f32> {
    let input_length = x.len() as isize;
    let mut out = Array1::<f32>::zeros(x.len());
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for tap in 0..KERNEL_LENGTH {
            let offset = (tap as isize - CENTRE_TAP as isize) * dilation as isize;
            let j = i as isize + offset;
            if j < 0 || j >= input_length {
                continue;
            }
            let weight = if taps.contains(&tap) { 2.0 } else { -1.0 };
            acc += weight * x[j as usize];
        }
        *o = acc;
    }
    out
}
