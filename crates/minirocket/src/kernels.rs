//! Fixed kernel bank.
//!
//! Every kernel is nine taps long. Three taps are "positive" and the other six
//! carry weight -1. The 84 kernels are all 3-of-9 combinations of positive-tap
//! positions in lexicographic order; row order defines feature order.

/// Number of taps in every kernel.
pub const KERNEL_LENGTH: usize = 9;

/// Index of the unshifted centre tap.
pub const CENTRE_TAP: usize = KERNEL_LENGTH / 2;

/// Number of kernels in the bank (`C(9, 3)`).
pub const NUM_KERNELS: usize = 84;

/// Positive-tap positions for each kernel.
#[rustfmt::skip]
pub const KERNEL_INDICES: [[usize; 3]; NUM_KERNELS] = [
    [0, 1, 2], [0, 1, 3], [0, 1, 4], [0, 1, 5], [0, 1, 6], [0, 1, 7], [0, 1, 8],
    [0, 2, 3], [0, 2, 4], [0, 2, 5], [0, 2, 6], [0, 2, 7], [0, 2, 8], [0, 3, 4],
    [0, 3, 5], [0, 3, 6], [0, 3, 7], [0, 3, 8], [0, 4, 5], [0, 4, 6], [0, 4, 7],
    [0, 4, 8], [0, 5, 6], [0, 5, 7], [0, 5, 8], [0, 6, 7], [0, 6, 8], [0, 7, 8],
    [1, 2, 3], [1, 2, 4], [1, 2, 5], [1, 2, 6], [1, 2, 7], [1, 2, 8], [1, 3, 4],
    [1, 3, 5], [1, 3, 6], [1, 3, 7], [1, 3, 8], [1, 4, 5], [1, 4, 6], [1, 4, 7],
    [1, 4, 8], [1, 5, 6], [1, 5, 7], [1, 5, 8], [1, 6, 7], [1, 6, 8], [1, 7, 8],
    [2, 3, 4], [2, 3, 5], [2, 3, 6], [2, 3, 7], [2, 3, 8], [2, 4, 5], [2, 4, 6],
    [2, 4, 7], [2, 4, 8], [2, 5, 6], [2, 5, 7], [2, 5, 8], [2, 6, 7], [2, 6, 8],
    [2, 7, 8], [3, 4, 5], [3, 4, 6], [3, 4, 7], [3, 4, 8], [3, 5, 6], [3, 5, 7],
    [3, 5, 8], [3, 6, 7], [3, 6, 8], [3, 7, 8], [4, 5, 6], [4, 5, 7], [4, 5, 8],
    [4, 6, 7], [4, 6, 8], [4, 7, 8], [5, 6, 7], [5, 6, 8], [5, 7, 8], [6, 7, 8],
];

/// Number of boundary positions dropped by a cropped reduction at `dilation`.
#[inline]
pub const fn padding(dilation: usize) -> usize {
    ((KERNEL_LENGTH - 1) * dilation) / 2
}

/// Receptive field of a kernel at `dilation`, first tap to last tap inclusive.
#[inline]
pub const fn kernel_span(dilation: usize) -> usize {
    (KERNEL_LENGTH - 1) * dilation + 1
}

/// Whether the (dilation, kernel) unit reduces over the cropped output.
///
/// Checkerboard over the grid: the starting parity flips with every
/// dilation and alternates across kernels within a dilation.
#[inline]
pub const fn crop_parity(dilation_index: usize, kernel_index: usize) -> bool {
    (dilation_index % 2 + kernel_index) % 2 == 1
}
