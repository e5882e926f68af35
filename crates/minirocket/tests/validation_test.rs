//! Validation tests for the fused fit/transform.
//!
//! All inputs are deterministic functions of their indices; no RNG is used.

use approx::assert_abs_diff_eq;
use ndarray::{s, Array2};

use minirocket::{
    crop_parity, direct_convolution, fit_biases_transform, fit_transform, padding,
    quantile_sequence, transform, DilationPlan, FittedParameters, MiniRocketConfig,
    KERNEL_INDICES, NUM_KERNELS,
};

fn signals(num_series: usize, input_length: usize) -> Array2<f32> {
    Array2::from_shape_fn((num_series, input_length), |(i, t)| {
        let t = t as f32;
        let i = i as f32;
        (t * (0.11 + 0.03 * i)).sin() * (1.0 + 0.2 * i) + (t * 0.017).cos()
    })
}

fn small_config(num_features: usize) -> MiniRocketConfig {
    MiniRocketConfig {
        num_features,
        ..MiniRocketConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Determinism, range, and count
// ---------------------------------------------------------------------------

#[test]
fn repeated_fits_are_bit_identical() {
    let x = signals(5, 120);
    let cfg = small_config(2_000);

    let (p1, f1) = fit_transform(x.view(), &cfg).unwrap();
    let (p2, f2) = fit_transform(x.view(), &cfg).unwrap();

    assert_eq!(p1, p2);
    assert_eq!(f1, f2);
}

#[test]
fn sequential_fit_matches_parallel_fit() {
    let x = signals(7, 90);
    let par = small_config(1_000);
    let seq = MiniRocketConfig {
        parallel: false,
        ..par.clone()
    };

    let (p_par, f_par) = fit_transform(x.view(), &par).unwrap();
    let (p_seq, f_seq) = fit_transform(x.view(), &seq).unwrap();

    assert_eq!(p_par.biases, p_seq.biases);
    assert_eq!(f_par, f_seq);
}

#[test]
fn features_lie_in_unit_interval() {
    let x = signals(4, 200);
    let (_, features) = fit_transform(x.view(), &small_config(3_000)).unwrap();
    assert!(features.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn feature_count_follows_dilation_plan() {
    let x = signals(3, 150);
    let (params, features) = fit_transform(x.view(), &MiniRocketConfig::default()).unwrap();

    let per_kernel: usize = params.num_features_per_dilation.iter().sum();
    assert_eq!(features.ncols(), NUM_KERNELS * per_kernel);
    assert_eq!(params.biases.len(), features.ncols());
    // 10 000 / 84 = 119 features per kernel.
    assert_eq!(features.ncols(), 9_996);
    assert_eq!(features.nrows(), 3);
    assert_eq!(params.dilations.len(), params.num_features_per_dilation.len());
}

#[test]
fn default_budget_on_short_series_uses_reference_allocation() {
    let x = signals(2, 20);
    let (params, _) = fit_transform(x.view(), &MiniRocketConfig::default()).unwrap();
    assert_eq!(params.dilations, vec![1, 2]);
    assert_eq!(params.num_features_per_dilation, vec![93, 26]);
}

// ---------------------------------------------------------------------------
// Degenerate input
// ---------------------------------------------------------------------------

#[test]
fn constant_series_gives_binary_cropped_features() {
    let x = Array2::from_elem((3, 16), 5.0f32);
    let plan = DilationPlan::new(vec![1], vec![1]).unwrap();
    let quantiles = quantile_sequence(plan.total_features());

    let (biases, features) = fit_biases_transform(x.view(), &plan, &quantiles, true).unwrap();
    assert_eq!(features.dim(), (3, NUM_KERNELS));
    assert_eq!(biases.len(), NUM_KERNELS);

    for (k, taps) in KERNEL_INDICES.iter().enumerate() {
        // Kernel weights sum to zero, so away from the zero-padded edges the
        // output of a constant series is exactly 0.
        let conv = direct_convolution(x.row(0), taps, 1);
        assert!(conv.slice(s![4..12]).iter().all(|&v| v == 0.0));

        // Every series is identical, so every row of features is too.
        assert_eq!(features[[0, k]], features[[1, k]]);
        assert_eq!(features[[0, k]], features[[2, k]]);

        if crop_parity(0, k) {
            let v = features[[0, k]];
            assert!(v == 0.0 || v == 1.0, "kernel {k}: cropped feature {v} is not binary");
        }
    }
}

// ---------------------------------------------------------------------------
// Hand-computable single-series case
// ---------------------------------------------------------------------------

#[test]
fn ramp_bias_is_interpolated_quantile_of_convolution() {
    let x = Array2::from_shape_fn((1, 20), |(_, t)| t as f32);
    let plan = DilationPlan::new(vec![1], vec![1]).unwrap();
    let quantiles = quantile_sequence(plan.total_features());
    let (biases, features) = fit_biases_transform(x.view(), &plan, &quantiles, false).unwrap();

    // Kernel 0 output: [-10, -15, -21, -25, -27 (x12), -7, 14, 36, 59].
    let conv = direct_convolution(x.row(0), &KERNEL_INDICES[0], 1);
    let mut sorted = conv.to_vec();
    sorted.sort_by(f32::total_cmp);
    assert_eq!(sorted[11], -27.0);
    assert_eq!(sorted[12], -25.0);

    let h = quantiles[0] as f64 * 19.0;
    let t = h - h.floor();
    let expected = -27.0 + 2.0 * t;
    assert_abs_diff_eq!(biases[0] as f64, expected, epsilon = 1e-4);
    assert_abs_diff_eq!(features[[0, 0]], 0.4, epsilon = 1e-7);
}

// ---------------------------------------------------------------------------
// Crop schedule
// ---------------------------------------------------------------------------

/// Kernels 28 (taps 1, 2, 3) and 29 (taps 1, 2, 4) both have a negative tap 0.
/// A unit impulse at position 0 reaches outputs 0..=4; output 4 only sees it
/// through tap 0. With all biases at 0, the uncropped kernel counts the
/// positive outputs 1..=3 while the cropped kernel (which starts at output 4)
/// sees nothing.
#[test]
fn adjacent_kernels_alternate_boundary_sensitivity() {
    let input_length = 20;
    let mut x = Array2::<f32>::zeros((1, input_length));
    x[[0, 0]] = 1.0;

    let params = FittedParameters {
        dilations: vec![1],
        num_features_per_dilation: vec![1],
        biases: vec![0.0; NUM_KERNELS],
    };
    let features = transform(x.view(), &params, false).unwrap();

    assert!(!crop_parity(0, 28));
    assert!(crop_parity(0, 29));
    assert_abs_diff_eq!(features[[0, 28]], 3.0 / input_length as f32, epsilon = 1e-7);
    assert_eq!(features[[0, 29]], 0.0);

    let quiet = Array2::<f32>::zeros((1, input_length));
    let baseline = transform(quiet.view(), &params, false).unwrap();
    assert!(baseline.iter().all(|&v| v == 0.0));
}

/// At the second dilation the checkerboard flips: kernel 28 crops and
/// kernel 29 does not.
#[test]
fn crop_schedule_flips_between_dilations() {
    let input_length = 40;
    let d = 2;
    let p = padding(d);
    let mut x = Array2::<f32>::zeros((1, input_length));
    x[[0, 0]] = 1.0;

    let params = FittedParameters {
        dilations: vec![1, d],
        num_features_per_dilation: vec![1, 1],
        biases: vec![0.0; 2 * NUM_KERNELS],
    };
    let features = transform(x.view(), &params, false).unwrap();

    assert!(crop_parity(1, 28));
    assert!(!crop_parity(1, 29));

    // Kernel 29 (taps 1, 2, 4) at dilation 2, uncropped: outputs 0, 4, 6
    // reach x[0] through positive taps 4, 2, 1.
    let k29 = direct_convolution(x.row(0), &KERNEL_INDICES[29], d);
    let positives = k29.iter().filter(|&&v| v > 0.0).count();
    assert_eq!(positives, 3);
    assert_abs_diff_eq!(
        features[[0, NUM_KERNELS + 29]],
        positives as f32 / input_length as f32,
        epsilon = 1e-7
    );

    // Kernel 28 at dilation 2, cropped to outputs p..L-p: only output p = 8
    // sees x[0], through negative tap 0.
    let k28 = direct_convolution(x.row(0), &KERNEL_INDICES[28], d);
    assert!(k28.slice(s![p..input_length - p]).iter().all(|&v| v <= 0.0));
    assert_eq!(features[[0, NUM_KERNELS + 28]], 0.0);
}

// ---------------------------------------------------------------------------
// Fitted parameters
// ---------------------------------------------------------------------------

#[test]
fn fitted_parameters_transform_new_data() {
    let train = signals(6, 80);
    let test = signals(9, 80).slice(s![3.., ..]).to_owned();
    let cfg = small_config(840);

    let (params, train_features) = fit_transform(train.view(), &cfg).unwrap();
    let test_features = transform(test.view(), &params, true).unwrap();

    assert_eq!(test_features.dim(), (6, train_features.ncols()));
    // Rows 3..6 of the training batch are rows 0..3 of the test batch.
    for r in 0..3 {
        assert_eq!(train_features.row(r + 3), test_features.row(r));
    }
}

#[test]
fn fitted_parameters_survive_json() {
    let x = signals(3, 40);
    let (params, features) = fit_transform(x.view(), &small_config(252)).unwrap();

    let json = serde_json::to_string(&params).unwrap();
    let restored: FittedParameters = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, params);
    assert_eq!(transform(x.view(), &restored, false).unwrap(), features);
}

#[test]
fn transform_rejects_series_too_short_for_fitted_dilations() {
    let x = signals(2, 100);
    let (params, _) = fit_transform(x.view(), &small_config(840)).unwrap();
    let max_dilation = *params.dilations.iter().max().unwrap();
    assert!(max_dilation > 1);

    let short = signals(2, 8 * max_dilation);
    assert!(transform(short.view(), &params, false).is_err());
}
