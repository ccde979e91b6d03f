//! Tests for signal/gradient convolution.

use super::*;
use crate::kernel::{erf_kernel, point_kernel};

fn smooth_signal(n: usize) -> (Vec<f64>, Vec<f64>) {
    let values = (0..n)
        .map(|i| {
            let x = i as f64 / n as f64;
            (-(x - 0.3) * (x - 0.3) * 40.0).exp()
        })
        .collect();
    let gradients = (0..n)
        .map(|i| {
            let x = i as f64 / n as f64;
            x * (-x * 8.0).exp()
        })
        .collect();
    (values, gradients)
}

// ============================================================================
// Spatial convolution
// ============================================================================

#[test]
fn test_spatial_impulse_reproduces_kernel() {
    let kernel = point_kernel(4, 3);
    let values = [2.0, 0.0, 0.0];
    let gradients = [0.0, 0.0, 1.0];
    let mut out_v = Vec::new();
    let mut out_g = Vec::new();
    convolve_spatial(&kernel, &values, &gradients, &mut out_v, &mut out_g);

    assert_eq!(out_v.len(), values.len() + kernel.len() - 1);
    for (i, &k) in kernel.iter().enumerate() {
        assert_eq!(out_v[i], 2.0 * k);
        assert_eq!(out_g[i + 2], k);
    }
    assert_eq!(out_g[0], 0.0);
    assert_eq!(out_v[kernel.len()], 0.0);
}

#[test]
fn test_spatial_preserves_mass() {
    let kernel = erf_kernel(8, 6);
    let (values, gradients) = smooth_signal(500);
    let mut out_v = Vec::new();
    let mut out_g = Vec::new();
    convolve_spatial(&kernel, &values, &gradients, &mut out_v, &mut out_g);

    let in_v: f64 = values.iter().sum();
    let in_g: f64 = gradients.iter().sum();
    assert!((out_v.iter().sum::<f64>() - in_v).abs() < 1e-12 * in_v);
    assert!((out_g.iter().sum::<f64>() - in_g).abs() < 1e-12 * in_g);
}

#[test]
fn test_spatial_reuses_output_buffers() {
    let kernel = point_kernel(2, 2);
    let mut out_v = vec![99.0; 1000];
    let mut out_g = vec![99.0; 1000];
    convolve_spatial(&kernel, &[1.0], &[1.0], &mut out_v, &mut out_g);
    assert_eq!(out_v.len(), kernel.len());
    assert_eq!(out_v, kernel);
    assert!(out_v.capacity() >= 1000);
}

#[test]
#[should_panic(expected = "Signal length mismatch")]
fn test_spatial_length_mismatch_panics() {
    let mut out_v = Vec::new();
    let mut out_g = Vec::new();
    convolve_spatial(&[1.0], &[1.0, 2.0], &[1.0], &mut out_v, &mut out_g);
}

#[test]
fn test_output_len() {
    assert_eq!(output_len(0, 5), 0);
    assert_eq!(output_len(1, 5), 5);
    assert_eq!(output_len(10, 5), 14);
}

// ============================================================================
// FFT convolution
// ============================================================================

#[test]
fn test_fft_matches_spatial() {
    let kernel = erf_kernel(16, 6);
    let (values, gradients) = smooth_signal(1000);

    let mut sv = Vec::new();
    let mut sg = Vec::new();
    convolve_spatial(&kernel, &values, &gradients, &mut sv, &mut sg);

    let mut fv = Vec::new();
    let mut fg = Vec::new();
    FftConvolver::new().convolve(&kernel, &values, &gradients, &mut fv, &mut fg);

    assert_eq!(fv.len(), sv.len());
    let max_v = sv.iter().copied().fold(0.0, f64::max);
    let max_g = sg.iter().copied().fold(0.0, f64::max);
    for i in 0..sv.len() {
        assert!((fv[i] - sv[i]).abs() < 1e-12 * max_v, "value {} differs", i);
        assert!((fg[i] - sg[i]).abs() < 1e-12 * max_g, "gradient {} differs", i);
    }
}

#[test]
fn test_fft_output_is_non_negative() {
    // A spike next to empty space rings under FFT; the ringing is snapped.
    let kernel = point_kernel(4, 6);
    let mut values = vec![0.0; 300];
    values[0] = 1.0;
    values[150] = 1e-3;
    let gradients = values.clone();

    let mut fv = Vec::new();
    let mut fg = Vec::new();
    FftConvolver::new().convolve(&kernel, &values, &gradients, &mut fv, &mut fg);

    assert!(fv.iter().all(|&v| v >= 0.0));
    assert!(fg.iter().all(|&v| v >= 0.0));
    // Far from both spikes nothing real exists
    assert!(fv[100..120].iter().all(|&v| v == 0.0));
}

#[test]
fn test_fft_convolver_handles_changing_sizes() {
    let kernel = point_kernel(2, 3);
    let mut convolver = FftConvolver::new();
    let mut fv = Vec::new();
    let mut fg = Vec::new();
    for n in [10, 300, 10, 65] {
        let values = vec![1.0; n];
        convolver.convolve(&kernel, &values, &values, &mut fv, &mut fg);
        assert_eq!(fv.len(), n + kernel.len() - 1);
        let sum: f64 = fv.iter().sum();
        assert!((sum - n as f64).abs() < 1e-9);
    }
}

#[test]
fn test_artifact_threshold() {
    assert_eq!(artifact_threshold(&[0.0, 0.5, 0.25, 2.0], 0.1), 0.0125);
    assert_eq!(artifact_threshold(&[0.0, 0.0], 0.1), 0.0);
}
