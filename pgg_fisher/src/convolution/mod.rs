//! Full linear convolution of a density/gradient signal pair with a kernel.
//!
//! Both routines produce `n + k - 1` outputs for `n` inputs and a `k`-tap
//! kernel: the support is extended by half a kernel on each side.
//!
//! - [`convolve_spatial`] is exact and is the default. The Dirac spike at the
//!   first sample convolves to exactly the kernel shape.
//! - [`FftConvolver`] is `O((n + k) log(n + k))`. The two real signals are
//!   packed into one complex transform. Round-off leaves tiny non-zero values
//!   where the true result is zero; anything below the smallest contribution a
//!   real sample can make (`min positive input · kernel[0]`) is snapped to 0.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Work estimate (`n · k` multiply-adds) above which `Auto` switches to FFT.
pub const SPATIAL_WORK_LIMIT: usize = 1 << 24;

/// Direct full convolution of `values` and `gradients` with `kernel`.
///
/// Outputs are cleared and resized; their capacity is reused.
pub fn convolve_spatial(
    kernel: &[f64],
    values: &[f64],
    gradients: &[f64],
    out_values: &mut Vec<f64>,
    out_gradients: &mut Vec<f64>,
) {
    assert_eq!(values.len(), gradients.len(), "Signal length mismatch");
    assert!(!kernel.is_empty(), "Kernel must not be empty");

    let len = output_len(values.len(), kernel.len());
    reset(out_values, len);
    reset(out_gradients, len);

    // Scatter each input sample; symmetric kernels need no flip.
    for (i, (&v, &g)) in values.iter().zip(gradients).enumerate() {
        if v == 0.0 && g == 0.0 {
            continue;
        }
        let out_v = &mut out_values[i..i + kernel.len()];
        let out_g = &mut out_gradients[i..i + kernel.len()];
        for ((ov, og), &k) in out_v.iter_mut().zip(out_g.iter_mut()).zip(kernel) {
            *ov += v * k;
            *og += g * k;
        }
    }
}

/// FFT convolution with cached plans and buffers.
///
/// Not shared between engines: each engine owns one inside its workspace.
#[derive(Default)]
pub struct FftConvolver {
    plans: Option<Plans>,
    signal: Vec<Complex<f64>>,
    kernel: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

#[derive(Clone)]
struct Plans {
    size: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for FftConvolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftConvolver")
            .field("size", &self.plans.as_ref().map(|p| p.size))
            .finish()
    }
}

impl FftConvolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// FFT full convolution of `values` and `gradients` with `kernel`.
    pub fn convolve(
        &mut self,
        kernel: &[f64],
        values: &[f64],
        gradients: &[f64],
        out_values: &mut Vec<f64>,
        out_gradients: &mut Vec<f64>,
    ) {
        assert_eq!(values.len(), gradients.len(), "Signal length mismatch");
        assert!(!kernel.is_empty(), "Kernel must not be empty");

        let len = output_len(values.len(), kernel.len());
        let size = len.next_power_of_two();
        let plans = self.plans(size);

        // Pack both real signals: conv(v + i·g, k) = conv(v, k) + i·conv(g, k)
        self.signal.clear();
        self.signal.extend(
            values
                .iter()
                .zip(gradients)
                .map(|(&v, &g)| Complex::new(v, g)),
        );
        self.signal.resize(size, Complex::new(0.0, 0.0));

        self.kernel.clear();
        self.kernel.extend(kernel.iter().map(|&k| Complex::new(k, 0.0)));
        self.kernel.resize(size, Complex::new(0.0, 0.0));

        let scratch_len = plans
            .forward
            .get_inplace_scratch_len()
            .max(plans.inverse.get_inplace_scratch_len());
        self.scratch.resize(scratch_len, Complex::new(0.0, 0.0));

        plans
            .forward
            .process_with_scratch(&mut self.signal, &mut self.scratch);
        plans
            .forward
            .process_with_scratch(&mut self.kernel, &mut self.scratch);
        for (s, k) in self.signal.iter_mut().zip(&self.kernel) {
            *s *= *k;
        }
        plans
            .inverse
            .process_with_scratch(&mut self.signal, &mut self.scratch);

        let norm = 1.0 / size as f64;
        out_values.clear();
        out_values.extend(self.signal[..len].iter().map(|c| c.re * norm));
        out_gradients.clear();
        out_gradients.extend(self.signal[..len].iter().map(|c| c.im * norm));

        snap_artifacts(out_values, artifact_threshold(values, kernel[0]));
        snap_artifacts(out_gradients, artifact_threshold(gradients, kernel[0]));
    }

    fn plans(&mut self, size: usize) -> Plans {
        if let Some(plans) = &self.plans {
            if plans.size == size {
                return plans.clone();
            }
        }
        let mut planner = FftPlanner::new();
        let plans = Plans {
            size,
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
        };
        self.plans = Some(plans.clone());
        plans
    }
}

#[inline]
pub fn output_len(signal_len: usize, kernel_len: usize) -> usize {
    if signal_len == 0 {
        0
    } else {
        signal_len + kernel_len - 1
    }
}

fn reset(buffer: &mut Vec<f64>, len: usize) {
    buffer.clear();
    buffer.resize(len, 0.0);
}

/// Half the smallest value a real input sample can contribute through the
/// kernel. The halving keeps genuine edge samples that round-off pushed just
/// under the exact product.
fn artifact_threshold(input: &[f64], kernel_edge: f64) -> f64 {
    let min_positive = input
        .iter()
        .copied()
        .filter(|&v| v > 0.0)
        .fold(f64::INFINITY, f64::min);
    if min_positive.is_finite() {
        0.5 * min_positive * kernel_edge
    } else {
        0.0
    }
}

/// Zero every sample below `threshold`. Signals are non-negative, so
/// negative round-off is zeroed as well.
fn snap_artifacts(output: &mut [f64], threshold: f64) {
    for v in output.iter_mut() {
        if *v < threshold || *v <= 0.0 {
            *v = 0.0;
        }
    }
}
