//! Uniform sampling of the continuous density and its shifted gradient.
//!
//! Sampling starts at `c = 0` and always covers `2·(range + 1)·scale` steps,
//! so the kernel sees the whole neighbourhood of the Dirac spike. After that
//! the sampler keeps growing until both stopping conditions hold:
//!
//! 1. **Height**: past the tail start (or where the density has vanished) the
//!    Fisher integrand `a²/p` has fallen below `relative_threshold` times its
//!    running maximum.
//! 2. **Mass**: the trapezoid sum of the shifted gradient `a = ∂p/∂t + p` has
//!    reached `cumulative_probability`. The Dirac's shifted gradient is zero,
//!    so this sum tends to 1 as the support is covered.
//!
//! Sampling also stops as soon as both `p` and `∂p/∂t` underflow to zero:
//! nothing further can contribute.

use crate::density::PartialDensity;
use crate::quadrature::fisher_integrand;

/// Expected sample count above which an evaluation is logged as costly.
pub const LARGE_SAMPLE_COUNT: usize = 1 << 24;

/// Why the growth loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Height and mass conditions both held.
    Converged,
    /// Density and gradient underflowed to zero.
    SupportExhausted,
}

#[derive(Debug, Clone, Copy)]
pub struct SamplerParams {
    pub mean: f64,
    pub gain: f64,
    /// Step between samples.
    pub step: f64,
    /// Samples taken unconditionally after `c = 0`.
    pub guaranteed_steps: usize,
    /// Count beyond which the height condition may stop the loop.
    pub tail_start: f64,
    pub cumulative_probability: f64,
    pub relative_threshold: f64,
}

impl SamplerParams {
    /// Parameters for mean `t`, gain `m`, read noise `s`, sampled on
    /// `scale` steps per SD with a kernel truncated at `range` SD.
    pub fn new(
        t: f64,
        m: f64,
        s: f64,
        scale: usize,
        range: usize,
        cumulative_probability: f64,
        relative_threshold: f64,
    ) -> Self {
        Self {
            mean: t,
            gain: m,
            step: s / scale as f64,
            guaranteed_steps: 2 * (range + 1) * scale,
            tail_start: 2.0 * t * m + s,
            cumulative_probability,
            relative_threshold,
        }
    }

    /// Lower estimate of the samples needed: the guaranteed block or the
    /// distance to the tail start, whichever is longer.
    pub fn expected_samples(&self) -> usize {
        let to_tail = (self.tail_start / self.step).ceil();
        // Saturating float-to-int cast
        self.guaranteed_steps.max(to_tail as usize).saturating_add(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub samples: usize,
    /// Trapezoid sum of the shifted gradient over the sampled range.
    pub cumulative: f64,
    pub max_integrand: f64,
    pub stop: StopReason,
}

/// Sample `p(c)` into `density` and `a(c) = ∂p/∂t + p` into `shifted` at
/// `c = i·step`. Both buffers are cleared first.
pub fn sample(
    model: &dyn PartialDensity,
    params: &SamplerParams,
    density: &mut Vec<f64>,
    shifted: &mut Vec<f64>,
) -> SampleStats {
    density.clear();
    shifted.clear();

    let expected = params.expected_samples();
    if expected > LARGE_SAMPLE_COUNT {
        tracing::warn!(
            expected,
            mean = params.mean,
            gain = params.gain,
            step = params.step,
            "Sampling needs a very large number of samples"
        );
    }

    let h = params.step;
    let mut take = |i: usize| -> (f64, f64) {
        let (p, g) = model.partial_density(i as f64 * h, params.mean, params.gain);
        let a = p + g;
        density.push(p);
        shifted.push(a);
        (p, a)
    };

    let (p, a) = take(0);
    let mut max_integrand = fisher_integrand(p, a);
    let mut cumulative = 0.5 * a * h;

    for i in 1..=params.guaranteed_steps {
        let (p, a) = take(i);
        max_integrand = max_integrand.max(fisher_integrand(p, a));
        cumulative += a * h;
    }

    let mut i = params.guaranteed_steps;
    let stop = loop {
        i += 1;
        let (p, a) = take(i);
        cumulative += a * h;
        let integrand = fisher_integrand(p, a);
        max_integrand = max_integrand.max(integrand);

        // a == p + g, both zero only when p and g are
        if p == 0.0 && a == 0.0 {
            break StopReason::SupportExhausted;
        }
        let in_tail = p == 0.0 || i as f64 * h > params.tail_start;
        if in_tail
            && integrand < params.relative_threshold * max_integrand
            && cumulative >= params.cumulative_probability
        {
            break StopReason::Converged;
        }
    };

    tracing::trace!(
        samples = i + 1,
        cumulative,
        ?stop,
        "Sampling finished"
    );

    SampleStats {
        samples: i + 1,
        cumulative,
        max_integrand,
        stop,
    }
}
