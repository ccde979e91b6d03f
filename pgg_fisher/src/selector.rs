//! Oversampling and kernel truncation selection.
//!
//! The cost of one evaluation is the number of samples (`∝ scale`) times the
//! kernel length (`∝ scale · range`), so both are kept as small as the shape
//! of the distribution allows:
//!
//! - `range` widens by one standard deviation per power of two that `t` lies
//!   below 1. Small means leave almost all mass in the Dirac spike and the
//!   information sits in the far Gaussian tails of the read noise.
//! - `scale` is the largest of the sampling-density baseline, the Dirac
//!   heuristic `⌈2m/t⌉` and the spacing bound that puts at least
//!   [`STEPS_PER_EXTENT`] samples across the natural extent `m·max(t, 1)`,
//!   rounded up to a power of two and capped at [`MAX_SCALE`].

use crate::config::MAX_SCALE;

/// Minimum number of samples across the natural extent of the distribution.
pub const STEPS_PER_EXTENT: f64 = 64.0;

/// Oversampling factor and kernel truncation chosen for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Samples per Gaussian standard deviation (power of two).
    pub scale: usize,
    /// Kernel truncation in standard deviations.
    pub range: usize,
}

impl Selection {
    /// Sampling step `h = s / scale`.
    #[inline]
    pub fn step(&self, s: f64) -> f64 {
        s / self.scale as f64
    }

    /// Number of kernel taps.
    #[inline]
    pub fn kernel_len(&self) -> usize {
        2 * self.range * self.scale + 1
    }
}

/// Choose `(scale, range)` for mean `t`, gain `m` and read noise `s`.
pub fn select(
    t: f64,
    m: f64,
    s: f64,
    sampling_density: usize,
    min_range: usize,
    max_range: usize,
) -> Selection {
    Selection {
        scale: select_scale(t, m, s, sampling_density),
        range: select_range(t, min_range, max_range),
    }
}

/// `min_range` plus one per power of two below 1, clipped to
/// `[min_range, max_range]`. When the bounds cross, `max_range` wins.
pub fn select_range(t: f64, min_range: usize, max_range: usize) -> usize {
    let below_one = (-binary_exponent(t)).max(0) as usize;
    min_range.saturating_add(below_one).min(max_range)
}

pub fn select_scale(t: f64, m: f64, s: f64, sampling_density: usize) -> usize {
    let cap = MAX_SCALE as f64;

    // The Dirac mass exp(-t) against the continuous density at zero,
    // exp(-t)·t/m, is m/t.
    let dirac = (2.0 * m / t).min(cap);

    let extent = m * t.max(1.0);
    let spacing = (s * STEPS_PER_EXTENT / extent).min(cap);

    let scale = (sampling_density as f64).max(dirac).max(spacing).ceil() as usize;
    scale.next_power_of_two().min(MAX_SCALE)
}

/// Exponent `e` such that `2^e <= t < 2^(e+1)`, for finite positive `t`.
pub fn binary_exponent(t: f64) -> i32 {
    debug_assert!(t > 0.0 && t.is_finite());
    let bits = t.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    if biased == 0 {
        // Subnormal: normalise through the mantissa's leading zeros.
        let mantissa = bits & ((1u64 << 52) - 1);
        -1022 - (mantissa.leading_zeros() as i32 - 11)
    } else {
        biased - 1023
    }
}
