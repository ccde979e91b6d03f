//! Configuration for the Poisson-Gamma-Gaussian Fisher information engine.
//!
//! [`Config`] is a flat struct grouped into sections: the sensor model, the
//! Gaussian kernel truncation, the tail stopping rule and the integration
//! settings. Every field has a default so partial settings files deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Smallest Poisson mean accepted by a query. `1 / MIN_MEAN` is finite.
pub const MIN_MEAN: f64 = f64::MIN_POSITIVE;

/// Lower clip for kernel truncation (in standard deviations).
pub const MIN_RANGE_LIMIT: usize = 1;

/// Upper clip for kernel truncation. At 38 SD the Gaussian is exactly zero in
/// double precision.
pub const MAX_RANGE_LIMIT: usize = 38;

pub const DEFAULT_MIN_RANGE: usize = 6;
pub const DEFAULT_MAX_RANGE: usize = MAX_RANGE_LIMIT;

/// Mean above which the half-Poisson asymptote `1/(2t)` is returned.
pub const DEFAULT_UPPER_MEAN_THRESHOLD: f64 = 200.0;

pub const DEFAULT_CUMULATIVE_PROBABILITY: f64 = 1.0 - 1e-6;
pub const DEFAULT_RELATIVE_PROBABILITY_THRESHOLD: f64 = 1e-5;

/// Baseline samples per Gaussian standard deviation.
pub const DEFAULT_SAMPLING_DENSITY: usize = 4;

/// Largest oversampling factor the selector will pick.
pub const MAX_SCALE: usize = 128;

// ============================================================================
// Enums
// ============================================================================

/// Convolution routine used to apply the Gaussian read-noise kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvolutionMethod {
    /// Spatial unless the work estimate exceeds the spatial limit, then FFT.
    #[default]
    Auto,
    /// Exact direct convolution. Preserves the Dirac edge.
    Spatial,
    /// FFT convolution with wraparound artifacts snapped to zero.
    Fft,
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -- Sensor ---------------------------------------------------------------
    /// EM gain multiplication factor `m`.
    pub gain: f64,
    /// Gaussian read noise standard deviation `s` (in counts).
    pub standard_deviation: f64,
    /// Minimum samples per standard deviation, in `[1, MAX_SCALE]`.
    pub sampling_density: usize,

    // -- Kernel truncation (standard deviations, clipped to [1, 38]) ---------
    pub min_range: usize,
    pub max_range: usize,

    // -- Tail stopping --------------------------------------------------------
    pub upper_mean_threshold: f64,
    /// Target cumulative probability of the sampled distribution, in (0, 1].
    pub cumulative_probability: f64,
    /// Tail integrand height relative to its maximum, in [0, 0.5].
    pub relative_probability_threshold: f64,

    // -- Integration ----------------------------------------------------------
    /// Simpson 3/8 when true, classic Simpson otherwise.
    pub use_cubic_quadrature: bool,
    pub convolution: ConvolutionMethod,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gain: 1.0,
            standard_deviation: 1.0,
            sampling_density: DEFAULT_SAMPLING_DENSITY,
            min_range: DEFAULT_MIN_RANGE,
            max_range: DEFAULT_MAX_RANGE,
            upper_mean_threshold: DEFAULT_UPPER_MEAN_THRESHOLD,
            cumulative_probability: DEFAULT_CUMULATIVE_PROBABILITY,
            relative_probability_threshold: DEFAULT_RELATIVE_PROBABILITY_THRESHOLD,
            use_cubic_quadrature: true,
            convolution: ConvolutionMethod::Auto,
        }
    }
}

impl Config {
    /// Default settings for a sensor with gain `m` and read noise `s`.
    pub fn new(gain: f64, standard_deviation: f64) -> Self {
        Self {
            gain,
            standard_deviation,
            ..Self::default()
        }
    }

    /// Clip the kernel truncation fields into `[1, 38]`.
    pub fn clip_ranges(&mut self) {
        self.min_range = clip_range(self.min_range);
        self.max_range = clip_range(self.max_range);
    }

    /// Validate the configuration.
    ///
    /// Range fields are judged after clipping, so an out-of-range value is
    /// not an error by itself.
    pub fn validate(&self) -> Result<()> {
        validate_gain(self.gain)?;
        validate_standard_deviation(self.standard_deviation)?;
        if !(1..=MAX_SCALE).contains(&self.sampling_density) {
            return Err(Error::InvalidSamplingDensity {
                value: self.sampling_density,
                min: 1,
                max: MAX_SCALE,
            });
        }
        validate_kernel_reach(self.standard_deviation, clip_range(self.max_range))?;
        validate_upper_mean_threshold(self.upper_mean_threshold)?;
        validate_cumulative_probability(self.cumulative_probability)?;
        validate_relative_probability_threshold(self.relative_probability_threshold)?;
        Ok(())
    }
}

// ============================================================================
// Field checks, shared with the engine setters
// ============================================================================

#[inline]
pub(crate) fn clip_range(range: usize) -> usize {
    range.clamp(MIN_RANGE_LIMIT, MAX_RANGE_LIMIT)
}

pub(crate) fn validate_gain(gain: f64) -> Result<()> {
    if gain.is_finite() && gain > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidGain(gain))
    }
}

pub(crate) fn validate_standard_deviation(s: f64) -> Result<()> {
    if s.is_finite() && s > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidStandardDeviation(s))
    }
}

pub(crate) fn validate_kernel_reach(s: f64, max_range: usize) -> Result<()> {
    if s * max_range as f64 >= 0.5 {
        Ok(())
    } else {
        Err(Error::KernelTooNarrow { s, max_range })
    }
}

pub(crate) fn validate_upper_mean_threshold(threshold: f64) -> Result<()> {
    // Infinity is allowed: Dirac underflow still switches to the asymptote.
    if threshold > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidUpperMeanThreshold(threshold))
    }
}

pub(crate) fn validate_cumulative_probability(p: f64) -> Result<()> {
    if p > 0.0 && p <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidCumulativeProbability(p))
    }
}

pub(crate) fn validate_relative_probability_threshold(p: f64) -> Result<()> {
    if (0.0..=0.5).contains(&p) {
        Ok(())
    } else {
        Err(Error::InvalidRelativeProbabilityThreshold(p))
    }
}
