//! Error types for Fisher information evaluation.

use thiserror::Error;

/// Errors raised by engine construction, configuration setters and queries.
///
/// Numerical degradation (Dirac underflow, convolution artifacts, truncated
/// tails) is never reported here; it is absorbed by the engine and logged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("Gain factor must be finite and positive, got {0}")]
    InvalidGain(f64),

    #[error("Gaussian standard deviation must be finite and positive, got {0}")]
    InvalidStandardDeviation(f64),

    #[error("Sampling density must be in [{min}, {max}], got {value}")]
    InvalidSamplingDensity {
        value: usize,
        min: usize,
        max: usize,
    },

    #[error(
        "Kernel truncation of {max_range} SD cannot reach the first sample for standard deviation {s} (s * max_range must be >= 0.5)"
    )]
    KernelTooNarrow { s: f64, max_range: usize },

    #[error("Upper mean threshold must be positive, got {0}")]
    InvalidUpperMeanThreshold(f64),

    #[error("Cumulative probability must be in (0, 1], got {0}")]
    InvalidCumulativeProbability(f64),

    #[error("Relative probability threshold must be in [0, 0.5], got {0}")]
    InvalidRelativeProbabilityThreshold(f64),

    #[error("Poisson mean {mean} is below the minimum representable mean {min}")]
    MeanBelowMinimum { mean: f64, min: f64 },

    #[error("Alpha table needs 0 < min_mean < max_mean and at least one point per decade, got [{min_mean}, {max_mean}] with {points_per_decade} points per decade")]
    InvalidTableRange {
        min_mean: f64,
        max_mean: f64,
        points_per_decade: usize,
    },

    #[error("Alpha table is malformed: {0}")]
    MalformedTable(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
