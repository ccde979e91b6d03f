//! pgg_fisher - Fisher information for EM-CCD photon counting.
//!
//! An EM-CCD pixel reports Poisson photo-electrons amplified by a gain
//! register (Poisson-Gamma) and blurred by Gaussian read noise. This library
//! computes the Fisher information `I(t)` about the Poisson mean `t` for that
//! Poisson-Gamma-Gaussian model, and the relative information
//! `alpha(t) = t·I(t)` used to weight likelihoods in single-molecule
//! localisation.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pgg_fisher::{AlphaTable, PggFisherInformation, TableConfig};
//!
//! // Sensor with gain 250 and read noise 10 counts
//! let mut engine = PggFisherInformation::new(250.0, 10.0)?;
//! let information = engine.fisher_information(2.5)?;
//! let alpha = engine.alpha(2.5)?;
//!
//! // Tabulate alpha once, interpolate afterwards
//! let table = AlphaTable::build(&engine, &TableConfig::default())?;
//! let alpha = table.alpha(0.7)?;
//! ```

pub mod config;
pub mod convolution;
pub mod density;
mod engine;
mod error;
mod information;
pub mod kernel;
pub(crate) mod quadrature;
pub(crate) mod sampler;
pub mod selector;
mod table;

pub mod prelude;

// ============================================================================
// Engine
// ============================================================================

pub use engine::{information_bounds, Diagnostics, PggFisherInformation, Workspace};
pub use information::{
    check_mean, FisherInformation, HalfPoissonFisherInformation, PoissonFisherInformation,
};
pub use sampler::StopReason;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{Config, ConvolutionMethod, MAX_RANGE_LIMIT, MIN_MEAN, MIN_RANGE_LIMIT};
pub use table::{AlphaTable, AlphaTableData, TableConfig};

// ============================================================================
// Providers
// ============================================================================

pub use density::{PartialDensity, PoissonGamma};
pub use kernel::{GaussianKernelCache, KernelFlavour, KernelProvider};

// ============================================================================
// Errors
// ============================================================================

pub use error::{Error, Result};
