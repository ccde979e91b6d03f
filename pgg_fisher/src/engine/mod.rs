//! Fisher information engine for the Poisson-Gamma-Gaussian model.
//!
//! This module contains [`PggFisherInformation`] together with its
//! [`Workspace`] and per-call [`Diagnostics`].


// =============================================================================
// Imports
// =============================================================================

use std::sync::Arc;

use common::FloatExt;

use crate::config::{self, Config, ConvolutionMethod};
use crate::convolution::{convolve_spatial, FftConvolver, SPATIAL_WORK_LIMIT};
use crate::density::{PartialDensity, PoissonGamma};
use crate::error::Result;
use crate::information::{check_mean, FisherInformation};
use crate::kernel::{GaussianKernelCache, KernelFlavour, KernelProvider};
use crate::quadrature::{integrate_fisher, QuadratureRule};
use crate::sampler::{self, SamplerParams, StopReason};
use crate::selector;

/// Relative slack on the information bounds before a violation is logged.
const BOUND_TOLERANCE: f64 = 1e-2;

/// State of the most recent non-asymptotic evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    /// Poisson mean `t` of the query.
    pub mean: f64,
    /// Samples per read-noise standard deviation.
    pub scale: usize,
    /// Kernel truncation in standard deviations.
    pub range: usize,
    /// Sampling step `h = s / scale`.
    pub step: f64,
    /// Count of the first convolved sample, `-h·(kernel_len / 2)`.
    pub offset: f64,
    /// Atomic mass at zero, `exp(-t)`.
    pub dirac: f64,
    /// Number of samples of the continuous density.
    pub samples: usize,
    /// Number of samples after convolution.
    pub convolved_samples: usize,
    /// Trapezoid sum of the shifted gradient when sampling stopped.
    pub cumulative: f64,
    pub stop: StopReason,
    pub kernel: KernelFlavour,
    /// Convolution routine actually used, never `Auto`.
    pub convolution: ConvolutionMethod,
    /// Information before clipping to the bounds.
    pub raw_information: f64,
    /// Returned information.
    pub information: f64,
}

/// Reusable buffers owned by one engine.
///
/// Every query overwrites the buffers, so the contents describe the last
/// non-asymptotic call only.
#[derive(Debug, Default)]
pub struct Workspace {
    /// Continuous density `p(i·h)`.
    density: Vec<f64>,
    /// Shifted gradient `∂p/∂t + p` at `i·h`.
    shifted: Vec<f64>,
    /// Per-bin masses with trapezoid weights and the Dirac at bin 0.
    mass: Vec<f64>,
    shifted_mass: Vec<f64>,
    convolved_mass: Vec<f64>,
    convolved_shifted_mass: Vec<f64>,
    fft: FftConvolver,
    last: Option<Diagnostics>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampled density and shifted gradient (density units).
    pub fn samples(&self) -> (&[f64], &[f64]) {
        (&self.density, &self.shifted)
    }

    /// Convolved masses `P` and shifted masses `A`.
    pub fn convolved(&self) -> (&[f64], &[f64]) {
        (&self.convolved_mass, &self.convolved_shifted_mass)
    }

    /// Drop the last evaluation. Capacity is kept.
    pub fn clear(&mut self) {
        self.density.clear();
        self.shifted.clear();
        self.mass.clear();
        self.shifted_mass.clear();
        self.convolved_mass.clear();
        self.convolved_shifted_mass.clear();
        self.last = None;
    }
}

// =============================================================================
// PggFisherInformation
// =============================================================================

/// Fisher information of a Poisson mean observed through an EM-gain register
/// (Poisson-Gamma) followed by Gaussian read noise.
///
/// The continuous Poisson-Gamma density and its gradient are sampled from
/// `c = 0`, the Dirac mass `exp(-t)` is added to the first sample, the pair is
/// convolved with a unit Gaussian kernel scaled to `s`, and
///
/// ```text
/// I(t) = ∫ A²/P - 1,    A = ∂P/∂t + P
/// ```
///
/// is integrated with a composite Newton-Cotes rule. The result is clipped to
/// `[t > 1 ? 1/(2t) : 0, 1/t]`. Above `upper_mean_threshold`, or where
/// `exp(-t)` underflows, the half-Poisson asymptote `1/(2t)` is returned.
///
/// One engine serves one thread at a time: queries take `&mut self` and reuse
/// the [`Workspace`]. Clone an engine per thread; clones share the kernel
/// provider but get a fresh workspace.
///
/// # Example
///
/// ```rust,ignore
/// use pgg_fisher::PggFisherInformation;
///
/// let mut engine = PggFisherInformation::new(250.0, 10.0)?;
/// let information = engine.fisher_information(3.0)?;
/// let alpha = engine.alpha(3.0)?;
/// ```
pub struct PggFisherInformation {
    config: Config,
    density: Arc<dyn PartialDensity>,
    kernels: Arc<dyn KernelProvider>,
    workspace: Workspace,
}

impl std::fmt::Debug for PggFisherInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PggFisherInformation")
            .field("config", &self.config)
            .field("last", &self.workspace.last)
            .finish_non_exhaustive()
    }
}

impl Clone for PggFisherInformation {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            density: Arc::clone(&self.density),
            kernels: Arc::clone(&self.kernels),
            workspace: Workspace::new(),
        }
    }
}

impl PggFisherInformation {
    /// Engine for gain `m` and read noise `s` with default settings.
    pub fn new(gain: f64, standard_deviation: f64) -> Result<Self> {
        Self::from_config(Config::new(gain, standard_deviation))
    }

    pub fn with_sampling_density(
        gain: f64,
        standard_deviation: f64,
        sampling_density: usize,
    ) -> Result<Self> {
        Self::from_config(Config {
            sampling_density,
            ..Config::new(gain, standard_deviation)
        })
    }

    /// Engine with the Poisson-Gamma density and a private kernel cache.
    pub fn from_config(config: Config) -> Result<Self> {
        Self::with_providers(
            config,
            Arc::new(PoissonGamma),
            Arc::new(GaussianKernelCache::new()),
        )
    }

    /// Engine with injected density model and kernel provider.
    ///
    /// Range fields are clipped into `[1, 38]` before validation.
    pub fn with_providers(
        mut config: Config,
        density: Arc<dyn PartialDensity>,
        kernels: Arc<dyn KernelProvider>,
    ) -> Result<Self> {
        config.clip_ranges();
        config.validate()?;

        tracing::debug!(
            gain = config.gain,
            standard_deviation = config.standard_deviation,
            sampling_density = config.sampling_density,
            "Created Fisher information engine"
        );

        Ok(Self {
            config,
            density,
            kernels,
            workspace: Workspace::new(),
        })
    }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gain(&self) -> f64 {
        self.config.gain
    }

    pub fn standard_deviation(&self) -> f64 {
        self.config.standard_deviation
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Set the smallest kernel truncation, clipped to `[1, 38]`.
    pub fn set_min_range(&mut self, min_range: usize) {
        self.config.min_range = config::clip_range(min_range);
    }

    /// Set the largest kernel truncation, clipped to `[1, 38]`.
    ///
    /// Fails if the clipped truncation cannot reach the first sample.
    pub fn set_max_range(&mut self, max_range: usize) -> Result<()> {
        let max_range = config::clip_range(max_range);
        config::validate_kernel_reach(self.config.standard_deviation, max_range)?;
        self.config.max_range = max_range;
        Ok(())
    }

    pub fn set_upper_mean_threshold(&mut self, threshold: f64) -> Result<()> {
        config::validate_upper_mean_threshold(threshold)?;
        self.config.upper_mean_threshold = threshold;
        Ok(())
    }

    pub fn set_cumulative_probability(&mut self, p: f64) -> Result<()> {
        config::validate_cumulative_probability(p)?;
        self.config.cumulative_probability = p;
        Ok(())
    }

    pub fn set_relative_probability_threshold(&mut self, p: f64) -> Result<()> {
        config::validate_relative_probability_threshold(p)?;
        self.config.relative_probability_threshold = p;
        Ok(())
    }

    pub fn set_use_cubic_quadrature(&mut self, use_cubic: bool) {
        self.config.use_cubic_quadrature = use_cubic;
    }

    pub fn set_convolution_method(&mut self, method: ConvolutionMethod) {
        self.config.convolution = method;
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Fisher information `I(t)` for Poisson mean `t`.
    ///
    /// Fails for NaN and for `t` below [`crate::MIN_MEAN`].
    pub fn fisher_information(&mut self, t: f64) -> Result<f64> {
        check_mean(t)?;

        let dirac = self.density.dirac_mass(t);
        if t > self.config.upper_mean_threshold || dirac == 0.0 {
            self.workspace.last = None;
            return Ok(0.5 / t);
        }

        let (lower, upper) = information_bounds(t);
        let raw = self.compute(t, dirac);

        if raw < lower * (1.0 - BOUND_TOLERANCE) || raw > upper * (1.0 + BOUND_TOLERANCE) {
            tracing::warn!(
                t,
                raw,
                lower,
                upper,
                "Fisher information outside its bounds, clipping"
            );
        }

        let information = raw.clip(lower, upper);
        if let Some(last) = self.workspace.last.as_mut() {
            last.information = information;
        }
        Ok(information)
    }

    /// `t · I(t)`, exactly `0.5` above the upper mean threshold.
    pub fn alpha(&mut self, t: f64) -> Result<f64> {
        let information = self.fisher_information(t)?;
        if t > self.config.upper_mean_threshold {
            return Ok(0.5);
        }
        Ok(t * information)
    }

    /// The integrand of the last non-asymptotic call as `(xs, ys)`.
    ///
    /// With convolution, `xs` are observed counts starting at the convolved
    /// offset and `ys = (A - P)²/P` in density units. Without, `xs` are the
    /// sampled counts `i·h` and `ys = (∂p/∂t)²/p` of the continuous part.
    /// `None` before the first call and after an asymptotic one.
    pub fn fisher_information_function(
        &self,
        with_gaussian_convolution: bool,
    ) -> Option<(Vec<f64>, Vec<f64>)> {
        let last = self.workspace.last.as_ref()?;
        let h = last.step;

        let curve = if with_gaussian_convolution {
            let ws = &self.workspace;
            let xs = (0..ws.convolved_mass.len())
                .map(|j| last.offset + j as f64 * h)
                .collect();
            let ys = ws
                .convolved_mass
                .iter()
                .zip(&ws.convolved_shifted_mass)
                .map(|(&p, &a)| gradient_integrand(p, a) / h)
                .collect();
            (xs, ys)
        } else {
            let ws = &self.workspace;
            let xs = (0..ws.density.len()).map(|i| i as f64 * h).collect();
            let ys = ws
                .density
                .iter()
                .zip(&ws.shifted)
                .map(|(&p, &a)| gradient_integrand(p, a))
                .collect();
            (xs, ys)
        };
        Some(curve)
    }

    /// Diagnostics of the last non-asymptotic call.
    pub fn last_diagnostics(&self) -> Option<&Diagnostics> {
        self.workspace.last.as_ref()
    }

    /// Total probability of the last convolved signal, Dirac included.
    pub fn last_convolved_mass(&self) -> Option<f64> {
        self.workspace.last.as_ref()?;
        Some(self.workspace.convolved_mass.iter().sum())
    }

    // -------------------------------------------------------------------------
    // Evaluation
    // -------------------------------------------------------------------------

    fn compute(&mut self, t: f64, dirac: f64) -> f64 {
        let m = self.config.gain;
        let s = self.config.standard_deviation;

        // Step 1: Pick oversampling and kernel truncation
        let selection = selector::select(
            t,
            m,
            s,
            self.config.sampling_density,
            self.config.min_range,
            self.config.max_range,
        );
        let h = selection.step(s);

        // Step 2: Sample the continuous density and shifted gradient
        let params = SamplerParams::new(
            t,
            m,
            s,
            selection.scale,
            selection.range,
            self.config.cumulative_probability,
            self.config.relative_probability_threshold,
        );
        let ws = &mut self.workspace;
        let stats = sampler::sample(&*self.density, &params, &mut ws.density, &mut ws.shifted);

        // Step 3: Bin masses, half weight at the edge, Dirac at bin 0
        ws.mass.clear();
        ws.mass.extend(ws.density.iter().map(|&p| p * h));
        ws.shifted_mass.clear();
        ws.shifted_mass.extend(ws.shifted.iter().map(|&a| a * h));
        ws.mass[0] = 0.5 * ws.mass[0] + dirac;
        ws.shifted_mass[0] =
            0.5 * ws.shifted_mass[0] + dirac + self.density.dirac_gradient(t);

        // Step 4: Convolve with the read-noise kernel
        let (kernel, flavour) = match self
            .kernels
            .erf_gaussian_kernel(selection.scale, selection.range)
        {
            Some(kernel) => (kernel, KernelFlavour::Erf),
            None => (
                self.kernels
                    .unit_gaussian_kernel(selection.scale, selection.range),
                KernelFlavour::Point,
            ),
        };
        let method = resolve_convolution(self.config.convolution, ws.mass.len(), kernel.len());
        match method {
            ConvolutionMethod::Fft => ws.fft.convolve(
                &kernel,
                &ws.mass,
                &ws.shifted_mass,
                &mut ws.convolved_mass,
                &mut ws.convolved_shifted_mass,
            ),
            _ => convolve_spatial(
                &kernel,
                &ws.mass,
                &ws.shifted_mass,
                &mut ws.convolved_mass,
                &mut ws.convolved_shifted_mass,
            ),
        }

        // Step 5: Integrate A²/P; the shifted gradient adds exactly 1
        let rule = QuadratureRule::from_cubic(self.config.use_cubic_quadrature);
        let raw = integrate_fisher(rule, &ws.convolved_mass, &ws.convolved_shifted_mass) - 1.0;

        tracing::debug!(
            t,
            scale = selection.scale,
            range = selection.range,
            samples = stats.samples,
            convolved = ws.convolved_mass.len(),
            ?method,
            raw,
            "Evaluated Fisher information"
        );

        ws.last = Some(Diagnostics {
            mean: t,
            scale: selection.scale,
            range: selection.range,
            step: h,
            offset: -h * (kernel.len() / 2) as f64,
            dirac,
            samples: stats.samples,
            convolved_samples: ws.convolved_mass.len(),
            cumulative: stats.cumulative,
            stop: stats.stop,
            kernel: flavour,
            convolution: method,
            raw_information: raw,
            information: raw,
        });

        raw
    }
}

impl FisherInformation for PggFisherInformation {
    fn fisher_information(&mut self, t: f64) -> Result<f64> {
        PggFisherInformation::fisher_information(self, t)
    }

    fn alpha(&mut self, t: f64) -> Result<f64> {
        PggFisherInformation::alpha(self, t)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// `[t > 1 ? 1/(2t) : 0, 1/t]`.
pub fn information_bounds(t: f64) -> (f64, f64) {
    let lower = if t > 1.0 { 0.5 / t } else { 0.0 };
    (lower, 1.0 / t)
}

/// Resolve `Auto` from the spatial work estimate.
pub fn resolve_convolution(
    method: ConvolutionMethod,
    signal_len: usize,
    kernel_len: usize,
) -> ConvolutionMethod {
    match method {
        ConvolutionMethod::Auto => {
            if signal_len.saturating_mul(kernel_len) > SPATIAL_WORK_LIMIT {
                ConvolutionMethod::Fft
            } else {
                ConvolutionMethod::Spatial
            }
        }
        other => other,
    }
}

/// `(A - P)²/P`, zero where `P` has no mass.
#[inline]
fn gradient_integrand(p: f64, a: f64) -> f64 {
    if p > 0.0 {
        let g = a - p;
        g * g / p
    } else {
        0.0
    }
}
