//! Poisson-Gamma partial densities.
//!
//! An EM-CCD multiplies each photo-electron through a gain register, so the
//! output count for `n` input electrons follows a Gamma distribution with
//! shape `n` and scale `m`. Mixing over `n ~ Poisson(t)` gives the
//! Poisson-Gamma: an atomic mass `exp(-t)` at zero (no electrons) plus a
//! continuous density for `c > 0`.
//!
//! The engine only sees the [`PartialDensity`] trait, so any model with the
//! same shape can be plugged in.

#[cfg(test)]
mod tests;

mod bessel;

pub use bessel::{i0e, i1e};

/// Density of an observation model together with its derivative with respect
/// to the Poisson mean.
pub trait PartialDensity: Send + Sync {
    /// Continuous density at count `c >= 0` for mean `t` and gain `m`, and
    /// its partial derivative with respect to `t`.
    ///
    /// At `c = 0` the right limit of the continuous part is returned; the
    /// atomic mass is reported separately by [`PartialDensity::dirac_mass`].
    fn partial_density(&self, c: f64, t: f64, m: f64) -> (f64, f64);

    /// Probability mass concentrated at `c = 0`.
    fn dirac_mass(&self, t: f64) -> f64;

    /// Derivative of [`PartialDensity::dirac_mass`] with respect to `t`.
    ///
    /// For a Poisson input the mass is `P(n = 0) = exp(-t)` whose derivative
    /// is its negation.
    fn dirac_gradient(&self, t: f64) -> f64 {
        -self.dirac_mass(t)
    }
}

/// The Poisson-Gamma distribution of an EM-gain register.
///
/// For `c > 0`, with `x = 2·√(c·t/m)`:
///
/// ```text
/// p(c)     = exp(-t - c/m) · √(t/(c·m)) · I₁(x)
/// ∂p/∂t(c) = exp(-t - c/m) · I₀(x) / m - p(c)
/// ```
///
/// `exp(-t - c/m)·I(x)` is evaluated as `exp(-(√t - √(c/m))²)·Ie(x)` with the
/// exponentially scaled Bessel functions, so nothing overflows for large
/// counts and the density underflows to exactly zero far in the tail.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoissonGamma;

impl PoissonGamma {
    /// Continuous density only.
    pub fn density(c: f64, t: f64, m: f64) -> f64 {
        Self::evaluate(c, t, m).0
    }

    fn evaluate(c: f64, t: f64, m: f64) -> (f64, f64) {
        if c <= 0.0 {
            let e = (-t).exp();
            return (e * t / m, e * (1.0 - t) / m);
        }

        let c_m = c / m;
        let d = t.sqrt() - c_m.sqrt();
        let envelope = (-d * d).exp();
        if envelope == 0.0 {
            return (0.0, 0.0);
        }

        let x = 2.0 * (c_m * t).sqrt();
        // √(t/(c/m))·I₁(x) = t · 2·I₁(x)/x, finite as x -> 0
        let i1_ratio = if x > 0.0 { 2.0 * i1e(x) / x } else { 1.0 };
        let p = envelope * t * i1_ratio / m;
        let shifted = envelope * i0e(x) / m;
        (p, shifted - p)
    }
}

impl PartialDensity for PoissonGamma {
    fn partial_density(&self, c: f64, t: f64, m: f64) -> (f64, f64) {
        Self::evaluate(c, t, m)
    }

    fn dirac_mass(&self, t: f64) -> f64 {
        (-t).exp()
    }
}
