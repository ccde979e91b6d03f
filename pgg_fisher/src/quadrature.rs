//! Composite Newton-Cotes rules over uniformly spaced samples.
//!
//! The sampled functions here decay to zero at both ends of the sampled
//! range, so no explicit closing term is applied: the weight pattern simply
//! runs to the last sample.

/// Newton-Cotes rule used to integrate the Fisher integrand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadratureRule {
    /// Weights `1, 4, 2, 4, 2, …` times `h/3`.
    Simpson,
    /// Weights `1, 3, 3, 2, 3, 3, 2, …` times `3h/8`.
    Simpson38,
}

impl QuadratureRule {
    pub fn from_cubic(use_cubic: bool) -> Self {
        if use_cubic {
            Self::Simpson38
        } else {
            Self::Simpson
        }
    }

    /// Weight of sample `i`, before the rule factor.
    #[inline]
    pub fn weight(self, i: usize) -> f64 {
        match self {
            Self::Simpson => {
                if i == 0 {
                    1.0
                } else if i % 2 == 1 {
                    4.0
                } else {
                    2.0
                }
            }
            Self::Simpson38 => {
                if i == 0 {
                    1.0
                } else if i % 3 == 0 {
                    2.0
                } else {
                    3.0
                }
            }
        }
    }

    /// Overall factor in units of the step `h`.
    #[inline]
    pub fn factor(self) -> f64 {
        match self {
            Self::Simpson => 1.0 / 3.0,
            Self::Simpson38 => 3.0 / 8.0,
        }
    }

    /// Integrate `values` sampled with step `h`.
    pub fn integrate(self, values: impl IntoIterator<Item = f64>, h: f64) -> f64 {
        let sum: f64 = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| self.weight(i) * v)
            .sum();
        sum * self.factor() * h
    }
}

/// Per-sample Fisher integrand `A²/P`, zero where `P` has no mass.
#[inline]
pub fn fisher_integrand(p: f64, a: f64) -> f64 {
    if p > 0.0 {
        a * a / p
    } else {
        0.0
    }
}

/// Integrate `A²/P` over a convolved signal held as per-bin masses.
///
/// With bin masses `P = h·p(z)` and `A = h·a(z)` the density integrand is
/// `a²/p = A²/(h·P)`, so the step cancels against the rule's `h`.
pub fn integrate_fisher(rule: QuadratureRule, p: &[f64], a: &[f64]) -> f64 {
    debug_assert_eq!(p.len(), a.len());
    rule.integrate(p.iter().zip(a).map(|(&p, &a)| fisher_integrand(p, a)), 1.0)
}
