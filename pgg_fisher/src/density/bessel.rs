//! Exponentially scaled modified Bessel functions of the first kind.
//!
//! `i0e(x) = exp(-x)·I₀(x)` and `i1e(x) = exp(-x)·I₁(x)` for `x >= 0`.
//! The power series is summed below [`SERIES_LIMIT`]; above it the Hankel
//! asymptotic expansion is truncated at its smallest term, which for
//! `x >= 30` is far below double precision.

use std::f64::consts::PI;

const SERIES_LIMIT: f64 = 30.0;
const MAX_TERMS: usize = 500;

/// `exp(-x)·I₀(x)` for `x >= 0`.
pub fn i0e(x: f64) -> f64 {
    debug_assert!(x >= 0.0);
    if x < SERIES_LIMIT {
        series(x, 0) * (-x).exp()
    } else {
        asymptotic(x, 0)
    }
}

/// `exp(-x)·I₁(x)` for `x >= 0`.
pub fn i1e(x: f64) -> f64 {
    debug_assert!(x >= 0.0);
    if x < SERIES_LIMIT {
        series(x, 1) * (-x).exp()
    } else {
        asymptotic(x, 1)
    }
}

/// `Σ (x/2)^(2k+ν) / (k! (k+ν)!)` for ν ∈ {0, 1}.
fn series(x: f64, order: u32) -> f64 {
    let q = 0.25 * x * x;
    let mut term = if order == 0 { 1.0 } else { 0.5 * x };
    let mut sum = term;
    let nu = order as f64;
    for k in 1..MAX_TERMS {
        let k = k as f64;
        term *= q / (k * (k + nu));
        sum += term;
        if term <= sum * f64::EPSILON * 0.5 {
            break;
        }
    }
    sum
}

/// `1/√(2πx) · Σ (-1)^k Π_{j<=k} (μ - (2j-1)²) / (k! (8x)^k)`, μ = 4ν².
fn asymptotic(x: f64, order: u32) -> f64 {
    let mu = 4.0 * (order * order) as f64;
    let eight_x = 8.0 * x;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..MAX_TERMS {
        let odd = (2 * k - 1) as f64;
        let next = -term * (mu - odd * odd) / (k as f64 * eight_x);
        if next.abs() >= term.abs() {
            break;
        }
        term = next;
        sum += term;
        if term.abs() <= sum.abs() * f64::EPSILON * 0.5 {
            break;
        }
    }
    sum / (2.0 * PI * x).sqrt()
}
