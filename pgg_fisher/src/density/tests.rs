//! Tests for the Poisson-Gamma partial density.

use super::*;

/// Trapezoid integral of `f` over `[0, upper]` with `n` intervals.
fn integrate(f: impl Fn(f64) -> f64, upper: f64, n: usize) -> f64 {
    let h = upper / n as f64;
    let mut sum = 0.5 * (f(0.0) + f(upper));
    for i in 1..n {
        sum += f(i as f64 * h);
    }
    sum * h
}

#[test]
fn test_continuous_mass_excludes_dirac() {
    for (t, m) in [(0.5, 1.0), (3.0, 2.0), (20.0, 10.0)] {
        let upper: f64 = m * (t + 20.0 * (t + 1.0_f64).sqrt() + 40.0);
        let mass = integrate(|c| PoissonGamma::density(c, t, m), upper, 200_000);
        let expected = 1.0 - PoissonGamma.dirac_mass(t);
        assert!(
            (mass - expected).abs() < 1e-5,
            "t={} m={}: mass {} expected {}",
            t,
            m,
            mass,
            expected
        );
    }
}

#[test]
fn test_shifted_gradient_integrates_to_one() {
    // ∫ (∂p/∂t + p) dc = Σ_{n>=1} Poisson(n-1; t) = 1
    for (t, m) in [(0.1, 1.0), (2.0, 5.0), (50.0, 3.0)] {
        let upper: f64 = m * (t + 20.0 * (t + 1.0_f64).sqrt() + 40.0);
        let mass = integrate(
            |c| {
                let (p, g) = PoissonGamma.partial_density(c, t, m);
                p + g
            },
            upper,
            200_000,
        );
        assert!((mass - 1.0).abs() < 1e-5, "t={} m={}: {}", t, m, mass);
    }
}

#[test]
fn test_gradient_matches_finite_difference() {
    let m = 4.0;
    for t in [0.2, 1.0, 7.5, 60.0] {
        for c in [0.5, 3.0, 25.0, 250.0] {
            let (p, g) = PoissonGamma.partial_density(c, t, m);
            let dt = 1e-6 * t;
            let numeric = (PoissonGamma::density(c, t + dt, m)
                - PoissonGamma::density(c, t - dt, m))
                / (2.0 * dt);
            // g crosses zero near the mode, so compare on the density scale
            let scale = g.abs().max(p);
            assert!(
                (g - numeric).abs() / scale < 1e-5,
                "t={} c={}: analytic {} numeric {}",
                t,
                c,
                g,
                numeric
            );
        }
    }
}

#[test]
fn test_zero_count_is_right_limit() {
    let (t, m) = (1.5, 3.0);
    let (p0, g0) = PoissonGamma.partial_density(0.0, t, m);
    let (p, g) = PoissonGamma.partial_density(1e-9, t, m);
    assert!((p0 - p).abs() < 1e-8);
    assert!((g0 - g).abs() < 1e-8);
    assert!((p0 - (-t).exp() * t / m).abs() < 1e-15);
}

#[test]
fn test_far_tail_underflows_to_zero() {
    let (p, g) = PoissonGamma.partial_density(1e7, 1.0, 1.0);
    assert_eq!(p, 0.0);
    assert_eq!(g, 0.0);
}

#[test]
fn test_density_is_non_negative() {
    for t in [1e-300, 1e-3, 0.7, 12.0, 180.0] {
        for c in [0.0, 1e-6, 0.1, 1.0, 10.0, 1e3, 1e5] {
            let (p, g) = PoissonGamma.partial_density(c, t, 7.0);
            assert!(p >= 0.0 && p.is_finite(), "t={} c={} p={}", t, c, p);
            assert!(g.is_finite());
            assert!(p + g >= -1e-15 * p.max(1.0), "shifted gradient negative");
        }
    }
}

#[test]
fn test_dirac_gradient_is_negated_mass() {
    let t = 2.0;
    assert_eq!(PoissonGamma.dirac_gradient(t), -(-t).exp());
}
