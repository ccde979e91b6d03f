//! End-to-end behaviour of the Fisher information engine across sensors.

use common::FloatExt;
use pgg_fisher::{
    information_bounds, AlphaTable, ConvolutionMethod, Error, FisherInformation,
    PggFisherInformation, TableConfig, MIN_MEAN,
};

fn engine(m: f64, s: f64) -> PggFisherInformation {
    PggFisherInformation::new(m, s).unwrap()
}

fn predecessor(x: f64) -> f64 {
    f64::from_bits(x.to_bits() - 1)
}

// ============================================================================
// Asymptote and bounds
// ============================================================================

#[test]
fn large_means_approach_half_poisson() {
    for (m, s) in [(1.0, 1.0), (250.0, 10.0), (2.0, 50.0)] {
        let mut engine = engine(m, s);
        for t in [1e3, 1e4, 1e5] {
            let ratio = engine.fisher_information(t).unwrap() * 2.0 * t;
            assert!((ratio - 1.0).abs() < 1e-12, "m={} s={} t={}", m, s, t);
        }
    }
}

#[test]
fn information_stays_within_bounds() {
    let means = [0.001, 0.05, 0.3, 1.0, 1.7, 4.0, 25.0, 150.0];
    for (m, s) in [(1.0, 1.0), (100.0, 5.0), (10.0, 20.0)] {
        let mut engine = engine(m, s);
        for t in means {
            let information = engine.fisher_information(t).unwrap();
            let (lower, upper) = information_bounds(t);
            assert!(
                information >= lower && information <= upper,
                "m={} s={} t={}: {} not in [{}, {}]",
                m,
                s,
                t,
                information,
                lower,
                upper
            );
        }
    }
}

// ============================================================================
// Oracles independent of the information formula
// ============================================================================

#[test]
fn convolved_mass_is_one() {
    for (m, s, t) in [(1.0, 1.0, 1.0), (10.0, 2.0, 3.0), (100.0, 10.0, 0.2), (2.0, 5.0, 0.5)] {
        let mut engine = engine(m, s);
        engine.fisher_information(t).unwrap();
        let mass = engine.last_convolved_mass().unwrap();
        assert!((mass - 1.0).abs() < 1e-3, "m={} s={} t={}: {}", m, s, t, mass);
    }
}

#[test]
fn wider_kernel_truncation_changes_nothing_material() {
    // t = 0.01 selects 6 + 7 = 13 SD; a 10 SD cap drops Gaussian tails below 1e-21
    let t = 0.01;
    let mut wide = engine(1.0, 1.0);
    let mut narrow = engine(1.0, 1.0);
    narrow.set_max_range(10).unwrap();

    let a = wide.fisher_information(t).unwrap();
    let b = narrow.fisher_information(t).unwrap();
    assert_eq!(wide.last_diagnostics().unwrap().range, 13);
    assert_eq!(narrow.last_diagnostics().unwrap().range, 10);
    let threshold = wide.config().relative_probability_threshold;
    assert!((a - b).abs() / a < threshold, "{} vs {}", a, b);
}

#[test]
fn fresh_instances_are_bit_identical() {
    for t in [0.02, 0.9, 12.0] {
        let a = engine(30.0, 4.0).fisher_information(t).unwrap();
        let b = engine(30.0, 4.0).fisher_information(t).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

// ============================================================================
// Concrete sensors
// ============================================================================

#[test]
fn low_noise_large_mean_uses_asymptote() {
    let mut engine = engine(1.0, 0.1);
    assert_eq!(engine.fisher_information(1e4).unwrap(), 0.5 / 1e4);
    assert!(engine.last_diagnostics().is_none());
}

#[test]
fn unit_sensor_at_unit_mean() {
    let mut engine = engine(1.0, 1.0);
    let information = engine.fisher_information(1.0).unwrap();
    assert!(information > 0.0 && information < 1.0, "{}", information);
    assert_eq!(engine.alpha(1.0).unwrap(), information);
}

#[test]
fn noisy_sensor_below_unit_mean() {
    let mut engine = engine(2.0, 5.0);
    let information = engine.fisher_information(0.5).unwrap();
    assert!(information.is_finite());
    assert!(information > 0.0 && information < 2.0, "{}", information);
}

#[test]
fn matches_direct_integration() {
    // I(t) from brute-force quadrature of the convolved density and its
    // t-derivative on a fine grid, independent of the sampler and kernels
    let reference = [
        ((1.0, 1.0, 1.0), 0.34597),
        ((10.0, 2.0, 3.0), 0.18146),
        ((2.0, 5.0, 0.5), 0.16125),
        ((100.0, 10.0, 0.2), 3.65689),
        ((200.0, 1.0, 0.01), 97.4368),
    ];
    for ((m, s, t), expected) in reference {
        let information = engine(m, s).fisher_information(t).unwrap();
        assert!(
            information.relative_eq(expected, 5e-4),
            "m={} s={} t={}: {} vs {}",
            m,
            s,
            t,
            information,
            expected
        );
    }
}

#[test]
fn invalid_sensors_are_rejected() {
    assert!(matches!(
        PggFisherInformation::new(1.0, 0.0),
        Err(Error::InvalidStandardDeviation(_))
    ));
    assert!(matches!(
        PggFisherInformation::new(0.0, 1.0),
        Err(Error::InvalidGain(_))
    ));
}

#[test]
fn minimum_mean_boundary() {
    let mut engine = engine(1.0, 1.0);
    let information = engine.fisher_information(MIN_MEAN).unwrap();
    assert!(information.is_finite());
    assert!(information >= 0.0 && information <= 1.0 / MIN_MEAN);

    assert!(matches!(
        engine.fisher_information(predecessor(MIN_MEAN)),
        Err(Error::MeanBelowMinimum { .. })
    ));
}

// ============================================================================
// Convolution routines and parallel use
// ============================================================================

#[test]
fn fft_and_spatial_agree() {
    for (m, s, t) in [(1.0, 1.0, 1.0), (20.0, 3.0, 0.4)] {
        let mut spatial = engine(m, s);
        spatial.set_convolution_method(ConvolutionMethod::Spatial);
        let mut fft = engine(m, s);
        fft.set_convolution_method(ConvolutionMethod::Fft);

        let a = spatial.fisher_information(t).unwrap();
        let b = fft.fisher_information(t).unwrap();
        assert!(a.relative_eq(b, 1e-5), "m={} s={} t={}: {} vs {}", m, s, t, a, b);
    }
}

#[test]
fn clones_work_on_separate_threads() {
    let engine = engine(50.0, 8.0);
    let means = [0.1, 1.0, 10.0];
    let expected: Vec<f64> = means
        .iter()
        .map(|&t| engine.clone().fisher_information(t).unwrap())
        .collect();

    let handles: Vec<_> = means
        .iter()
        .map(|&t| {
            let mut engine = engine.clone();
            std::thread::spawn(move || engine.fisher_information(t).unwrap())
        })
        .collect();
    for (handle, expected) in handles.into_iter().zip(expected) {
        assert_eq!(handle.join().unwrap().to_bits(), expected.to_bits());
    }
}

#[test]
fn table_tracks_engine_between_nodes() {
    let mut engine = engine(100.0, 5.0);
    let config = TableConfig {
        min_mean: 1.0,
        max_mean: 100.0,
        points_per_decade: 8,
    };
    let mut table = AlphaTable::build(&engine, &config).unwrap();
    for t in [1.5, 7.0, 42.0] {
        let exact = engine.alpha(t).unwrap();
        let interpolated = FisherInformation::alpha(&mut table, t).unwrap();
        assert!((exact - interpolated).abs() < 0.02, "t={}: {} vs {}", t, exact, interpolated);
    }
}
