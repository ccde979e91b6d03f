pub trait FloatExt {
    /// Relative comparison: `|a - b| <= tolerance * max(|a|, |b|)`.
    fn relative_eq(self, other: Self, tolerance: Self) -> bool;

    /// Clamp into `[lower, upper]`, mapping NaN to `lower`.
    fn clip(self, lower: Self, upper: Self) -> Self;
}

impl FloatExt for f64 {
    fn relative_eq(self, other: Self, tolerance: Self) -> bool {
        if self == other {
            return true;
        }
        let scale = self.abs().max(other.abs());
        (self - other).abs() <= tolerance * scale
    }

    fn clip(self, lower: Self, upper: Self) -> Self {
        if self.is_nan() {
            return lower;
        }
        self.max(lower).min(upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_never_equal() {
        assert!(!f64::NAN.relative_eq(f64::NAN, 1.0));
        assert!(!f64::NAN.relative_eq(1.0, 0.5));
    }

    #[test]
    fn relative_eq_scales_with_magnitude() {
        assert!(1e10_f64.relative_eq(1.000_01e10, 1e-4));
        assert!(!1e-10_f64.relative_eq(2e-10, 1e-4));
        assert!(0.0_f64.relative_eq(0.0, 0.0));
    }

    #[test]
    fn relative_eq_is_symmetric() {
        let a = 3.0_f64;
        let b = 3.001_f64;
        assert_eq!(a.relative_eq(b, 1e-3), b.relative_eq(a, 1e-3));
    }

    #[test]
    fn clip_bounds_values() {
        assert_eq!(5.0_f64.clip(0.0, 1.0), 1.0);
        assert_eq!((-5.0_f64).clip(0.0, 1.0), 0.0);
        assert_eq!(0.25_f64.clip(0.0, 1.0), 0.25);
        assert_eq!(f64::INFINITY.clip(0.0, 1.0), 1.0);
    }

    #[test]
    fn clip_maps_nan_to_lower() {
        assert_eq!(f64::NAN.clip(0.5, 1.0), 0.5);
    }
}
