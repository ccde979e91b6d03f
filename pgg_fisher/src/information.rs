//! Fisher information of a Poisson mean under different observation models.

use crate::config::MIN_MEAN;
use crate::error::{Error, Result};

/// Fisher information `I(t)` about a Poisson mean `t`.
///
/// Takes `&mut self` so implementations can keep scratch buffers between
/// calls.
pub trait FisherInformation {
    fn fisher_information(&mut self, t: f64) -> Result<f64>;

    /// `t · I(t)`: the information relative to a pure Poisson observation.
    fn alpha(&mut self, t: f64) -> Result<f64> {
        Ok(t * self.fisher_information(t)?)
    }
}

/// Reject NaN and means below [`MIN_MEAN`].
pub fn check_mean(t: f64) -> Result<()> {
    if t >= MIN_MEAN {
        Ok(())
    } else {
        Err(Error::MeanBelowMinimum {
            mean: t,
            min: MIN_MEAN,
        })
    }
}

/// Counting the Poisson variable directly: `I = 1/t`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoissonFisherInformation;

impl FisherInformation for PoissonFisherInformation {
    fn fisher_information(&mut self, t: f64) -> Result<f64> {
        check_mean(t)?;
        Ok(1.0 / t)
    }
}

/// High-gain EM-CCD limit: the excess noise factor of 2 halves the
/// information, `I = 1/(2t)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfPoissonFisherInformation;

impl FisherInformation for HalfPoissonFisherInformation {
    fn fisher_information(&mut self, t: f64) -> Result<f64> {
        check_mean(t)?;
        Ok(0.5 / t)
    }

    fn alpha(&mut self, t: f64) -> Result<f64> {
        check_mean(t)?;
        Ok(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poisson() {
        let mut model = PoissonFisherInformation;
        assert_eq!(model.fisher_information(4.0).unwrap(), 0.25);
        assert_eq!(model.alpha(4.0).unwrap(), 1.0);
    }

    #[test]
    fn test_half_poisson() {
        let mut model = HalfPoissonFisherInformation;
        assert_eq!(model.fisher_information(4.0).unwrap(), 0.125);
        assert_eq!(model.alpha(1e-300).unwrap(), 0.5);
    }

    #[test]
    fn test_mean_domain() {
        assert!(check_mean(MIN_MEAN).is_ok());
        assert!(PoissonFisherInformation.fisher_information(MIN_MEAN).unwrap().is_finite());
        assert_eq!(
            check_mean(0.0),
            Err(Error::MeanBelowMinimum {
                mean: 0.0,
                min: MIN_MEAN
            })
        );
        assert!(check_mean(f64::NAN).is_err());
        assert!(check_mean(-1.0).is_err());
    }
}
