//! Precomputed alpha curves.
//!
//! [`AlphaTable`] evaluates `alpha(t) = t·I(t)` on a log-spaced grid of means
//! in parallel and answers later queries by linear interpolation in `log10 t`.
//! Alpha varies slowly (it lies in `[0.5, 1]` for `t > 1`), so a coarse grid
//! is enough for likelihood weighting.


use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{validate_upper_mean_threshold, MIN_MEAN};
use crate::engine::PggFisherInformation;
use crate::error::{Error, Result};
use crate::information::{check_mean, FisherInformation};

/// Grid of an [`AlphaTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub min_mean: f64,
    pub max_mean: f64,
    pub points_per_decade: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_mean: 1e-3,
            max_mean: 200.0,
            points_per_decade: 20,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<()> {
        let valid = self.min_mean >= MIN_MEAN
            && self.max_mean.is_finite()
            && self.min_mean < self.max_mean
            && self.points_per_decade >= 1;
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidTableRange {
                min_mean: self.min_mean,
                max_mean: self.max_mean,
                points_per_decade: self.points_per_decade,
            })
        }
    }

    /// Log-spaced means from `min_mean` to `max_mean`, both included.
    pub fn means(&self) -> Vec<f64> {
        let lo = self.min_mean.log10();
        let hi = self.max_mean.log10();
        // Tolerate log10 round-off on whole decades
        let span = (hi - lo) * self.points_per_decade as f64;
        let intervals = ((span - 1e-9).ceil() as usize).max(1);
        let mut means: Vec<f64> = (0..=intervals)
            .map(|i| 10f64.powf(lo + (hi - lo) * i as f64 / intervals as f64))
            .collect();
        means[0] = self.min_mean;
        means[intervals] = self.max_mean;
        means
    }
}

/// Alpha sampled on a log grid of means for one sensor.
///
/// Deserialization goes through [`AlphaTableData`], so a loaded table has the
/// same node invariants as a built one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AlphaTableData")]
pub struct AlphaTable {
    gain: f64,
    standard_deviation: f64,
    upper_mean_threshold: f64,
    means: Vec<f64>,
    #[serde(skip_serializing)]
    log_means: Vec<f64>,
    alphas: Vec<f64>,
}

/// Serialized form of an [`AlphaTable`], checked on load.
#[derive(Debug, Clone, Deserialize)]
pub struct AlphaTableData {
    pub gain: f64,
    pub standard_deviation: f64,
    pub upper_mean_threshold: f64,
    pub means: Vec<f64>,
    pub alphas: Vec<f64>,
}

impl TryFrom<AlphaTableData> for AlphaTable {
    type Error = Error;

    fn try_from(data: AlphaTableData) -> Result<Self> {
        if data.means.len() != data.alphas.len() {
            return Err(Error::MalformedTable("means and alphas differ in length"));
        }
        if data.means.len() < 2 {
            return Err(Error::MalformedTable("needs at least two nodes"));
        }
        if data.means.iter().any(|&t| !(t >= MIN_MEAN && t.is_finite()))
            || data.means.windows(2).any(|pair| pair[0] >= pair[1])
        {
            return Err(Error::MalformedTable(
                "means must be finite, representable and strictly increasing",
            ));
        }
        if data.alphas.iter().any(|a| !a.is_finite()) {
            return Err(Error::MalformedTable("alphas must be finite"));
        }
        validate_upper_mean_threshold(data.upper_mean_threshold)?;

        Ok(Self {
            gain: data.gain,
            standard_deviation: data.standard_deviation,
            upper_mean_threshold: data.upper_mean_threshold,
            log_means: data.means.iter().map(|t| t.log10()).collect(),
            means: data.means,
            alphas: data.alphas,
        })
    }
}

impl AlphaTable {
    /// Evaluate `engine` on the grid of `config`, one engine clone per
    /// rayon worker.
    pub fn build(engine: &PggFisherInformation, config: &TableConfig) -> Result<Self> {
        config.validate()?;
        let means = config.means();

        let alphas = means
            .par_iter()
            .map_init(|| engine.clone(), |engine, &t| engine.alpha(t))
            .collect::<Result<Vec<f64>>>()?;

        tracing::info!(
            gain = engine.gain(),
            standard_deviation = engine.standard_deviation(),
            points = means.len(),
            min_mean = config.min_mean,
            max_mean = config.max_mean,
            "Built alpha table"
        );

        Ok(Self {
            gain: engine.gain(),
            standard_deviation: engine.standard_deviation(),
            upper_mean_threshold: engine.config().upper_mean_threshold,
            log_means: means.iter().map(|t| t.log10()).collect(),
            means,
            alphas,
        })
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn standard_deviation(&self) -> f64 {
        self.standard_deviation
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Interpolated alpha.
    ///
    /// Above the engine's upper mean threshold this is the asymptote `0.5`.
    /// Outside the grid otherwise the nearest end value is held.
    pub fn alpha(&self, t: f64) -> Result<f64> {
        check_mean(t)?;
        if t > self.upper_mean_threshold {
            return Ok(0.5);
        }

        let x = t.log10();
        let last = self.log_means.len() - 1;
        if x <= self.log_means[0] {
            return Ok(self.alphas[0]);
        }
        if x >= self.log_means[last] {
            return Ok(self.alphas[last]);
        }

        // First node strictly above x; 1..=last here
        let upper = self.log_means.partition_point(|&v| v <= x);
        let lower = upper - 1;
        let (x0, x1) = (self.log_means[lower], self.log_means[upper]);
        let (y0, y1) = (self.alphas[lower], self.alphas[upper]);
        Ok(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
    }
}

impl FisherInformation for AlphaTable {
    fn fisher_information(&mut self, t: f64) -> Result<f64> {
        Ok(AlphaTable::alpha(self, t)? / t)
    }

    fn alpha(&mut self, t: f64) -> Result<f64> {
        AlphaTable::alpha(self, t)
    }
}
