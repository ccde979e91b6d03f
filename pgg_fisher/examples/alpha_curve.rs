//! Example: print the alpha curve of an EM-CCD sensor.
//!
//! Evaluates `alpha(t) = t·I(t)` on a log grid of means and prints one
//! `mean alpha information` line per point, followed by the same curve read
//! back from an interpolating table.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example alpha_curve -- [gain] [read_noise]
//! RUST_LOG=pgg_fisher=debug cargo run --example alpha_curve -- 300 12
//! ```

use std::env;

use anyhow::Context;
use pgg_fisher::{AlphaTable, PggFisherInformation, TableConfig};

fn main() -> anyhow::Result<()> {
    common::setup_logging("info");

    let mut args = env::args().skip(1);
    let gain: f64 = match args.next() {
        Some(arg) => arg.parse().context("gain must be a number")?,
        None => 250.0,
    };
    let read_noise: f64 = match args.next() {
        Some(arg) => arg.parse().context("read noise must be a number")?,
        None => 10.0,
    };

    let mut engine = PggFisherInformation::new(gain, read_noise)
        .with_context(|| format!("invalid sensor: gain {} read noise {}", gain, read_noise))?;
    tracing::info!(gain, read_noise, "Computing alpha curve");

    let config = TableConfig {
        min_mean: 1e-2,
        max_mean: 1e3,
        points_per_decade: 4,
    };

    println!("{:>12} {:>10} {:>14}", "mean", "alpha", "information");
    for &t in &config.means() {
        let information = engine.fisher_information(t)?;
        let alpha = engine.alpha(t)?;
        println!("{:>12.4} {:>10.6} {:>14.6e}", t, alpha, information);
    }

    let table = AlphaTable::build(&engine, &config)?;
    println!();
    println!("{:>12} {:>10}", "mean", "table");
    for t in [0.03, 0.3, 3.0, 30.0, 300.0] {
        println!("{:>12.4} {:>10.6}", t, table.alpha(t)?);
    }

    Ok(())
}
