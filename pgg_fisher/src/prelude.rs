//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use pgg_fisher::prelude::*;
//! ```

pub use crate::{
    AlphaTable, Config, ConvolutionMethod, FisherInformation, PggFisherInformation, TableConfig,
};
