//! # tailrisk-core
//!
//! Value types shared across the tailrisk workspace:
//!
//! - **Prices**: [`PriceSeries`] read from delimited files
//! - **Returns**: [`ReturnSeries`], risk-free adjusted log-returns in percent
//! - **Specifications**: [`ModelSpec`] and [`DistributionFamily`] identifying
//!   an ARMA-GARCH model and its innovation law
//!
//! Everything here is immutable once built; downstream stages derive new
//! values rather than mutating these.
//!
//! ## Example
//!
//! ```rust
//! use tailrisk_core::prelude::*;
//!
//! let prices = [100.0, 101.0, 99.5, 100.2];
//! let returns = ReturnSeries::from_prices(&prices, 0.0).unwrap();
//! assert_eq!(returns.len(), prices.len() - 1);
//!
//! let spec = ModelSpec::new(1, 0, 1, 1, DistributionFamily::StudentT);
//! assert_eq!(spec.to_string(), "ARMA(1,0)-GARCH(1,1) std");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod data;
mod error;
pub mod returns;
pub mod types;

pub use data::{PriceObservation, PriceSeries};
pub use error::{CoreError, CoreResult};
pub use returns::{ReturnSeries, SeriesSummary};
pub use types::{DistributionFamily, ModelSpec};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::data::{PriceObservation, PriceSeries};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::returns::{ReturnSeries, SeriesSummary};
    pub use crate::types::{DistributionFamily, ModelSpec};
}
