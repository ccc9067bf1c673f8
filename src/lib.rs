//! Taxas - Brazilian benchmark rates from Ipeadata
//!
//! This library fetches the Selic, IPCA and CDI series and turns them into
//! a single figure each: the latest annualized Selic, or IPCA/CDI compounded
//! over the trailing 12 months or the current year.

pub mod accumulator;
pub mod config;
pub mod error;
pub mod provider;
pub mod rates;
pub mod utils;
