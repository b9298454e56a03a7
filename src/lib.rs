//! Tributec - Brazilian import tax stack and drawback eligibility engine
//!
//! This library computes the import tax stack (II, IPI, IOF câmbio and ICMS
//! "por dentro") for trade operations, normalizes the burden against a
//! benchmark, simulates seeded batches of imports, and links imports to later
//! exports that qualify for the drawback regime.

pub mod config;
pub mod drawback;
pub mod error;
pub mod importers;
pub mod models;
pub mod reports;
pub mod simulation;
pub mod tax;
pub mod utils;

pub use config::Config;
pub use error::TaxError;
pub use models::{DrawbackLink, Operation, OperationInput, SeverityCategory, TradeDirection};
