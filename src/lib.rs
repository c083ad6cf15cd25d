//! App launcher registry, per-app model filtering and the subsidy selection
//! client for GovChat-NL.

pub mod apps;
pub mod cli;
pub mod config;
pub mod error;
pub mod help;
pub mod models;
pub mod subsidy;

pub use error::{LauncherError, Result};
