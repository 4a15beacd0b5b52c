//! Parsing and validation of `kairos.toml` analysis configuration files.
//!
//! The configuration names the device series and delay data directory, the
//! timing requirement, criticality shaping parameters, and estimator options.
//! [`resolve_paths`] turns a parsed [`KairosConfig`] into concrete file paths
//! and numeric values ready for the timing crate.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str};
pub use resolve::{resolve_paths, ResolvedPaths, INTERSITE_FILE, INTRASITE_FILE};
pub use types::*;
