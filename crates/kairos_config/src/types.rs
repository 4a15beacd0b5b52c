//! Configuration types deserialized from `kairos.toml`.

use serde::Deserialize;

/// The top-level configuration parsed from `kairos.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct KairosConfig {
    /// Device series and delay data location. Required.
    pub device: DeviceConfig,
    /// Timing requirement.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Criticality shaping for router feedback.
    #[serde(default)]
    pub criticality: CriticalityConfig,
    /// Graph construction settings.
    #[serde(default)]
    pub build: BuildConfig,
    /// Interconnect estimator adjustments.
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

impl KairosConfig {
    /// A configuration with every optional section at its default.
    pub fn with_device(device: DeviceConfig) -> Self {
        Self {
            device,
            analysis: AnalysisConfig::default(),
            criticality: CriticalityConfig::default(),
            build: BuildConfig::default(),
            estimator: EstimatorConfig::default(),
        }
    }
}

/// Which device family's delay data to load.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Series name; also the data sub-directory (e.g. `"ultrascaleplus"`).
    pub series: String,
    /// Root directory containing one sub-directory per series.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            series: "ultrascaleplus".to_string(),
            data_dir: default_data_dir(),
        }
    }
}

/// Analysis settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    /// Timing requirement, e.g. `"4ns"`, `"250MHz"`, or a bare number of ps.
    /// When absent the requirement is 0 and every path shows negative slack.
    #[serde(default)]
    pub requirement: Option<String>,
}

/// Criticality shaping parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CriticalityConfig {
    /// Upper bound on any criticality value, in `(0, 1]`.
    #[serde(default = "default_max_criticality")]
    pub max: f64,
    /// Exponent applied to the normalized slack term.
    #[serde(default = "default_exponent")]
    pub exponent: f64,
}

fn default_max_criticality() -> f64 {
    0.99
}

fn default_exponent() -> f64 {
    3.0
}

impl Default for CriticalityConfig {
    fn default() -> Self {
        Self {
            max: default_max_criticality(),
            exponent: default_exponent(),
        }
    }
}

/// Graph construction settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Compute per-net delays on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
        }
    }
}

/// Optional empirical corrections applied by the interconnect estimator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimatorConfig {
    /// Subtract a fixed amount when a double follows a double.
    #[serde(default)]
    pub adjust_double_to_double: bool,
    /// Add a fixed amount when a quad follows a quad.
    #[serde(default)]
    pub adjust_quad_to_quad: bool,
}
