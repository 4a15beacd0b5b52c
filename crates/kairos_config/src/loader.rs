//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::KairosConfig;
use kairos_common::TimeValue;
use std::path::Path;

/// Loads and validates `<dir>/kairos.toml`.
pub fn load_config(dir: &Path) -> Result<KairosConfig, ConfigError> {
    load_config_file(&dir.join("kairos.toml"))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<KairosConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<KairosConfig, ConfigError> {
    let config: KairosConfig =
        toml::from_str(content).map_err(|e| ConfigError::Malformed(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks value ranges that serde cannot express.
pub(crate) fn validate_config(config: &KairosConfig) -> Result<(), ConfigError> {
    if config.device.series.is_empty() {
        return Err(ConfigError::invalid("device.series", "must not be empty"));
    }
    let max = config.criticality.max;
    if !(max > 0.0 && max <= 1.0) {
        return Err(ConfigError::invalid(
            "criticality.max",
            format!("must be in (0, 1], got {max}"),
        ));
    }
    if !(config.criticality.exponent >= 0.0) {
        return Err(ConfigError::invalid(
            "criticality.exponent",
            format!("must be non-negative, got {}", config.criticality.exponent),
        ));
    }
    if let Some(req) = &config.analysis.requirement {
        req.parse::<TimeValue>()
            .map_err(|e| ConfigError::invalid("analysis.requirement", e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = load_config_from_str("[device]\nseries = \"ultrascaleplus\"\n").unwrap();
        assert_eq!(config.device.series, "ultrascaleplus");
        assert_eq!(config.device.data_dir, "data");
        assert!(config.analysis.requirement.is_none());
        assert_eq!(config.criticality.max, 0.99);
        assert_eq!(config.criticality.exponent, 3.0);
        assert!(config.build.parallel);
        assert!(!config.estimator.adjust_double_to_double);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[device]
series = "ultrascaleplus"
data_dir = "/opt/kairos/data"

[analysis]
requirement = "250MHz"

[criticality]
max = 0.95
exponent = 1.5

[build]
parallel = false

[estimator]
adjust_double_to_double = true
adjust_quad_to_quad = true
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.device.data_dir, "/opt/kairos/data");
        assert_eq!(config.analysis.requirement.as_deref(), Some("250MHz"));
        assert_eq!(config.criticality.max, 0.95);
        assert!(!config.build.parallel);
        assert!(config.estimator.adjust_quad_to_quad);
    }

    #[test]
    fn missing_device_errors() {
        let err = load_config_from_str("[build]\nparallel = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn out_of_range_criticality_errors() {
        let toml = "[device]\nseries = \"x\"\n[criticality]\nmax = 1.5\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "criticality.max",
                ..
            }
        ));
    }

    #[test]
    fn negative_exponent_errors() {
        let toml = "[device]\nseries = \"x\"\n[criticality]\nexponent = -1.0\n";
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn bad_requirement_errors() {
        let toml = "[device]\nseries = \"x\"\n[analysis]\nrequirement = \"fast\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(err.to_string().contains("analysis.requirement"));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/kairos-dir")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }
}
