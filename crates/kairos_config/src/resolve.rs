//! Resolution of a parsed configuration into concrete paths and values.

use crate::error::ConfigError;
use crate::loader::validate_config;
use crate::types::{EstimatorConfig, KairosConfig};
use kairos_common::TimeValue;
use std::path::{Path, PathBuf};

/// File name of the logic and intra-site delay table.
pub const INTRASITE_FILE: &str = "intrasite_delay_terms.txt";
/// File name of the interconnect delay terms.
pub const INTERSITE_FILE: &str = "intersite_delay_terms.txt";

/// A configuration with paths joined and strings parsed.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    /// Device series name.
    pub series: String,
    /// `<data_dir>/<series>/intrasite_delay_terms.txt`.
    pub intrasite: PathBuf,
    /// `<data_dir>/<series>/intersite_delay_terms.txt`.
    pub intersite: PathBuf,
    /// Timing requirement in ps.
    pub requirement_ps: f64,
    /// Criticality upper bound.
    pub max_criticality: f64,
    /// Criticality exponent.
    pub criticality_exponent: f64,
    /// Whether to compute net delays in parallel.
    pub parallel: bool,
    /// Estimator adjustments.
    pub estimator: EstimatorConfig,
}

/// Resolves `config` relative to `base_dir`.
///
/// A relative `data_dir` is joined onto `base_dir` (normally the directory
/// holding `kairos.toml`); an absolute one is used as is.
pub fn resolve_paths(config: &KairosConfig, base_dir: &Path) -> Result<ResolvedPaths, ConfigError> {
    validate_config(config)?;

    let data_dir = Path::new(&config.device.data_dir);
    let series_dir = if data_dir.is_absolute() {
        data_dir.join(&config.device.series)
    } else {
        base_dir.join(data_dir).join(&config.device.series)
    };

    let requirement_ps = match &config.analysis.requirement {
        Some(s) => s
            .parse::<TimeValue>()
            .map_err(|e| ConfigError::invalid("analysis.requirement", e.to_string()))?
            .ps(),
        None => 0.0,
    };

    Ok(ResolvedPaths {
        series: config.device.series.clone(),
        intrasite: series_dir.join(INTRASITE_FILE),
        intersite: series_dir.join(INTERSITE_FILE),
        requirement_ps,
        max_criticality: config.criticality.max,
        criticality_exponent: config.criticality.exponent,
        parallel: config.build.parallel,
        estimator: config.estimator.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn joins_relative_data_dir() {
        let config = load_config_from_str(
            "[device]\nseries = \"ultrascaleplus\"\n[analysis]\nrequirement = \"4ns\"\n",
        )
        .unwrap();
        let resolved = resolve_paths(&config, Path::new("/proj")).unwrap();
        assert_eq!(
            resolved.intrasite,
            PathBuf::from("/proj/data/ultrascaleplus/intrasite_delay_terms.txt")
        );
        assert_eq!(
            resolved.intersite,
            PathBuf::from("/proj/data/ultrascaleplus/intersite_delay_terms.txt")
        );
        assert_eq!(resolved.requirement_ps, 4_000.0);
    }

    #[test]
    fn keeps_absolute_data_dir() {
        let config =
            load_config_from_str("[device]\nseries = \"us\"\ndata_dir = \"/opt/d\"\n").unwrap();
        let resolved = resolve_paths(&config, Path::new("/proj")).unwrap();
        assert_eq!(resolved.intrasite, PathBuf::from("/opt/d/us/intrasite_delay_terms.txt"));
    }

    #[test]
    fn missing_requirement_is_zero() {
        let config = KairosConfig::with_device(Default::default());
        let resolved = resolve_paths(&config, Path::new(".")).unwrap();
        assert_eq!(resolved.requirement_ps, 0.0);
        assert_eq!(resolved.max_criticality, 0.99);
        assert!(resolved.parallel);
    }
}
