//! Shared helpers for CLI commands: config discovery, snapshot loading, and
//! diagnostic output.

use std::path::{Path, PathBuf};

use kairos_config::{DeviceConfig, KairosConfig};
use kairos_design::PhysDesign;
use kairos_device::TileGrid;
use kairos_diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticRenderer, Location, TerminalRenderer,
};
use kairos_timing::DataError;
use serde::de::DeserializeOwned;

use crate::GlobalArgs;

/// Name of the configuration file looked up in a directory.
const CONFIG_FILE: &str = "kairos.toml";

/// Loads the configuration named by `--config`, or `kairos.toml` in the
/// current directory.
///
/// Returns the configuration and the directory relative paths resolve
/// against. With no `--config` and no `kairos.toml`, every setting is at its
/// default.
pub fn load_config(
    global: &GlobalArgs,
) -> Result<(KairosConfig, PathBuf), Box<dyn std::error::Error>> {
    match &global.config {
        Some(path) => {
            let p = PathBuf::from(path);
            if p.is_dir() {
                Ok((kairos_config::load_config(&p)?, p))
            } else {
                let base = p
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok((kairos_config::load_config_file(&p)?, base))
            }
        }
        None => {
            let cwd = std::env::current_dir()?;
            if cwd.join(CONFIG_FILE).is_file() {
                Ok((kairos_config::load_config(&cwd)?, cwd))
            } else {
                log::debug!("no {CONFIG_FILE} in {}, using defaults", cwd.display());
                Ok((KairosConfig::with_device(DeviceConfig::default()), cwd))
            }
        }
    }
}

/// Reads and deserializes a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()).into())
}

/// Loads a design snapshot and rebuilds its name indices.
pub fn load_design(path: &Path) -> Result<PhysDesign, Box<dyn std::error::Error>> {
    let mut design: PhysDesign = load_json(path)?;
    design.rebuild_indices();
    Ok(design)
}

/// Loads a device grid and rebuilds its position index.
pub fn load_grid(path: &Path) -> Result<TileGrid, Box<dyn std::error::Error>> {
    let mut grid: TileGrid = load_json(path)?;
    grid.rebuild_index();
    Ok(grid)
}

/// A `D001` diagnostic for a delay data error, located at its file and line.
pub fn data_error_diagnostic(err: &DataError) -> Diagnostic {
    let location = match err {
        DataError::Io { path, .. } => Location::file(path),
        DataError::Parse { path, line, .. }
        | DataError::UnknownTerm { path, line, .. }
        | DataError::DuplicateEntry { path, line, .. }
        | DataError::TooManyConfigValues { path, line, .. } => Location::line(path, *line),
    };
    Diagnostic::error(DiagnosticCode::DATA_PARSE, err.to_string())
        .at(location)
        .with_help("delay data files must match the format of the device series")
}

/// Prints diagnostics to stderr.
pub fn render_diagnostics(diagnostics: &[Diagnostic], global: &GlobalArgs) {
    let renderer = TerminalRenderer::new(global.color);
    for diag in diagnostics {
        if global.quiet && !diag.severity.is_error() {
            continue;
        }
        eprint!("{}", renderer.render(diag));
    }
}
