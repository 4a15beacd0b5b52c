//! `kairos analyze`: the full timing pipeline over one design snapshot.
//!
//! 1. Load and resolve the configuration
//! 2. Load the device grid and the design
//! 3. Load the timing model for the device series
//! 4. Build the graph, propagate, and extract the critical path
//! 5. Print the report and diagnostics, optionally write a dot file

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use kairos_common::TimeValue;
use kairos_diagnostics::Diagnostic;
use kairos_timing::{write_dot, Analysis, BuildStats, ManagerOptions, PathReport, TimingManager, TimingModel};
use serde::Serialize;

use crate::pipeline::{
    data_error_diagnostic, load_config, load_design, load_grid, render_diagnostics,
};
use crate::{AnalyzeArgs, GlobalArgs, ReportFormat};

/// The `--format json` document.
#[derive(Serialize)]
struct JsonReport<'a> {
    design: &'a str,
    requirement_ps: f64,
    stats: &'a BuildStats,
    report: &'a PathReport,
    diagnostics: &'a [Diagnostic],
}

/// Runs the `kairos analyze` command.
///
/// Returns exit code 0 whenever analysis completes, including when the
/// requirement is not met, and 1 when the delay data cannot be loaded.
pub fn run(args: &AnalyzeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (config, base_dir) = load_config(global)?;
    let paths = kairos_config::resolve_paths(&config, &base_dir)?;
    let requirement = match &args.requirement {
        Some(s) => s
            .parse::<TimeValue>()
            .map_err(|e| format!("--requirement: {e}"))?
            .ps(),
        None => paths.requirement_ps,
    };

    let grid = load_grid(Path::new(&args.device))?;
    let design = load_design(Path::new(&args.design))?;
    if !global.quiet {
        eprintln!(
            "   Analyzing {} ({} cells, {} nets) against {requirement:.1} ps",
            design.name,
            design.cells.len(),
            design.nets.len()
        );
    }

    let model = match TimingModel::load(&paths, &grid) {
        Ok(model) => model,
        Err(err) => {
            render_diagnostics(&[data_error_diagnostic(&err)], global);
            return Ok(1);
        }
    };
    let manager = TimingManager::new(Arc::new(model), ManagerOptions::from(&paths));
    let analysis = manager.analyze(&design, requirement)?;

    if let Some(dot) = &args.dot {
        let file = File::create(dot).map_err(|e| format!("failed to create {dot}: {e}"))?;
        write_dot(&analysis.graph, BufWriter::new(file))?;
    }

    match args.format {
        ReportFormat::Text => {
            render_diagnostics(&analysis.diagnostics, global);
            println!("{}", text_report(&analysis));
        }
        ReportFormat::Json => {
            let doc = JsonReport {
                design: &design.name,
                requirement_ps: requirement,
                stats: &analysis.stats,
                report: &analysis.report,
                diagnostics: &analysis.diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(0)
}

fn text_report(analysis: &Analysis) -> String {
    let s = &analysis.stats;
    format!(
        "{}\n\ngraph: {} vertices, {} primitive / {} net / {} super edges",
        analysis.report,
        analysis.graph.vertex_count(),
        s.primitive_edges,
        s.net_edges,
        s.super_edges
    )
}
