//! High-level analysis orchestrator.
//!
//! [`TimingModel`] bundles the read-only device data loaded once at startup.
//! [`TimingManager`] shares a model behind an `Arc` and runs the full
//! build, propagate, and report pipeline over a design, or re-runs it after
//! a subset of nets has been rerouted.

use crate::builder::{BuildStats, GraphBuilder};
use crate::criticality::criticality;
use crate::delay_table::DelayTables;
use crate::error::DataError;
use crate::estimator::EstimatorOptions;
use crate::geometry::DistanceTables;
use crate::graph::TimingGraph;
use crate::ids::EdgeId;
use crate::report::PathReport;
use crate::sta::{critical_path, propagate, requirement_diagnostic, worst_slack};
use crate::terms::InterconnectTerms;
use kairos_common::KairosResult;
use kairos_config::ResolvedPaths;
use kairos_design::{NetId, PhysDesign};
use kairos_device::DeviceGrid;
use kairos_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use std::sync::Arc;

/// Delay tables, interconnect terms, and distance tables for one device.
#[derive(Debug, Clone)]
pub struct TimingModel {
    /// Logic and intra-site delays.
    pub tables: DelayTables,
    /// Interconnect pricing terms.
    pub terms: InterconnectTerms,
    /// Per-axis crossing distances.
    pub distances: DistanceTables,
    /// Estimator corrections.
    pub options: EstimatorOptions,
}

impl TimingModel {
    /// Bundles already loaded data.
    pub fn new(
        tables: DelayTables,
        terms: InterconnectTerms,
        distances: DistanceTables,
        options: EstimatorOptions,
    ) -> Self {
        Self {
            tables,
            terms,
            distances,
            options,
        }
    }

    /// Loads both data files named by `paths` and derives the distance
    /// tables from `grid`.
    pub fn load(paths: &ResolvedPaths, grid: &dyn DeviceGrid) -> Result<Self, DataError> {
        let tables = DelayTables::load(&paths.intrasite)?;
        let terms = InterconnectTerms::load(&paths.intersite)?;
        let distances = DistanceTables::build(grid, &terms);
        log::info!(
            "loaded timing model for {} ({}x{} tiles)",
            paths.series,
            grid.rows(),
            grid.cols()
        );
        Ok(Self::new(
            tables,
            terms,
            distances,
            EstimatorOptions::from(&paths.estimator),
        ))
    }
}

/// Settings for [`TimingManager`] that are not part of the device model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerOptions {
    /// Compute per-net delays on the rayon pool.
    pub parallel: bool,
    /// Upper bound of connection criticality.
    pub max_criticality: f64,
    /// Exponent applied to normalized slack.
    pub criticality_exponent: f64,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_criticality: 0.99,
            criticality_exponent: 3.0,
        }
    }
}

impl From<&ResolvedPaths> for ManagerOptions {
    fn from(paths: &ResolvedPaths) -> Self {
        Self {
            parallel: paths.parallel,
            max_criticality: paths.max_criticality,
            criticality_exponent: paths.criticality_exponent,
        }
    }
}

/// The result of analyzing one design.
#[derive(Debug)]
pub struct Analysis {
    /// The propagated timing graph.
    pub graph: TimingGraph,
    /// What the build added and skipped.
    pub stats: BuildStats,
    /// The critical path broken down edge by edge.
    pub report: PathReport,
    /// Critical path edges, source first, without super edges.
    pub critical_path: Vec<EdgeId>,
    /// Minimum endpoint slack.
    pub worst_slack: Option<f64>,
    /// Skip summaries and requirement violations.
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs timing analysis against a shared [`TimingModel`].
#[derive(Debug, Clone)]
pub struct TimingManager {
    model: Arc<TimingModel>,
    options: ManagerOptions,
}

impl TimingManager {
    /// Creates a manager.
    pub fn new(model: Arc<TimingModel>, options: ManagerOptions) -> Self {
        Self { model, options }
    }

    /// The shared model.
    pub fn model(&self) -> &Arc<TimingModel> {
        &self.model
    }

    fn builder(&self) -> GraphBuilder<'_> {
        GraphBuilder::new(&self.model).parallel(self.options.parallel)
    }

    /// Builds, propagates, and reports on `design`.
    pub fn analyze(&self, design: &PhysDesign, requirement: f64) -> KairosResult<Analysis> {
        let (graph, stats) = self.builder().build(design)?;
        self.finish(graph, stats, requirement)
    }

    /// Re-derives the nets in `changed` and re-propagates.
    ///
    /// The returned stats cover only the rebuilt nets.
    pub fn update(
        &self,
        design: &PhysDesign,
        changed: &[NetId],
        analysis: Analysis,
        requirement: f64,
    ) -> KairosResult<Analysis> {
        let mut graph = analysis.graph;
        let stats = self.builder().partial_build(design, changed, &mut graph)?;
        self.finish(graph, stats, requirement)
    }

    /// Criticality of an edge of an analyzed graph, using the manager's
    /// criticality settings.
    pub fn criticality(&self, analysis: &Analysis, edge: EdgeId) -> f64 {
        criticality(
            &analysis.graph,
            edge,
            self.options.max_criticality,
            self.options.criticality_exponent,
        )
    }

    fn finish(
        &self,
        mut graph: TimingGraph,
        stats: BuildStats,
        requirement: f64,
    ) -> KairosResult<Analysis> {
        propagate(&mut graph, requirement)?;

        let sink = DiagnosticSink::new();
        stats.emit_diagnostics(&sink);
        if let Some(diag) = requirement_diagnostic(&graph) {
            sink.emit(diag);
        }
        if let Some(worst) = sink.worst_severity() {
            log::debug!(
                "analysis finished with {} skip summaries, worst severity {worst}",
                sink.count(DiagnosticCode::SKIPPED_SINKS) + sink.count(DiagnosticCode::SKIPPED_NETS)
            );
        }

        let report = PathReport::from_graph(&graph);
        let analysis = Analysis {
            critical_path: critical_path(&graph),
            worst_slack: worst_slack(&graph),
            report,
            stats,
            graph,
            diagnostics: sink.take_all(),
        };
        log::info!(
            "critical path {:.1} ps over {} edges, worst slack {}",
            analysis.report.critical_delay,
            analysis.critical_path.len(),
            analysis
                .worst_slack
                .map_or_else(|| "n/a".to_string(), |s| format!("{s:.1} ps"))
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kairos_design::{Cell, Net, Terminal};
    use kairos_device::{Tile, TileGrid};

    fn model() -> Arc<TimingModel> {
        let tables = DelayTables::from_text(
            "bel A6LUT,B6LUT\nA1 O6 150\nsite SLICEL\nA6LUT/O6 AFF/D 48\nAFF/Q A6LUT/A1 30\n",
            "t.txt",
        )
        .unwrap();
        let terms = InterconnectTerms::default();
        let grid = TileGrid::from_tiles("t", 2, 2, vec![Tile::new(0, 0, "CLEL_R")]);
        let distances = DistanceTables::build(&grid, &terms);
        Arc::new(TimingModel::new(
            tables,
            terms,
            distances,
            EstimatorOptions::default(),
        ))
    }

    /// ff0/Q -> lut/I0 -> lut/O -> ff1/D, all inside one slice.
    fn design() -> PhysDesign {
        let mut d = PhysDesign::new("loop");
        let ff = |name: &str, bel: &str| {
            Cell::new(name, "FDRE")
                .placed("SLICE_X0Y0", "SLICEL", bel)
                .with_input("D", "D")
                .with_output("Q", "Q")
        };
        let ff0 = d.add_cell(ff("ff0", "AFF"));
        let ff1 = d.add_cell(ff("ff1", "AFF"));
        let lut = d.add_cell(
            Cell::new("lut", "LUT1")
                .placed("SLICE_X0Y0", "SLICEL", "A6LUT")
                .with_input("I0", "A1")
                .with_output("O", "O6"),
        );
        let mut q = Net::new("ff0_q");
        q.source = Some(Terminal::new(ff0, "Q"));
        q.sinks.push(Terminal::new(lut, "I0"));
        d.add_net(q);
        let mut o = Net::new("lut_o");
        o.source = Some(Terminal::new(lut, "O"));
        o.sinks.push(Terminal::new(ff1, "D"));
        d.add_net(o);
        d
    }

    #[test]
    fn analyze_end_to_end() {
        let manager = TimingManager::new(model(), ManagerOptions::default());
        let analysis = manager.analyze(&design(), 1000.0).unwrap();
        // 78 clock-to-out + 30 + 150 + 48
        assert_eq!(analysis.report.critical_delay, 306.0);
        assert_eq!(analysis.critical_path.len(), 3);
        assert_eq!(analysis.worst_slack, Some(694.0));
        assert!(analysis.diagnostics.is_empty());
        assert_eq!(analysis.stats.net_edges, 2);
        assert_eq!(analysis.stats.primitive_edges, 1);
    }

    #[test]
    fn violation_is_reported() {
        let manager = TimingManager::new(model(), ManagerOptions::default());
        let analysis = manager.analyze(&design(), 300.0).unwrap();
        assert_eq!(analysis.worst_slack, Some(-6.0));
        assert_eq!(analysis.diagnostics.len(), 1);
        assert_eq!(
            analysis.diagnostics[0].code,
            DiagnosticCode::REQUIREMENT_VIOLATED
        );
        assert!(!analysis.report.met());
        let first = analysis.critical_path[0];
        assert!((manager.criticality(&analysis, first) - 0.99).abs() < 1e-9);
    }

    #[test]
    fn update_rebuilds_changed_nets() {
        let manager = TimingManager::new(model(), ManagerOptions::default());
        let mut d = design();
        let analysis = manager.analyze(&d, 1000.0).unwrap();
        let before = analysis.graph.fingerprint();

        let net = d.net_by_name("lut_o").unwrap();
        d.net_mut(net).unwrap().sinks.clear();
        let analysis = manager.update(&d, &[net], analysis, 1000.0).unwrap();
        assert_ne!(analysis.graph.fingerprint(), before);
        assert_eq!(analysis.report.critical_delay, 258.0);
        assert_eq!(analysis.stats.net_edges, 0);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let seq = ManagerOptions {
            parallel: false,
            ..ManagerOptions::default()
        };
        let a = TimingManager::new(model(), ManagerOptions::default())
            .analyze(&design(), 500.0)
            .unwrap();
        let b = TimingManager::new(model(), seq)
            .analyze(&design(), 500.0)
            .unwrap();
        assert_eq!(a.graph.fingerprint(), b.graph.fingerprint());
        assert_eq!(a.report, b.report);
    }
}
