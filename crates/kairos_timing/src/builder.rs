//! Timing graph construction from a placed-and-routed design.
//!
//! The builder adds primitive edges (LUT, RAM, SRL and CARRY arcs from the
//! delay tables), then one net edge per routed connection, then the super
//! edges. Per-net delays are computed independently, optionally on the rayon
//! pool, and inserted sequentially in net order so the resulting graph does
//! not depend on thread scheduling.

use crate::error::LookupError;
use crate::estimator::{trace_route, Endpoints, NetDelay, NetDelayEstimator};
use crate::graph::{EdgeKind, TimingGraph};
use crate::ids::VertexId;
use crate::lut::{input_index, lut_width, table_inputs, used_inputs};
use crate::manager::TimingModel;
use kairos_common::KairosResult;
use kairos_design::{Cell, Net, NetId, NetKind, PhysDesign, Terminal};
use kairos_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

const CARRY_FROM_GROUND: [&str; 2] = ["CYINIT_BOT:GND", "CARRY_TYPE:SINGLE_CY8"];
const CARRY_TOP_FROM_GROUND: [&str; 2] = ["CYINIT_TOP:GND", "CARRY_TYPE:SINGLE_CY8"];
const CARRY_FROM_CIN: [&str; 2] = ["CYINIT_BOT:CIN", "CARRY_TYPE:SINGLE_CY8"];

/// Counts of what a build added and what it skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Logic edges through LUT, RAM, SRL and CARRY cells.
    pub primitive_edges: usize,
    /// Edges along routed nets.
    pub net_edges: usize,
    /// Edges to and from the super vertices.
    pub super_edges: usize,
    /// Nets named `GLOBAL_LOGIC*` or `GLOBAL_USED*`.
    pub skipped_global_nets: usize,
    /// VCC and GND nets.
    pub skipped_static_nets: usize,
    /// Clock nets.
    pub skipped_clock_nets: usize,
    /// Sinks whose route could not be traced back to the driver.
    pub unroutable_sinks: usize,
    /// Sinks inside the driver's site with no intra-site delay entry.
    pub missing_intra_site_sinks: usize,
    /// Delay-table queries naming an unknown scope or configuration.
    pub lookup_errors: usize,
}

impl BuildStats {
    /// Sinks that got no edge.
    pub fn skipped_sinks(&self) -> usize {
        self.unroutable_sinks + self.missing_intra_site_sinks
    }

    /// Nets that were not considered at all.
    pub fn skipped_nets(&self) -> usize {
        self.skipped_global_nets + self.skipped_static_nets + self.skipped_clock_nets
    }

    fn absorb(&mut self, other: &BuildStats) {
        self.primitive_edges += other.primitive_edges;
        self.net_edges += other.net_edges;
        self.super_edges += other.super_edges;
        self.skipped_global_nets += other.skipped_global_nets;
        self.skipped_static_nets += other.skipped_static_nets;
        self.skipped_clock_nets += other.skipped_clock_nets;
        self.unroutable_sinks += other.unroutable_sinks;
        self.missing_intra_site_sinks += other.missing_intra_site_sinks;
        self.lookup_errors += other.lookup_errors;
    }

    /// Emits one summary diagnostic per kind of skip.
    pub fn emit_diagnostics(&self, sink: &DiagnosticSink) {
        if self.skipped_sinks() > 0 {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::SKIPPED_SINKS,
                format!(
                    "skipped {} sinks ({} unroutable, {} without an intra-site delay)",
                    self.skipped_sinks(),
                    self.unroutable_sinks,
                    self.missing_intra_site_sinks
                ),
            ));
        }
        if self.skipped_nets() > 0 {
            sink.emit(Diagnostic::note(
                DiagnosticCode::SKIPPED_NETS,
                format!(
                    "skipped {} nets ({} global, {} static, {} clock)",
                    self.skipped_nets(),
                    self.skipped_global_nets,
                    self.skipped_static_nets,
                    self.skipped_clock_nets
                ),
            ));
        }
        if self.lookup_errors > 0 {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::LOOKUP_ERRORS,
                    format!("{} delay lookups failed", self.lookup_errors),
                )
                .with_help("check that the delay tables match the device series"),
            );
        }
    }
}

/// Why a whole net was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NetSkip {
    Global,
    Static,
    Clock,
}

fn net_skip(net: &Net) -> Option<NetSkip> {
    if net.name.starts_with("GLOBAL_LOGIC") || net.name.starts_with("GLOBAL_USED") {
        Some(NetSkip::Global)
    } else if matches!(net.kind, NetKind::Vcc | NetKind::Gnd) {
        Some(NetSkip::Static)
    } else if net.kind == NetKind::Clock {
        Some(NetSkip::Clock)
    } else {
        None
    }
}

/// One computed connection, ready to insert.
#[derive(Debug, Clone)]
struct SinkEdge {
    sink: String,
    sink_is_flop: bool,
    delay: NetDelay,
}

/// Everything one net contributes to the graph.
#[derive(Debug, Clone, Default)]
struct NetEdges {
    source: Option<(String, bool)>,
    logic: f64,
    sinks: Vec<SinkEdge>,
    stats: BuildStats,
}

/// Carry-chain configuration implied by which carry inputs are connected.
pub fn carry_config(cell: &Cell) -> [&'static str; 2] {
    if cell.physical_pin("CI").is_none() {
        CARRY_FROM_GROUND
    } else if cell.physical_pin("CI_TOP").is_none() {
        CARRY_TOP_FROM_GROUND
    } else {
        CARRY_FROM_CIN
    }
}

/// Builds timing graphs against one [`TimingModel`].
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    model: &'a TimingModel,
    parallel: bool,
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder that computes net delays in parallel.
    pub fn new(model: &'a TimingModel) -> Self {
        Self {
            model,
            parallel: true,
        }
    }

    /// Enables or disables the rayon pool for per-net delays.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn estimator(&self) -> NetDelayEstimator<'a> {
        NetDelayEstimator::new(
            &self.model.tables,
            &self.model.terms,
            &self.model.distances,
            self.model.options,
        )
    }

    /// Builds a graph over every net of the design.
    pub fn build(&self, design: &PhysDesign) -> KairosResult<(TimingGraph, BuildStats)> {
        let nets: Vec<NetId> = design.net_ids().collect();
        self.build_nets(design, &nets)
    }

    /// Builds a graph with all primitive edges but only the given nets.
    pub fn build_nets(
        &self,
        design: &PhysDesign,
        nets: &[NetId],
    ) -> KairosResult<(TimingGraph, BuildStats)> {
        let mut graph = TimingGraph::new();
        let mut stats = BuildStats::default();
        self.add_primitive_edges(design, &mut graph, &mut stats);
        self.add_net_edges(design, nets, &mut graph, &mut stats)?;
        stats.super_edges = graph.connect_super_edges(&self.output_vertices(design, &graph));
        log::debug!(
            "built timing graph for '{}': {} vertices, {} primitive, {} net, {} super edges",
            design.name,
            graph.vertex_count(),
            stats.primitive_edges,
            stats.net_edges,
            stats.super_edges
        );
        Ok((graph, stats))
    }

    /// Re-derives the net edges of `changed` nets in an existing graph.
    ///
    /// Old edges of those nets and all super edges are removed, the nets are
    /// rebuilt, and the super edges reconnected. Vertices are kept.
    pub fn partial_build(
        &self,
        design: &PhysDesign,
        changed: &[NetId],
        graph: &mut TimingGraph,
    ) -> KairosResult<BuildStats> {
        let set: HashSet<NetId> = changed.iter().copied().collect();
        let removed = graph.remove_net_edges(&set);
        graph.remove_super_edges();

        let mut stats = BuildStats::default();
        self.add_net_edges(design, changed, graph, &mut stats)?;
        stats.super_edges = graph.connect_super_edges(&self.output_vertices(design, graph));
        graph.invalidate();
        log::debug!(
            "partial rebuild of {} nets: removed {removed} edges, added {}",
            changed.len(),
            stats.net_edges
        );
        Ok(stats)
    }

    fn output_vertices(
        &self,
        design: &PhysDesign,
        graph: &TimingGraph,
    ) -> Vec<VertexId> {
        design
            .output_ports
            .iter()
            .filter_map(|p| graph.find_vertex(p))
            .collect()
    }

    fn add_primitive_edges(
        &self,
        design: &PhysDesign,
        graph: &mut TimingGraph,
        stats: &mut BuildStats,
    ) {
        for cell in &design.cells {
            let Some(bel) = cell.bel.as_deref() else {
                continue;
            };
            let ty = cell.cell_type.as_str();
            if ty.starts_with("LUT") || ty.starts_with("RAM") || ty.starts_with("SRL") {
                let used = match (cell.lut_init, lut_width(ty)) {
                    (Some(init), _) if cell.in_lut6_2() => {
                        Some(used_inputs(init, ty == "LUT5", cell.i5_tie))
                    }
                    (Some(init), Some(width)) => Some(table_inputs(init, width)),
                    _ => None,
                };
                for input in &cell.inputs {
                    if let (Some(used), Some(k)) = (used, input_index(input)) {
                        if !used[k] {
                            continue;
                        }
                    }
                    let Some(from) = cell.physical_pin(input) else {
                        continue;
                    };
                    for output in &cell.outputs {
                        let Some(to) = cell.physical_pin(output) else {
                            continue;
                        };
                        let delay = self.model.tables.logic_delay(bel, from, to, &[]);
                        self.add_logic_edge(graph, stats, cell, input, output, delay);
                    }
                }
            } else if ty.starts_with("CARRY") {
                let config = carry_config(cell);
                for input in &cell.inputs {
                    let (from, cfg): (&str, &[&str]) = match cell.physical_pin(input) {
                        Some(pin) => (pin, &config[..]),
                        None => (input.as_str(), &[][..]),
                    };
                    for output in &cell.outputs {
                        let to = cell.physical_pin(output).unwrap_or(output);
                        let delay = self.model.tables.logic_delay(bel, from, to, cfg);
                        self.add_logic_edge(graph, stats, cell, input, output, delay);
                    }
                }
            }
        }
    }

    fn add_logic_edge(
        &self,
        graph: &mut TimingGraph,
        stats: &mut BuildStats,
        cell: &Cell,
        input: &str,
        output: &str,
        delay: Result<Option<i16>, LookupError>,
    ) {
        match delay {
            Ok(Some(d)) if d >= 0 => {
                let from = graph.vertex(&format!("{}/{input}", cell.name));
                let to = graph.vertex(&format!("{}/{output}", cell.name));
                let e = graph.add_edge(from, to, EdgeKind::Logic, None);
                graph.set_logic_delay(e, f64::from(d));
                stats.primitive_edges += 1;
            }
            // A negative table entry marks an arc that does not exist.
            Ok(_) => {}
            Err(err) => {
                log::trace!("{}: {err}", cell.name);
                stats.lookup_errors += 1;
            }
        }
    }

    fn add_net_edges(
        &self,
        design: &PhysDesign,
        nets: &[NetId],
        graph: &mut TimingGraph,
        stats: &mut BuildStats,
    ) -> KairosResult<()> {
        let computed: Vec<(NetId, NetEdges)> = if self.parallel {
            nets.par_iter()
                .map(|&id| Ok((id, self.net_edges(design, id)?)))
                .collect::<KairosResult<_>>()?
        } else {
            nets.iter()
                .map(|&id| Ok((id, self.net_edges(design, id)?)))
                .collect::<KairosResult<_>>()?
        };

        for (id, edges) in computed {
            stats.absorb(&edges.stats);
            let Some((source, source_is_flop)) = edges.source else {
                continue;
            };
            if edges.sinks.is_empty() {
                continue;
            }
            let from = graph.vertex(&source);
            if source_is_flop {
                graph.set_flop_output(from);
            }
            for sink in edges.sinks {
                let to = graph.vertex(&sink.sink);
                if sink.sink_is_flop {
                    graph.set_flop_input(to);
                }
                let e = graph.add_edge(from, to, EdgeKind::Net, Some(id));
                graph.set_delays(e, edges.logic, sink.delay.net, sink.delay.intra_site);
                stats.net_edges += 1;
            }
        }
        Ok(())
    }

    /// Computes the edges of one net without touching the graph.
    fn net_edges(&self, design: &PhysDesign, id: NetId) -> KairosResult<NetEdges> {
        let mut out = NetEdges::default();
        let Some(net) = design.net(id) else {
            return Ok(out);
        };
        match net_skip(net) {
            Some(NetSkip::Global) => out.stats.skipped_global_nets += 1,
            Some(NetSkip::Static) => out.stats.skipped_static_nets += 1,
            Some(NetSkip::Clock) => out.stats.skipped_clock_nets += 1,
            None => {}
        }
        if net_skip(net).is_some() || net.sinks.is_empty() {
            return Ok(out);
        }
        let Some(source) = net.source.as_ref() else {
            return Ok(out);
        };
        let (Some(src_cell), Some(src_name)) = (design.cell(source.cell), design.pin_name(source))
        else {
            out.stats.unroutable_sinks += net.sinks.len();
            return Ok(out);
        };

        if src_cell.is_flip_flop() {
            out.logic = self.model.terms.logic_ff_delay;
        }
        out.source = Some((src_name, src_cell.is_flip_flop()));

        let same_site = src_cell.site.is_some()
            && net.sinks.iter().all(|s| {
                design
                    .cell(s.cell)
                    .is_some_and(|c| c.site.is_some() && c.site == src_cell.site)
            });
        let estimator = self.estimator();

        for sink in &net.sinks {
            let (Some(dst_cell), Some(dst_name)) = (design.cell(sink.cell), design.pin_name(sink))
            else {
                out.stats.unroutable_sinks += 1;
                continue;
            };

            let delay = if same_site || (source.node.is_none() && sink.node.is_none()) {
                match self.intra_site_edge(src_cell, source, dst_cell, sink, &mut out.stats) {
                    Some(d) => d,
                    None => continue,
                }
            } else {
                let Some(sink_node) = sink.node else {
                    out.stats.unroutable_sinks += 1;
                    continue;
                };
                let path = match trace_route(net, source.node, sink_node) {
                    Ok(path) => path,
                    Err(err) => {
                        log::debug!("{err}");
                        out.stats.unroutable_sinks += 1;
                        continue;
                    }
                };
                let ends = Endpoints {
                    source_bel: src_cell.bel.as_deref(),
                    source_bel_pin: bel_pin(src_cell, source),
                    source_site_pin: source.site_pin.as_deref(),
                    sink_bel: dst_cell.bel.as_deref(),
                    sink_site_pin: sink.site_pin.as_deref(),
                };
                estimator.estimate(&path, &ends, design)?
            };
            log::trace!(
                "{} -> {dst_name}: net {:.1} ps, intra-site {:.1} ps",
                net.name,
                delay.net,
                delay.intra_site
            );
            out.sinks.push(SinkEdge {
                sink: dst_name,
                sink_is_flop: dst_cell.is_flip_flop(),
                delay,
            });
        }
        Ok(out)
    }

    /// Delay of a connection that never leaves the site.
    fn intra_site_edge(
        &self,
        src_cell: &Cell,
        source: &Terminal,
        dst_cell: &Cell,
        sink: &Terminal,
        stats: &mut BuildStats,
    ) -> Option<NetDelay> {
        let from_pin = bel_pin(src_cell, source);
        let to_pin = bel_pin(dst_cell, sink).or(sink.site_pin.as_deref());
        let (Some(site_type), Some(src_bel), Some(from_pin), Some(dst_bel), Some(to_pin)) = (
            src_cell.site_type.as_deref(),
            src_cell.bel.as_deref(),
            from_pin,
            dst_cell.bel.as_deref(),
            to_pin,
        ) else {
            stats.missing_intra_site_sinks += 1;
            return None;
        };
        let from = format!("{src_bel}/{from_pin}");
        let to = format!("{dst_bel}/{to_pin}");
        match self.model.tables.intra_site_delay(site_type, &from, &to) {
            Ok(Some(d)) if d >= 0 => Some(NetDelay {
                net: f64::from(d),
                intra_site: 0.0,
            }),
            Ok(_) => {
                log::trace!("no intra-site delay {site_type} {from} -> {to}");
                stats.missing_intra_site_sinks += 1;
                None
            }
            Err(err) => {
                log::trace!("{err}");
                stats.lookup_errors += 1;
                stats.missing_intra_site_sinks += 1;
                None
            }
        }
    }
}

/// The physical BEL pin of a terminal, from the terminal or the cell's pin map.
fn bel_pin<'c>(cell: &'c Cell, terminal: &'c Terminal) -> Option<&'c str> {
    terminal
        .bel_pin
        .as_deref()
        .or_else(|| cell.physical_pin(&terminal.port))
}
