//! Human-readable, JSON, and Graphviz views of an analyzed graph.

use crate::graph::TimingGraph;
use crate::sta::{critical_delay, critical_path, worst_slack};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// One edge of the critical path with its delay breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathRow {
    /// Driving pin.
    pub from: String,
    /// Driven pin.
    pub to: String,
    /// Primitive delay in ps.
    pub logic: f64,
    /// Interconnect delay in ps.
    pub net: f64,
    /// Intra-site delay in ps.
    pub intra_site: f64,
    /// `logic + net + intra_site`.
    pub total: f64,
    /// Arrival time at `to`.
    pub arrival: f64,
}

/// The critical path of a propagated graph, edge by edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathReport {
    /// Path edges, source first.
    pub rows: Vec<PathRow>,
    /// The requirement the graph was propagated against.
    pub requirement: Option<f64>,
    /// Minimum endpoint slack.
    pub worst_slack: Option<f64>,
    /// Latest arrival time.
    pub critical_delay: f64,
}

impl PathReport {
    /// Collects the critical path of `graph`. Empty before propagation.
    pub fn from_graph(graph: &TimingGraph) -> Self {
        let rows = critical_path(graph)
            .into_iter()
            .filter_map(|id| graph.edge(id))
            .map(|e| PathRow {
                from: graph.vertex_name(e.from()).to_string(),
                to: graph.vertex_name(e.to()).to_string(),
                logic: e.logic_delay(),
                net: e.net_delay(),
                intra_site: e.intra_site_delay(),
                total: e.delay(),
                arrival: graph.arrival_or_zero(e.to()),
            })
            .collect();
        Self {
            rows,
            requirement: graph.requirement(),
            worst_slack: worst_slack(graph),
            critical_delay: critical_delay(graph),
        }
    }

    /// Whether the requirement is met. `true` when nothing was analyzed.
    pub fn met(&self) -> bool {
        self.worst_slack.map_or(true, |s| s >= 0.0)
    }
}

impl fmt::Display for PathReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|r| r.from.len().max(r.to.len()))
            .max()
            .unwrap_or(0)
            .max(4);
        writeln!(
            f,
            "{:<width$}  {:<width$}  {:>8}  {:>8}  {:>8}  {:>8}  {:>9}",
            "from", "to", "logic", "net", "intra", "total", "arrival"
        )?;
        for r in &self.rows {
            writeln!(
                f,
                "{:<width$}  {:<width$}  {:>8.1}  {:>8.1}  {:>8.1}  {:>8.1}  {:>9.1}",
                r.from, r.to, r.logic, r.net, r.intra_site, r.total, r.arrival
            )?;
        }
        writeln!(f)?;
        writeln!(f, "critical path delay: {:.1} ps", self.critical_delay)?;
        match self.requirement {
            Some(req) => writeln!(f, "requirement:         {req:.1} ps")?,
            None => writeln!(f, "requirement:         none")?,
        }
        match self.worst_slack {
            Some(slack) => write!(f, "worst slack:         {slack:.1} ps"),
            None => write!(f, "worst slack:         n/a"),
        }
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

fn quote(name: &str) -> String {
    format!("\"{}\"", escape(name))
}

/// Writes the graph in Graphviz dot syntax.
///
/// Vertices are labeled `name / arrival: slack: required`. Edges are labeled
/// `logic: net`, and edges into a vertex with negative slack are drawn bold
/// and red.
pub fn write_dot<W: Write>(graph: &TimingGraph, mut out: W) -> io::Result<()> {
    let rounded = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |x| format!("{x:.0}"));

    writeln!(out, "digraph {{")?;
    writeln!(out, "  rankdir=LR;")?;
    for v in graph.vertices() {
        writeln!(
            out,
            "  {} [label=\"{} / {}: {}: {}\"];",
            quote(graph.vertex_name(v)),
            escape(graph.vertex_name(v)),
            rounded(graph.arrival(v)),
            rounded(graph.slack(v)),
            rounded(graph.required(v)),
        )?;
    }
    for (_, e) in graph.edges() {
        let style = if graph.slack(e.to()).is_some_and(|s| s < 0.0) {
            " style=bold color=red"
        } else {
            ""
        };
        writeln!(
            out,
            "  {} -> {} [label=\"{:.0}: {:.0}\"{style}];",
            quote(graph.vertex_name(e.from())),
            quote(graph.vertex_name(e.to())),
            e.logic_delay(),
            e.net_delay() + e.intra_site_delay(),
        )?;
    }
    writeln!(out, "}}")
}
