//! Arrival, required-time, and slack propagation.
//!
//! Propagation runs in three passes over a cached topological order:
//! arrival times forward from the sources, required times backward from the
//! super-sink, then slack at every vertex. Results are stored in the graph
//! and dropped by any later mutation.

use crate::graph::{EdgeKind, TimingGraph};
use crate::ids::{EdgeId, VertexId};
use kairos_common::{InternalError, KairosResult};
use kairos_diagnostics::{Diagnostic, DiagnosticCode};
use std::collections::VecDeque;

/// Required time given to sinks that the super-sink does not constrain.
pub const UNCONSTRAINED_REQUIRED: f64 = 1e12;

/// Number of vertex names listed in a cycle error.
const CYCLE_NAMES_SHOWN: usize = 10;

/// Clears every arrival, required, slack, and predecessor value.
pub fn reset(graph: &mut TimingGraph) {
    graph.invalidate_propagation();
}

/// Returns the topological order of the graph, computing it if needed.
///
/// The ready queue is seeded in vertex-index order, so equal graphs give
/// equal orders. Fails if the graph has a cycle.
pub fn topo_order(graph: &mut TimingGraph) -> KairosResult<Vec<VertexId>> {
    if let Some(order) = &graph.topo {
        return Ok(order.clone());
    }

    let mut in_degree: Vec<usize> = graph.vertices().map(|v| graph.in_degree(v)).collect();
    let mut ready: VecDeque<VertexId> = graph
        .vertices()
        .filter(|v| in_degree[v.index()] == 0)
        .collect();
    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(v) = ready.pop_front() {
        order.push(v);
        for &e in graph.outgoing(v) {
            let Some(edge) = graph.edge(e) else {
                continue;
            };
            let slot = &mut in_degree[edge.to().index()];
            *slot -= 1;
            if *slot == 0 {
                ready.push_back(edge.to());
            }
        }
    }

    if order.len() < graph.vertex_count() {
        let stuck: Vec<&str> = graph
            .vertices()
            .filter(|v| in_degree[v.index()] > 0)
            .map(|v| graph.vertex_name(v))
            .collect();
        let mut names = stuck
            .iter()
            .take(CYCLE_NAMES_SHOWN)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        if stuck.len() > CYCLE_NAMES_SHOWN {
            names.push_str(&format!(", ... ({} more)", stuck.len() - CYCLE_NAMES_SHOWN));
        }
        return Err(InternalError::new(format!(
            "timing graph has a cycle through: {names}"
        )));
    }

    graph.topo = Some(order.clone());
    Ok(order)
}

/// Propagates arrival times, required times, and slack.
///
/// `requirement` is the required time at the super-sink in picoseconds.
/// Re-propagating an unchanged graph gives identical results.
pub fn propagate(graph: &mut TimingGraph, requirement: f64) -> KairosResult<()> {
    reset(graph);
    let order = topo_order(graph)?;
    let n = graph.vertex_count();

    let mut arrival: Vec<Option<f64>> = vec![None; n];
    let mut predecessor: Vec<Option<EdgeId>> = vec![None; n];
    for &v in &order {
        let current = arrival[v.index()];
        let arr = match current {
            Some(a) => a,
            None if graph.in_degree(v) == 0 => {
                arrival[v.index()] = Some(0.0);
                0.0
            }
            None => continue,
        };
        for &e in graph.outgoing(v) {
            let Some(edge) = graph.edge(e) else {
                continue;
            };
            let cand = arr + edge.delay();
            let to = edge.to().index();
            if arrival[to].map_or(true, |cur| cand > cur) {
                arrival[to] = Some(cand);
                predecessor[to] = Some(e);
            }
        }
    }

    let mut required: Vec<Option<f64>> = vec![None; n];
    let mut reaches_sink = vec![false; n];
    for &v in order.iter().rev() {
        if v == VertexId::SUPER_SINK {
            required[v.index()] = Some(requirement);
            reaches_sink[v.index()] = true;
            continue;
        }
        if graph.out_degree(v) == 0 {
            required[v.index()] = Some(UNCONSTRAINED_REQUIRED);
            continue;
        }
        let mut req = f64::INFINITY;
        for &e in graph.outgoing(v) {
            let Some(edge) = graph.edge(e) else {
                continue;
            };
            let to = edge.to().index();
            if let Some(r) = required[to] {
                req = req.min(r - edge.delay());
            }
            reaches_sink[v.index()] |= reaches_sink[to];
        }
        required[v.index()] = Some(req);
    }

    if let Some(v) = graph
        .vertices()
        .find(|&v| {
            graph.is_flop_input(v) && graph.in_degree(v) > 0 && !reaches_sink[v.index()]
        })
    {
        return Err(InternalError::new(format!(
            "sequential input '{}' does not reach the super-sink",
            graph.vertex_name(v)
        )));
    }

    let slack: Vec<Option<f64>> = arrival
        .iter()
        .zip(&required)
        .map(|(a, r)| Some(r.as_ref()? - a.as_ref()?))
        .collect();

    graph.arrival = arrival;
    graph.required = required;
    graph.slack = slack;
    graph.predecessor = predecessor;
    graph.requirement = Some(requirement);
    log::debug!(
        "propagated {} vertices against {requirement:.1} ps",
        order.len()
    );
    Ok(())
}

/// The real vertex with the latest arrival, lowest index on ties.
///
/// Falls back to the super-sink when the graph has no real vertices.
fn critical_endpoint(graph: &TimingGraph) -> Option<VertexId> {
    let mut best: Option<(VertexId, f64)> = None;
    for v in graph.vertices().filter(|v| !v.is_super()) {
        if let Some(a) = graph.arrival(v) {
            if best.map_or(true, |(_, b)| a > b) {
                best = Some((v, a));
            }
        }
    }
    best.map(|(v, _)| v).or_else(|| {
        graph
            .arrival(VertexId::SUPER_SINK)
            .map(|_| VertexId::SUPER_SINK)
    })
}

/// The edges of the latest-arriving path, source first.
///
/// Super edges are left out. Empty before propagation.
pub fn critical_path(graph: &TimingGraph) -> Vec<EdgeId> {
    if !graph.is_propagated() {
        return Vec::new();
    }
    let Some(mut v) = critical_endpoint(graph) else {
        return Vec::new();
    };
    let mut path = Vec::new();
    while let Some(e) = graph.predecessor(v) {
        let Some(edge) = graph.edge(e) else {
            break;
        };
        if edge.kind() != EdgeKind::Super {
            path.push(e);
        }
        v = edge.from();
    }
    path.reverse();
    path
}

/// The latest arrival over real vertices, or 0.0 before propagation.
pub fn critical_delay(graph: &TimingGraph) -> f64 {
    critical_endpoint(graph)
        .and_then(|v| graph.arrival(v))
        .unwrap_or(0.0)
}

/// The minimum slack over the graph's endpoints.
///
/// Endpoints are real vertices with no fan-out, plus the super-sink when
/// anything feeds it. `None` before propagation.
pub fn worst_slack(graph: &TimingGraph) -> Option<f64> {
    if !graph.is_propagated() {
        return None;
    }
    graph
        .vertices()
        .filter(|&v| {
            if v == VertexId::SUPER_SINK {
                graph.in_degree(v) > 0
            } else {
                !v.is_super() && graph.out_degree(v) == 0
            }
        })
        .filter_map(|v| graph.slack(v))
        .reduce(f64::min)
}

/// A `T010` warning when the worst slack is negative.
pub fn requirement_diagnostic(graph: &TimingGraph) -> Option<Diagnostic> {
    let slack = worst_slack(graph)?;
    if slack >= 0.0 {
        return None;
    }
    let requirement = graph.requirement().unwrap_or_default();
    Some(
        Diagnostic::warning(
            DiagnosticCode::REQUIREMENT_VIOLATED,
            format!("timing requirement not met: worst slack = {slack:.1} ps"),
        )
        .with_note(format!(
            "critical path delay {:.1} ps against a requirement of {requirement:.1} ps",
            critical_delay(graph)
        )),
    )
}
