//! Per-connection criticality for timing-driven routing.

use crate::graph::TimingGraph;
use crate::ids::EdgeId;
use crate::sta::critical_delay;

/// Criticality of the connection carried by `edge`, in `[0, max_criticality]`.
///
/// The connection's minimum slack, `required(to) - arrival(from) - delay`,
/// is normalized against the critical-path delay:
/// `(1 - slack / critical_delay)^exponent * max_criticality`. Returns 0.0
/// before propagation, for a removed edge, or when the critical delay is not
/// positive.
pub fn criticality(graph: &TimingGraph, edge: EdgeId, max_criticality: f64, exponent: f64) -> f64 {
    if !graph.is_propagated() {
        return 0.0;
    }
    let Some(e) = graph.edge(edge) else {
        return 0.0;
    };
    let (Some(arrival), Some(required)) = (graph.arrival(e.from()), graph.required(e.to())) else {
        return 0.0;
    };
    let max_delay = critical_delay(graph);
    if max_delay <= 0.0 {
        return 0.0;
    }
    let min_slack = required - arrival - e.delay();
    let base = (1.0 - min_slack / max_delay).max(0.0);
    (base.powf(exponent) * max_criticality).clamp(0.0, max_criticality)
}

/// [`criticality`] of the edge between two named pins, if both exist and
/// are connected.
pub fn criticality_for_pins(
    graph: &TimingGraph,
    from: &str,
    to: &str,
    max_criticality: f64,
    exponent: f64,
) -> Option<f64> {
    let edge = graph.edge_between(graph.find_vertex(from)?, graph.find_vertex(to)?)?;
    Some(criticality(graph, edge, max_criticality, exponent))
}
