//! Timing graph arena.
//!
//! A [`TimingGraph`] holds one vertex per pin name and directed delay edges
//! between them. Vertex 0 is the super-source and vertex 1 the super-sink;
//! both exist from construction. Per-vertex propagation results live in
//! parallel arrays indexed by [`VertexId`].
//!
//! Removed edges are tombstoned: their [`EdgeId`] keeps resolving to the
//! removed slot and is never handed out again.

use crate::ids::{EdgeId, VertexId};
use kairos_common::{ContentHash, ContentHasher, Ident, Interner};
use kairos_design::NetId;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

const SUPER_SOURCE_NAME: &str = "<super-source>";
const SUPER_SINK_NAME: &str = "<super-sink>";

/// What an edge models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    /// Input pin to output pin through a primitive.
    Logic,
    /// Driver pin to sink pin along a net.
    Net,
    /// Connection to or from the super vertices.
    Super,
}

/// A directed delay edge.
///
/// The total weight is kept equal to `logic + net + intra_site`; every
/// component change goes through [`DelayEdge::set_components`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayEdge {
    from: VertexId,
    to: VertexId,
    kind: EdgeKind,
    net: Option<NetId>,
    logic: f64,
    net_delay: f64,
    intra_site: f64,
    total: f64,
}

impl DelayEdge {
    fn new(from: VertexId, to: VertexId, kind: EdgeKind, net: Option<NetId>) -> Self {
        Self {
            from,
            to,
            kind,
            net,
            logic: 0.0,
            net_delay: 0.0,
            intra_site: 0.0,
            total: 0.0,
        }
    }

    /// Driving vertex.
    pub fn from(&self) -> VertexId {
        self.from
    }

    /// Driven vertex.
    pub fn to(&self) -> VertexId {
        self.to
    }

    /// What the edge models.
    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// The net this edge was built from, for net edges.
    pub fn net(&self) -> Option<NetId> {
        self.net
    }

    /// Primitive delay in ps.
    pub fn logic_delay(&self) -> f64 {
        self.logic
    }

    /// Interconnect delay in ps.
    pub fn net_delay(&self) -> f64 {
        self.net_delay
    }

    /// Delay inside the source and sink sites in ps.
    pub fn intra_site_delay(&self) -> f64 {
        self.intra_site
    }

    /// Sum of all components.
    pub fn delay(&self) -> f64 {
        self.total
    }

    /// Replaces all three components and recomputes the total.
    pub fn set_components(&mut self, logic: f64, net: f64, intra_site: f64) {
        self.logic = logic;
        self.net_delay = net;
        self.intra_site = intra_site;
        self.total = logic + net + intra_site;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct VertexFlags {
    flop_input: bool,
    flop_output: bool,
}

/// Pin-level timing graph with reserved super-source and super-sink.
pub struct TimingGraph {
    interner: Interner,
    names: Vec<Ident>,
    by_name: HashMap<Ident, VertexId>,
    flags: Vec<VertexFlags>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,

    edges: Vec<DelayEdge>,
    removed: Vec<bool>,
    by_pair: HashMap<(VertexId, VertexId), EdgeId>,
    live_edges: usize,

    pub(crate) topo: Option<Vec<VertexId>>,
    pub(crate) arrival: Vec<Option<f64>>,
    pub(crate) required: Vec<Option<f64>>,
    pub(crate) slack: Vec<Option<f64>>,
    pub(crate) predecessor: Vec<Option<EdgeId>>,
    pub(crate) requirement: Option<f64>,
}

impl TimingGraph {
    /// Creates a graph holding only the super-source and super-sink.
    pub fn new() -> Self {
        let mut graph = Self {
            interner: Interner::new(),
            names: Vec::new(),
            by_name: HashMap::new(),
            flags: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            edges: Vec::new(),
            removed: Vec::new(),
            by_pair: HashMap::new(),
            live_edges: 0,
            topo: None,
            arrival: Vec::new(),
            required: Vec::new(),
            slack: Vec::new(),
            predecessor: Vec::new(),
            requirement: None,
        };
        let source = graph.push_vertex(SUPER_SOURCE_NAME);
        let sink = graph.push_vertex(SUPER_SINK_NAME);
        debug_assert_eq!((source, sink), (VertexId::SUPER_SOURCE, VertexId::SUPER_SINK));
        graph
    }

    fn push_vertex(&mut self, name: &str) -> VertexId {
        let ident = self.interner.get_or_intern(name);
        let id = VertexId::from_raw(self.names.len() as u32);
        self.names.push(ident);
        self.by_name.insert(ident, id);
        self.flags.push(VertexFlags::default());
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.arrival.push(None);
        self.required.push(None);
        self.slack.push(None);
        self.predecessor.push(None);
        self.invalidate();
        id
    }

    /// Returns the vertex for a pin name, creating it on first use.
    ///
    /// A leading `/` is ignored, so `"/a/b"` and `"a/b"` are the same pin.
    pub fn vertex(&mut self, name: &str) -> VertexId {
        match self.find_vertex(name) {
            Some(id) => id,
            None => self.push_vertex(name),
        }
    }

    /// Looks up a pin name without creating a vertex.
    pub fn find_vertex(&self, name: &str) -> Option<VertexId> {
        let ident = self.interner.get(name)?;
        self.by_name.get(&ident).copied()
    }

    /// The pin name of a vertex.
    pub fn vertex_name(&self, id: VertexId) -> &str {
        self.interner.resolve(self.names[id.index()])
    }

    /// Number of vertices, including the two super vertices.
    pub fn vertex_count(&self) -> usize {
        self.names.len()
    }

    /// All vertex IDs in index order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> {
        (0..self.names.len() as u32).map(VertexId::from_raw)
    }

    /// Marks a vertex as a sequential-element input.
    pub fn set_flop_input(&mut self, id: VertexId) {
        self.flags[id.index()].flop_input = true;
    }

    /// Marks a vertex as a sequential-element output.
    pub fn set_flop_output(&mut self, id: VertexId) {
        self.flags[id.index()].flop_output = true;
    }

    /// Whether the vertex is a sequential-element input.
    pub fn is_flop_input(&self, id: VertexId) -> bool {
        self.flags[id.index()].flop_input
    }

    /// Whether the vertex is a sequential-element output.
    pub fn is_flop_output(&self, id: VertexId) -> bool {
        self.flags[id.index()].flop_output
    }

    /// Adds an edge, or updates the existing edge between the same pair.
    ///
    /// At most one live edge connects any ordered vertex pair.
    pub fn add_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        kind: EdgeKind,
        net: Option<NetId>,
    ) -> EdgeId {
        if let Some(&id) = self.by_pair.get(&(from, to)) {
            let edge = &mut self.edges[id.index()];
            edge.kind = kind;
            edge.net = net;
            edge.set_components(0.0, 0.0, 0.0);
            self.invalidate_propagation();
            return id;
        }
        let id = EdgeId::from_raw(self.edges.len() as u32);
        self.edges.push(DelayEdge::new(from, to, kind, net));
        self.removed.push(false);
        self.by_pair.insert((from, to), id);
        self.outgoing[from.index()].push(id);
        self.incoming[to.index()].push(id);
        self.live_edges += 1;
        self.invalidate();
        id
    }

    /// Tombstones an edge. Removing an already removed edge does nothing.
    pub fn remove_edge(&mut self, id: EdgeId) {
        if self.removed[id.index()] {
            return;
        }
        self.removed[id.index()] = true;
        let (from, to) = (self.edges[id.index()].from, self.edges[id.index()].to);
        self.by_pair.remove(&(from, to));
        self.outgoing[from.index()].retain(|&e| e != id);
        self.incoming[to.index()].retain(|&e| e != id);
        self.live_edges -= 1;
        self.invalidate();
    }

    /// The edge with the given ID, or `None` if it was removed.
    pub fn edge(&self, id: EdgeId) -> Option<&DelayEdge> {
        if self.removed.get(id.index()).copied().unwrap_or(true) {
            None
        } else {
            Some(&self.edges[id.index()])
        }
    }

    /// Whether the ID refers to a removed edge.
    pub fn is_removed(&self, id: EdgeId) -> bool {
        self.removed.get(id.index()).copied().unwrap_or(false)
    }

    /// The live edge from `from` to `to`, if any.
    pub fn edge_between(&self, from: VertexId, to: VertexId) -> Option<EdgeId> {
        self.by_pair.get(&(from, to)).copied()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    /// Live edges in ID order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &DelayEdge)> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.removed[*i])
            .map(|(i, e)| (EdgeId::from_raw(i as u32), e))
    }

    /// Live edges leaving a vertex, in insertion order.
    pub fn outgoing(&self, id: VertexId) -> &[EdgeId] {
        &self.outgoing[id.index()]
    }

    /// Live edges entering a vertex, in insertion order.
    pub fn incoming(&self, id: VertexId) -> &[EdgeId] {
        &self.incoming[id.index()]
    }

    /// Number of live edges entering a vertex.
    pub fn in_degree(&self, id: VertexId) -> usize {
        self.incoming[id.index()].len()
    }

    /// Number of live edges leaving a vertex.
    pub fn out_degree(&self, id: VertexId) -> usize {
        self.outgoing[id.index()].len()
    }

    /// Sets all delay components of an edge.
    pub fn set_delays(&mut self, id: EdgeId, logic: f64, net: f64, intra_site: f64) {
        self.edges[id.index()].set_components(logic, net, intra_site);
        self.invalidate_propagation();
    }

    /// Sets the primitive delay of an edge.
    pub fn set_logic_delay(&mut self, id: EdgeId, logic: f64) {
        let e = &self.edges[id.index()];
        let (net, intra) = (e.net_delay, e.intra_site);
        self.set_delays(id, logic, net, intra);
    }

    /// Sets the interconnect delay of an edge.
    pub fn set_net_delay(&mut self, id: EdgeId, net: f64) {
        let e = &self.edges[id.index()];
        let (logic, intra) = (e.logic, e.intra_site);
        self.set_delays(id, logic, net, intra);
    }

    /// Sets the intra-site delay of an edge.
    pub fn set_intra_site_delay(&mut self, id: EdgeId, intra_site: f64) {
        let e = &self.edges[id.index()];
        let (logic, net) = (e.logic, e.net_delay);
        self.set_delays(id, logic, net, intra_site);
    }

    /// Removes every net edge built from one of `nets`. Returns the count.
    pub fn remove_net_edges(&mut self, nets: &HashSet<NetId>) -> usize {
        let doomed: Vec<EdgeId> = self
            .edges()
            .filter(|(_, e)| e.kind == EdgeKind::Net && e.net.is_some_and(|n| nets.contains(&n)))
            .map(|(id, _)| id)
            .collect();
        for &id in &doomed {
            self.remove_edge(id);
        }
        doomed.len()
    }

    /// Removes every super edge. Returns the count.
    pub fn remove_super_edges(&mut self) -> usize {
        let doomed: Vec<EdgeId> = self
            .edges()
            .filter(|(_, e)| e.kind == EdgeKind::Super)
            .map(|(id, _)| id)
            .collect();
        for &id in &doomed {
            self.remove_edge(id);
        }
        doomed.len()
    }

    /// Connects the super vertices. Returns the number of edges added.
    ///
    /// The super-source drives every vertex with no fan-in and some fan-out.
    /// The super-sink is fed by every flip-flop input, every vertex with
    /// fan-in but no fan-out, and every vertex in `outputs`. Isolated
    /// vertices get no super edges.
    pub fn connect_super_edges(&mut self, outputs: &[VertexId]) -> usize {
        let mut starts = Vec::new();
        let mut ends = BTreeSet::new();
        for v in self.vertices().filter(|v| !v.is_super()) {
            let (fan_in, fan_out) = (self.in_degree(v), self.out_degree(v));
            if fan_in == 0 && fan_out == 0 {
                continue;
            }
            if fan_in == 0 {
                starts.push(v);
            }
            if fan_out == 0 || self.is_flop_input(v) {
                ends.insert(v);
            }
        }
        for &v in outputs {
            if !v.is_super() && (self.in_degree(v) > 0 || self.out_degree(v) > 0) {
                ends.insert(v);
            }
        }

        let added = starts.len() + ends.len();
        for v in starts {
            self.add_edge(VertexId::SUPER_SOURCE, v, EdgeKind::Super, None);
        }
        for v in ends {
            self.add_edge(v, VertexId::SUPER_SINK, EdgeKind::Super, None);
        }
        added
    }

    /// Arrival time at a vertex, if propagated.
    pub fn arrival(&self, id: VertexId) -> Option<f64> {
        self.arrival[id.index()]
    }

    /// Required time at a vertex, if propagated.
    pub fn required(&self, id: VertexId) -> Option<f64> {
        self.required[id.index()]
    }

    /// Slack at a vertex, if both arrival and required time are known.
    pub fn slack(&self, id: VertexId) -> Option<f64> {
        self.slack[id.index()]
    }

    /// The edge on the latest-arriving path into a vertex.
    pub fn predecessor(&self, id: VertexId) -> Option<EdgeId> {
        self.predecessor[id.index()]
    }

    /// [`arrival`](Self::arrival), or 0.0 before propagation.
    pub fn arrival_or_zero(&self, id: VertexId) -> f64 {
        self.arrival(id).unwrap_or(0.0)
    }

    /// [`required`](Self::required), or 0.0 before propagation.
    pub fn required_or_zero(&self, id: VertexId) -> f64 {
        self.required(id).unwrap_or(0.0)
    }

    /// [`slack`](Self::slack), or 0.0 before propagation.
    pub fn slack_or_zero(&self, id: VertexId) -> f64 {
        self.slack(id).unwrap_or(0.0)
    }

    /// The requirement of the last propagation, if current.
    pub fn requirement(&self) -> Option<f64> {
        self.requirement
    }

    /// Whether propagation results are current.
    pub fn is_propagated(&self) -> bool {
        self.requirement.is_some()
    }

    /// Drops the cached topological order and all propagation results.
    pub fn invalidate(&mut self) {
        self.topo = None;
        self.invalidate_propagation();
    }

    /// Clears arrival, required, slack, and predecessor values.
    pub fn invalidate_propagation(&mut self) {
        if self.requirement.is_none() && self.arrival.iter().all(Option::is_none) {
            return;
        }
        self.arrival.fill(None);
        self.required.fill(None);
        self.slack.fill(None);
        self.predecessor.fill(None);
        self.requirement = None;
    }

    /// Hash of vertex names, flags, and live edges with their delays.
    ///
    /// Two graphs built from the same design have equal fingerprints.
    pub fn fingerprint(&self) -> ContentHash {
        let mut h = ContentHasher::new();
        for v in self.vertices() {
            h.update_str(self.vertex_name(v));
            let f = self.flags[v.index()];
            h.update(&[u8::from(f.flop_input), u8::from(f.flop_output)]);
        }
        for (id, e) in self.edges() {
            h.update(&id.as_raw().to_le_bytes());
            h.update_str(self.vertex_name(e.from));
            h.update_str(self.vertex_name(e.to));
            h.update(&[e.kind as u8]);
            h.update_f64(e.logic);
            h.update_f64(e.net_delay);
            h.update_f64(e.intra_site);
        }
        h.finish()
    }
}

impl Default for TimingGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimingGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimingGraph")
            .field("vertices", &self.vertex_count())
            .field("edges", &self.edge_count())
            .field("propagated", &self.is_propagated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graph_has_super_vertices() {
        let g = TimingGraph::new();
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.vertex_name(VertexId::SUPER_SOURCE), SUPER_SOURCE_NAME);
        assert_eq!(g.vertex_name(VertexId::SUPER_SINK), SUPER_SINK_NAME);
    }

    #[test]
    fn names_are_deduplicated() {
        let mut g = TimingGraph::new();
        let a = g.vertex("u0/lut/O");
        let b = g.vertex("/u0/lut/O");
        assert_eq!(a, b);
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.vertex_name(a), "u0/lut/O");
        assert_eq!(g.find_vertex("/u0/lut/O"), Some(a));
        assert_eq!(g.find_vertex("missing"), None);
    }

    #[test]
    fn total_tracks_components() {
        let mut g = TimingGraph::new();
        let (a, b) = (g.vertex("a"), g.vertex("b"));
        let e = g.add_edge(a, b, EdgeKind::Net, None);
        g.set_delays(e, 10.0, 20.0, 5.0);
        assert_eq!(g.edge(e).unwrap().delay(), 35.0);
        g.set_logic_delay(e, 1.0);
        assert_eq!(g.edge(e).unwrap().delay(), 26.0);
        g.set_net_delay(e, 0.0);
        assert_eq!(g.edge(e).unwrap().delay(), 6.0);
        g.set_intra_site_delay(e, 2.0);
        let edge = g.edge(e).unwrap();
        assert_eq!(edge.delay(), edge.logic_delay() + edge.net_delay() + edge.intra_site_delay());
        assert_eq!(edge.delay(), 3.0);
    }

    #[test]
    fn second_edge_for_pair_replaces_first() {
        let mut g = TimingGraph::new();
        let (a, b) = (g.vertex("a"), g.vertex("b"));
        let first = g.add_edge(a, b, EdgeKind::Logic, None);
        g.set_delays(first, 100.0, 0.0, 0.0);
        let second = g.add_edge(a, b, EdgeKind::Net, Some(NetId::from_raw(3)));
        assert_eq!(first, second);
        assert_eq!(g.edge_count(), 1);
        let edge = g.edge(second).unwrap();
        assert_eq!(edge.kind(), EdgeKind::Net);
        assert_eq!(edge.delay(), 0.0);
        assert_eq!(g.out_degree(a), 1);
    }

    #[test]
    fn removed_edge_ids_stay_dead() {
        let mut g = TimingGraph::new();
        let (a, b, c) = (g.vertex("a"), g.vertex("b"), g.vertex("c"));
        let ab = g.add_edge(a, b, EdgeKind::Net, None);
        g.remove_edge(ab);
        assert!(g.edge(ab).is_none());
        assert!(g.is_removed(ab));
        assert_eq!(g.edge_between(a, b), None);

        let bc = g.add_edge(b, c, EdgeKind::Net, None);
        assert_ne!(ab, bc);
        assert!(g.edge(ab).is_none());
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.in_degree(b), 0);
    }

    #[test]
    fn super_edges_follow_degrees() {
        let mut g = TimingGraph::new();
        let (a, b, c) = (g.vertex("a"), g.vertex("b"), g.vertex("c"));
        let ff = g.vertex("ff/D");
        let lone = g.vertex("lone");
        g.add_edge(a, b, EdgeKind::Logic, None);
        g.add_edge(b, c, EdgeKind::Net, None);
        g.add_edge(b, ff, EdgeKind::Net, None);
        g.set_flop_input(ff);

        let added = g.connect_super_edges(&[b]);
        // source -> a; c, ff, b -> sink
        assert_eq!(added, 4);
        assert!(g.edge_between(VertexId::SUPER_SOURCE, a).is_some());
        assert!(g.edge_between(c, VertexId::SUPER_SINK).is_some());
        assert!(g.edge_between(ff, VertexId::SUPER_SINK).is_some());
        assert!(g.edge_between(b, VertexId::SUPER_SINK).is_some());
        assert_eq!(g.in_degree(lone), 0);
        assert_eq!(g.out_degree(lone), 0);
        assert_eq!(g.in_degree(VertexId::SUPER_SOURCE), 0);
        assert_eq!(g.out_degree(VertexId::SUPER_SINK), 0);

        assert_eq!(g.remove_super_edges(), 4);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn remove_net_edges_by_provenance() {
        let mut g = TimingGraph::new();
        let (a, b, c) = (g.vertex("a"), g.vertex("b"), g.vertex("c"));
        let n0 = NetId::from_raw(0);
        let n1 = NetId::from_raw(1);
        g.add_edge(a, b, EdgeKind::Net, Some(n0));
        g.add_edge(b, c, EdgeKind::Net, Some(n1));
        g.add_edge(a, c, EdgeKind::Logic, None);
        assert_eq!(g.remove_net_edges(&HashSet::from([n0])), 1);
        assert_eq!(g.edge_count(), 2);
        assert!(g.edge_between(a, b).is_none());
    }

    #[test]
    fn fingerprint_depends_on_delays() {
        let build = |delay: f64| {
            let mut g = TimingGraph::new();
            let (a, b) = (g.vertex("a"), g.vertex("b"));
            let e = g.add_edge(a, b, EdgeKind::Net, None);
            g.set_net_delay(e, delay);
            g.fingerprint()
        };
        assert_eq!(build(10.0), build(10.0));
        assert_ne!(build(10.0), build(11.0));
    }

    #[test]
    fn unpropagated_queries_are_none() {
        let mut g = TimingGraph::new();
        let a = g.vertex("a");
        assert_eq!(g.arrival(a), None);
        assert_eq!(g.slack_or_zero(a), 0.0);
        assert_eq!(g.required_or_zero(a), 0.0);
        assert!(!g.is_propagated());
    }
}
