//! Timing groups: runs of routing nodes priced as one unit.
//!
//! A routed connection is a chain of nodes joined by PIPs. The estimator
//! coalesces the chain into [`TimingGroup`]s, classifies each by wire length
//! and direction, and prices it with `k0 + k1 * L + k2 * d`.

use crate::geometry::DistanceTables;
use crate::terms::InterconnectTerms;
use kairos_common::{InternalError, KairosResult};
use kairos_design::{IntentCode, NodeId, PhysDesign, Pip, RouteNode};
use serde::Serialize;

/// Wire-length class of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GroupDelayType {
    /// One-tile wire.
    Single,
    /// Two-tile wire.
    Double,
    /// Four-tile wire.
    Quad,
    /// Twelve-tile wire.
    Long,
    /// Global clock network.
    Global,
    /// Single wire that starts and ends in the same tile.
    Internal,
    /// Bounce back into the interconnect through a site pin.
    PinBounce,
    /// Feed into a logic-block input.
    PinFeed,
    /// Anything not priced.
    Other,
}

/// Axis a group's wire runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WireDirection {
    /// Along a row.
    Horizontal,
    /// Along a column.
    Vertical,
}

/// Compass direction of a group, from its wire name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[allow(missing_docs)]
pub enum TimingDirection {
    North,
    South,
    East,
    West,
}

impl TimingDirection {
    /// Parses the `SS`/`NN`/`EE`/`WW` prefix of a wire name.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        if name.starts_with("SS") {
            Some(Self::South)
        } else if name.starts_with("NN") {
            Some(Self::North)
        } else if name.starts_with("EE") {
            Some(Self::East)
        } else if name.starts_with("WW") {
            Some(Self::West)
        } else {
            None
        }
    }

    /// The axis this direction lies on.
    pub fn axis(self) -> WireDirection {
        match self {
            Self::North | Self::South => WireDirection::Vertical,
            Self::East | Self::West => WireDirection::Horizontal,
        }
    }
}

/// Coarse reach used when filtering candidate groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum GroupDistance {
    Same,
    Near,
    Mid,
    Far,
}

/// Read access to routing nodes and their downhill connectivity.
pub trait RoutingFabric: Sync {
    /// The node with the given ID.
    fn route_node(&self, id: NodeId) -> Option<&RouteNode>;

    /// Nodes reachable from `id` through one PIP.
    fn downhill(&self, id: NodeId) -> &[NodeId] {
        self.route_node(id).map_or(&[], |n| n.downhill.as_slice())
    }
}

impl RoutingFabric for PhysDesign {
    fn route_node(&self, id: NodeId) -> Option<&RouteNode> {
        self.node(id)
    }
}

/// One or more routing nodes and the PIPs between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingGroup {
    /// Nodes in the group, in route order.
    pub nodes: Vec<NodeId>,
    /// Intent code of each node.
    pub intents: Vec<IntentCode>,
    /// PIPs entering or joining the nodes.
    pub pips: Vec<Pip>,
    /// Any node is a PinFeed.
    pub has_pin_feed: bool,
    /// Any wire belongs to the global network.
    pub has_global_wire: bool,
    /// First group of a route (the sink end).
    pub is_initial: bool,
    /// Last group of a route (the source end); never priced into the sum.
    pub is_final: bool,
    /// Wire-length class; `None` until classified.
    pub delay_type: Option<GroupDelayType>,
    /// Axis used for pricing; `None` prices a directional group at zero.
    pub wire_direction: Option<WireDirection>,
    /// Heading from the wire name prefix.
    pub direction: Option<TimingDirection>,
    /// Nominal reach in tiles.
    pub dist: u32,
    /// Resource-crossing term.
    pub d: f64,
    /// Priced delay in ps, including any site-pin surcharge.
    pub delay: f64,
}

impl TimingGroup {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node.
    pub fn push_node(&mut self, id: NodeId, node: &RouteNode) {
        if node.intent == IntentCode::PinFeed {
            self.has_pin_feed = true;
        }
        if node.has_global_wire() {
            self.has_global_wire = true;
        }
        self.nodes.push(id);
        self.intents.push(node.intent);
    }

    /// Appends a PIP.
    pub fn push_pip(&mut self, pip: Pip) {
        self.pips.push(pip);
    }

    /// The last node.
    pub fn last_node(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Sets type, direction, `dist` and `d` from the group's nodes.
    ///
    /// The node examined is the second one when the group has two nodes
    /// and either the second is a pin bounce or the first is a local node.
    pub fn classify(
        &mut self,
        fabric: &dyn RoutingFabric,
        distances: &DistanceTables,
    ) -> KairosResult<()> {
        if self.nodes.is_empty() {
            return Err(InternalError::new("cannot classify a timing group with no nodes"));
        }
        let idx = if self.nodes.len() > 1
            && (self.intents[1] == IntentCode::PinBounce || self.intents[0] == IntentCode::Local)
        {
            1
        } else {
            0
        };
        let id = self.nodes[idx];
        let node = fabric
            .route_node(id)
            .ok_or_else(|| InternalError::new(format!("timing group references unknown node {id}")))?;

        self.delay_type = None;
        self.wire_direction = None;
        self.direction = None;
        self.d = 0.0;

        let compass = || node.first_wire().and_then(|w| TimingDirection::from_wire_name(&w.name));
        let intent = self.intents[idx];
        let (ty, dist) = match intent {
            IntentCode::PinBounce => (GroupDelayType::PinBounce, 0),
            IntentCode::Single => {
                self.direction = compass();
                let same_tile = match (node.first_wire(), node.last_wire()) {
                    (Some(a), Some(b)) => a.tile == b.tile,
                    _ => true,
                };
                if same_tile {
                    (GroupDelayType::Internal, 1)
                } else {
                    self.wire_direction = self.direction.map(TimingDirection::axis);
                    (GroupDelayType::Single, 1)
                }
            }
            IntentCode::Double => {
                self.direction = compass();
                self.wire_direction = self.direction.map(TimingDirection::axis);
                (GroupDelayType::Double, 2)
            }
            IntentCode::HQuad | IntentCode::HLong => {
                self.direction = compass();
                self.wire_direction = self
                    .direction
                    .map(TimingDirection::axis)
                    .filter(|a| *a == WireDirection::Horizontal);
                let ty = if intent == IntentCode::HQuad {
                    GroupDelayType::Quad
                } else {
                    GroupDelayType::Long
                };
                (ty, if ty == GroupDelayType::Quad { 4 } else { 12 })
            }
            IntentCode::VQuad | IntentCode::VLong => {
                self.direction = compass();
                self.wire_direction = self
                    .direction
                    .map(TimingDirection::axis)
                    .filter(|a| *a == WireDirection::Vertical);
                let ty = if intent == IntentCode::VQuad {
                    GroupDelayType::Quad
                } else {
                    GroupDelayType::Long
                };
                (ty, if ty == GroupDelayType::Quad { 4 } else { 12 })
            }
            IntentCode::Local if self.has_global_wire => (GroupDelayType::Global, 0),
            IntentCode::PinFeed => (GroupDelayType::PinFeed, 0),
            _ => (GroupDelayType::Other, 0),
        };
        self.delay_type = Some(ty);
        self.dist = dist;

        if let Some(axis) = self.wire_direction {
            self.d = crossing_distance(node, axis, ty, distances);
        }
        Ok(())
    }

    /// Prices the group as `k0 + k1 * L + k2 * d` and stores it in `delay`.
    ///
    /// A pin bounce at the start of a route is free.
    pub fn price(&mut self, terms: &InterconnectTerms) -> f64 {
        let Some(ty) = self.delay_type else {
            self.delay = 0.0;
            return 0.0;
        };
        let h = (terms.k0_horizontal, terms.k1_horizontal);
        let v = (terms.k0_vertical, terms.k1_vertical);
        let by_axis = |hk2: f64, hl: f64, vk2: f64, vl: f64| match self.wire_direction {
            Some(WireDirection::Horizontal) => Some((h.0, h.1, hk2, hl)),
            Some(WireDirection::Vertical) => Some((v.0, v.1, vk2, vl)),
            None => None,
        };
        let coeffs = match ty {
            GroupDelayType::Single => by_axis(
                terms.k2_horizontal_single,
                terms.l_horizontal_single,
                terms.k2_vertical_single,
                terms.l_vertical_single,
            ),
            GroupDelayType::Double => by_axis(
                terms.k2_horizontal_double,
                terms.l_horizontal_double,
                terms.k2_vertical_double,
                terms.l_vertical_double,
            ),
            GroupDelayType::Quad => by_axis(
                terms.k2_horizontal_quad,
                terms.l_horizontal_quad,
                terms.k2_vertical_quad,
                terms.l_vertical_quad,
            ),
            GroupDelayType::Long => by_axis(
                terms.k2_horizontal_long,
                terms.l_horizontal_long,
                terms.k2_vertical_long,
                terms.l_vertical_long,
            ),
            GroupDelayType::Global => Some((
                h.0,
                h.1,
                terms.k2_horizontal_global,
                terms.l_horizontal_global,
            )),
            GroupDelayType::Internal => Some((h.0, h.1, 0.0, terms.l_horizontal_internal)),
            GroupDelayType::PinBounce if self.is_initial => None,
            GroupDelayType::PinBounce => Some((h.0, h.1, 0.0, terms.l_horizontal_bounce)),
            GroupDelayType::PinFeed | GroupDelayType::Other => None,
        };
        self.delay = coeffs.map_or(0.0, |(k0, k1, k2, l)| k0 + k1 * l + k2 * self.d);
        self.delay
    }
}

/// The `d` term: crossing penalties between the extreme BEG/END wires.
fn crossing_distance(
    node: &RouteNode,
    axis: WireDirection,
    ty: GroupDelayType,
    distances: &DistanceTables,
) -> f64 {
    let mut ends = node
        .wires
        .iter()
        .filter(|w| w.name.contains("BEG") || w.name.contains("END"))
        .peekable();
    if ends.peek().is_none() {
        return 0.0;
    }
    let (mut min_col, mut max_col, mut min_row, mut max_row) = (u32::MAX, 0, u32::MAX, 0);
    for w in ends {
        min_col = min_col.min(w.col);
        max_col = max_col.max(w.col);
        min_row = min_row.min(w.row);
        max_row = max_row.max(w.row);
    }
    match axis {
        WireDirection::Horizontal if min_col < max_col => {
            distances.horizontal_distance(min_col, max_col, ty)
        }
        WireDirection::Vertical if min_row < max_row => {
            distances.vertical_distance(min_row, max_row, ty)
        }
        _ => 0.0,
    }
}

fn lookup<'a>(fabric: &'a dyn RoutingFabric, id: NodeId) -> KairosResult<&'a RouteNode> {
    fabric
        .route_node(id)
        .ok_or_else(|| InternalError::new(format!("route references unknown node {id}")))
}

/// Coalesces a route into timing groups.
///
/// `nodes` runs from the sink end to the source end and `pips[i - 1]` joins
/// `nodes[i - 1]` and `nodes[i]`. The first group (one node) is marked
/// initial; the last group (last PIP plus last node) is marked final.
pub fn determine_groups(
    nodes: &[NodeId],
    pips: &[Pip],
    fabric: &dyn RoutingFabric,
) -> KairosResult<Vec<TimingGroup>> {
    let n = nodes.len();
    let mut groups = Vec::new();

    if n >= 2 && !pips.is_empty() {
        let mut initial = TimingGroup::new();
        initial.push_node(nodes[0], lookup(fabric, nodes[0])?);
        initial.is_initial = true;
        groups.push(initial);

        let mut i = 1;
        while i < n - 1 {
            let this = lookup(fabric, nodes[i])?;
            let next = lookup(fabric, nodes[i + 1])?;
            let n0 = this.intent;
            let n1 = next.intent;
            let quad_into_long = matches!(n0, IntentCode::HQuad | IntentCode::VQuad)
                && matches!(n1, IntentCode::HLong | IntentCode::VLong);

            let pip = pips.get(i - 1).copied().ok_or_else(|| {
                InternalError::new(format!("route has {n} nodes but {} PIPs", pips.len()))
            })?;
            let mut group = TimingGroup::new();
            group.push_pip(pip);
            group.push_node(nodes[i], this);

            if this.has_global_wire()
                || next.has_global_wire()
                || matches!(n0, IntentCode::PinFeed | IntentCode::HLong | IntentCode::VLong)
                || quad_into_long
                || i == n - 2
            {
                i += 1;
            } else {
                if let Some(&pip) = pips.get(i) {
                    group.push_pip(pip);
                }
                group.push_node(nodes[i + 1], next);
                i += 2;
            }
            groups.push(group);
        }
    }

    let mut last = TimingGroup::new();
    if let Some(&pip) = pips.last() {
        last.push_pip(pip);
    }
    if let Some(&id) = nodes.last() {
        last.push_node(id, lookup(fabric, id)?);
    }
    last.is_final = true;
    groups.push(last);

    if let Some(pos) = groups.iter().position(|g| g.nodes.is_empty()) {
        return Err(InternalError::new(format!(
            "timing group {pos} of {} has no nodes",
            groups.len()
        )));
    }
    Ok(groups)
}

/// Groups reachable from `from` in one step, classified and priced.
///
/// A logic-block output forms its own group. Global and long nodes form a
/// one-node group. Any other node is paired with each of its own downhill
/// nodes.
pub fn next_groups(
    from: NodeId,
    fabric: &dyn RoutingFabric,
    distances: &DistanceTables,
    terms: &InterconnectTerms,
) -> KairosResult<Vec<TimingGroup>> {
    let mut result = Vec::new();
    for &next_id in fabric.downhill(from) {
        let next = lookup(fabric, next_id)?;
        let pip = Pip::new(from, next_id);

        let mut candidates = Vec::new();
        if next.intent == IntentCode::CleOutput {
            let mut g = TimingGroup::new();
            g.push_node(next_id, next);
            candidates.push(g);
        } else if next.has_global_wire()
            || matches!(next.intent, IntentCode::HLong | IntentCode::VLong)
        {
            let mut g = TimingGroup::new();
            g.push_pip(pip);
            g.push_node(next_id, next);
            candidates.push(g);
        } else {
            for &after_id in fabric.downhill(next_id) {
                let after = lookup(fabric, after_id)?;
                let mut g = TimingGroup::new();
                g.push_pip(pip);
                g.push_node(next_id, next);
                g.push_pip(Pip::new(next_id, after_id));
                g.push_node(after_id, after);
                candidates.push(g);
            }
        }

        for mut g in candidates {
            g.classify(fabric, distances)?;
            g.price(terms);
            result.push(g);
        }
    }
    Ok(result)
}

/// Groups heading in `dir`, plus groups with no direction.
pub fn filter_by_direction(groups: &[TimingGroup], dir: TimingDirection) -> Vec<&TimingGroup> {
    groups
        .iter()
        .filter(|g| g.direction.is_none() || g.direction == Some(dir))
        .collect()
}

/// Groups of exactly `dist` tiles heading in `dir` or in no direction.
pub fn filter_by_dist(
    groups: &[TimingGroup],
    dist: u32,
    dir: TimingDirection,
) -> Vec<&TimingGroup> {
    groups
        .iter()
        .filter(|g| g.dist == dist && (g.direction.is_none() || g.direction == Some(dir)))
        .collect()
}

/// Groups within a reach class heading in `dir`.
///
/// `Same` lists zero-distance groups, non-PinFeed first. `Near` also
/// admits undirected one-tile groups.
pub fn filter_by_distance<'a>(
    groups: &'a [TimingGroup],
    class: GroupDistance,
    dir: TimingDirection,
    terms: &InterconnectTerms,
) -> Vec<&'a TimingGroup> {
    let heading = |g: &TimingGroup| g.direction == Some(dir);
    let in_range = |g: &TimingGroup, lo: u32, hi: u32| (lo..=hi).contains(&g.dist);
    match class {
        GroupDistance::Same => {
            let is_feed = |g: &TimingGroup| g.delay_type == Some(GroupDelayType::PinFeed);
            groups
                .iter()
                .filter(|g| g.dist == 0 && !is_feed(g))
                .chain(groups.iter().filter(|g| g.dist == 0 && is_feed(g)))
                .collect()
        }
        GroupDistance::Near => groups
            .iter()
            .filter(|g| {
                let near = in_range(g, terms.near_min, terms.near_max) && heading(g);
                let vertical = matches!(
                    g.direction,
                    Some(TimingDirection::North | TimingDirection::South)
                );
                near || (!vertical && g.dist == 1 && g.direction.is_none())
            })
            .collect(),
        GroupDistance::Mid => groups
            .iter()
            .filter(|g| heading(g) && (in_range(g, terms.mid_min, terms.mid_max) || g.dist == 2))
            .collect(),
        GroupDistance::Far => groups
            .iter()
            .filter(|g| heading(g) && in_range(g, terms.far_min, terms.far_max))
            .collect(),
    }
}
