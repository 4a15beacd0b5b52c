//! Interconnect delay estimation for one source-to-sink connection.
//!
//! [`trace_route`] recovers the node chain of a connection from a net's
//! PIPs. [`NetDelayEstimator`] coalesces that chain into timing groups,
//! prices them, and adds site-pin and intra-site surcharges.

use crate::delay_table::DelayTables;
use crate::error::RouteError;
use crate::geometry::DistanceTables;
use crate::group::{determine_groups, GroupDelayType, RoutingFabric, TimingGroup};
use crate::terms::InterconnectTerms;
use kairos_common::KairosResult;
use kairos_config::EstimatorConfig;
use kairos_design::{IntentCode, Net, NodeId, Pip};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const DOUBLE_TO_DOUBLE_ADJUST: f64 = -6.0;
const QUAD_TO_QUAD_ADJUST: f64 = 9.0;

const SLICE_SITE: &str = "SLICEL";
const FF_EXCLUDED_PINS: [&str; 4] = ["CKEN", "CLK1", "CLK2", "SRST"];

/// The nodes and PIPs of one routed connection, source first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePath {
    /// Nodes from the source pin to the sink pin.
    pub nodes: Vec<NodeId>,
    /// `pips[i]` joins `nodes[i]` to `nodes[i + 1]`.
    pub pips: Vec<Pip>,
}

/// Walks a net's PIPs back from `sink` to `source`.
///
/// With no source node the start of the net's first PIP is used.
pub fn trace_route(
    net: &Net,
    source: Option<NodeId>,
    sink: NodeId,
) -> Result<RoutePath, RouteError> {
    let source = source
        .or_else(|| net.pips.first().map(|p| p.start))
        .unwrap_or(sink);
    let by_end: HashMap<NodeId, Pip> = net.pips.iter().map(|p| (p.end, *p)).collect();

    let mut nodes = vec![sink];
    let mut pips = Vec::new();
    let mut seen = HashSet::from([sink]);
    let mut current = sink;
    while current != source {
        let pip = by_end
            .get(&current)
            .copied()
            .ok_or_else(|| RouteError::Unreachable {
                net: net.name.clone(),
                node: current,
            })?;
        current = pip.start;
        if !seen.insert(current) {
            return Err(RouteError::Loop {
                net: net.name.clone(),
                node: current,
            });
        }
        pips.push(pip);
        nodes.push(current);
    }
    nodes.reverse();
    pips.reverse();
    Ok(RoutePath { nodes, pips })
}

/// Estimated delay of one connection, in picoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NetDelay {
    /// Interconnect delay including site-pin surcharges.
    pub net: f64,
    /// Delay spent inside the source and sink sites.
    pub intra_site: f64,
}

impl NetDelay {
    /// `net + intra_site`.
    pub fn total(&self) -> f64 {
        self.net + self.intra_site
    }
}

/// Optional corrections applied on top of group pricing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EstimatorOptions {
    /// Apply −6 ps for each double followed by a double.
    pub adjust_double_to_double: bool,
    /// Apply +9 ps for each quad followed by a quad.
    pub adjust_quad_to_quad: bool,
}

impl From<&EstimatorConfig> for EstimatorOptions {
    fn from(config: &EstimatorConfig) -> Self {
        Self {
            adjust_double_to_double: config.adjust_double_to_double,
            adjust_quad_to_quad: config.adjust_quad_to_quad,
        }
    }
}

/// Cell-side context of a connection, used for intra-site surcharges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Endpoints<'a> {
    /// BEL of the driving cell.
    pub source_bel: Option<&'a str>,
    /// Physical output pin on that BEL.
    pub source_bel_pin: Option<&'a str>,
    /// Site pin the route leaves from.
    pub source_site_pin: Option<&'a str>,
    /// BEL of the sink cell.
    pub sink_bel: Option<&'a str>,
    /// Site pin the route arrives at.
    pub sink_site_pin: Option<&'a str>,
}

/// Prices routed connections with the `k0 + k1 * L + k2 * d` model.
#[derive(Debug, Clone, Copy)]
pub struct NetDelayEstimator<'a> {
    tables: &'a DelayTables,
    terms: &'a InterconnectTerms,
    distances: &'a DistanceTables,
    options: EstimatorOptions,
}

impl<'a> NetDelayEstimator<'a> {
    /// Creates an estimator over shared model data.
    pub fn new(
        tables: &'a DelayTables,
        terms: &'a InterconnectTerms,
        distances: &'a DistanceTables,
        options: EstimatorOptions,
    ) -> Self {
        Self {
            tables,
            terms,
            distances,
            options,
        }
    }

    /// Groups, classifies, and prices a route.
    ///
    /// Returned groups run from the sink end to the source end, with
    /// site-pin surcharges folded into each group's `delay`.
    pub fn groups(
        &self,
        path: &RoutePath,
        fabric: &dyn RoutingFabric,
    ) -> KairosResult<Vec<TimingGroup>> {
        let nodes: Vec<NodeId> = path.nodes.iter().rev().copied().collect();
        let pips: Vec<Pip> = path.pips.iter().rev().copied().collect();
        let mut groups = determine_groups(&nodes, &pips, fabric)?;
        for g in &mut groups {
            g.classify(fabric, self.distances)?;
            g.price(self.terms);
        }
        Ok(groups)
    }

    /// Estimates the delay of one connection.
    pub fn estimate(
        &self,
        path: &RoutePath,
        ends: &Endpoints<'_>,
        fabric: &dyn RoutingFabric,
    ) -> KairosResult<NetDelay> {
        if path.nodes.is_empty() {
            return Ok(NetDelay::default());
        }
        let mut groups = self.groups(path, fabric)?;

        let mut net: f64 = groups
            .iter()
            .filter(|g| !g.is_final)
            .map(|g| g.delay)
            .sum();
        net += self.site_pin_surcharge(&mut groups, fabric);
        net += self.adjustments(&groups);
        let intra_site = self.intra_site_surcharge(&groups, ends, fabric);

        log::trace!(
            "route of {} nodes: {} groups, net {net:.1} ps, intra-site {intra_site:.1} ps",
            path.nodes.len(),
            groups.len()
        );
        Ok(NetDelay { net, intra_site })
    }

    fn site_pin_surcharge(&self, groups: &mut [TimingGroup], fabric: &dyn RoutingFabric) -> f64 {
        let mut total = 0.0;
        for g in groups.iter_mut() {
            let mut charge = 0.0;
            if g.has_pin_feed {
                let pin = g
                    .last_node()
                    .and_then(|id| fabric.route_node(id))
                    .and_then(|n| n.site_pin.as_ref())
                    .filter(|p| p.is_input);
                if let Some(pin) = pin {
                    charge += self.input_pin_charge(&pin.name);
                }
            }
            if g.intents.first() == Some(&IntentCode::PinBounce) {
                let pin = g
                    .nodes
                    .first()
                    .and_then(|&id| fabric.route_node(id))
                    .and_then(|n| n.site_pin.as_ref());
                if let Some(pin) = pin {
                    charge += self.bounce_pin_charge(&pin.name);
                }
            }
            g.delay += charge;
            total += charge;
        }
        total
    }

    fn input_pin_charge(&self, pin: &str) -> f64 {
        let t = self.terms;
        match pin.as_bytes().last().copied() {
            Some(d @ b'1'..=b'6') => t.sitepin_delay[usize::from(d - b'1')],
            Some(b'I') => t.sitepin_a_i_delay,
            Some(b'X') => t.sitepin_ax_delay,
            _ if pin.ends_with("WCKEN") => t.sitepin_ax_delay,
            _ => 0.0,
        }
    }

    fn bounce_pin_charge(&self, pin: &str) -> f64 {
        let b = pin.as_bytes();
        let lettered = matches!(b.first(), Some(b'A'..=b'H'));
        match (lettered, &b[b.len().min(1)..]) {
            (true, b"X") => self.terms.sitepin_ax_delay,
            (true, b"_I") => self.terms.sitepin_a_i_delay,
            _ => 0.0,
        }
    }

    fn adjustments(&self, groups: &[TimingGroup]) -> f64 {
        groups
            .windows(2)
            .map(|pair| match (pair[0].delay_type, pair[1].delay_type) {
                (Some(GroupDelayType::Double), Some(GroupDelayType::Double))
                    if self.options.adjust_double_to_double =>
                {
                    DOUBLE_TO_DOUBLE_ADJUST
                }
                (Some(GroupDelayType::Quad), Some(GroupDelayType::Quad))
                    if self.options.adjust_quad_to_quad =>
                {
                    QUAD_TO_QUAD_ADJUST
                }
                _ => 0.0,
            })
            .sum()
    }

    fn slice_delay(&self, from: &str, to: &str) -> f64 {
        match self.tables.intra_site_delay(SLICE_SITE, from, to) {
            Ok(d) => d.filter(|&d| d >= 0).map_or(0.0, f64::from),
            Err(e) => {
                log::trace!("intra-site lookup {from} -> {to}: {e}");
                0.0
            }
        }
    }

    fn intra_site_surcharge(
        &self,
        groups: &[TimingGroup],
        ends: &Endpoints<'_>,
        fabric: &dyn RoutingFabric,
    ) -> f64 {
        let mut total = 0.0;

        if let (Some(bel), Some(pin)) = (ends.sink_bel, ends.sink_site_pin) {
            if is_flip_flop_bel(bel) {
                if !FF_EXCLUDED_PINS.iter().any(|p| pin.starts_with(p)) {
                    total += self.slice_delay(pin, &format!("{bel}/D"));
                } else if pin.starts_with("CKEN") {
                    total += self.terms.sitepin_to_ff_input;
                }
            }
        }

        let source_is_f8mux = ends.source_bel.is_some_and(|b| b.starts_with("F8MUX"));
        let mux_from = match (ends.source_bel, ends.source_bel_pin, ends.source_site_pin) {
            (Some(bel), Some(pin), Some(site_pin)) => Some((format!("{bel}/{pin}"), site_pin)),
            _ => None,
        };
        for g in groups {
            if !matches!(
                g.delay_type,
                Some(GroupDelayType::Other | GroupDelayType::PinFeed | GroupDelayType::PinBounce)
            ) {
                continue;
            }
            for node in g.nodes.iter().filter_map(|&id| fabric.route_node(id)) {
                for wire in &node.wires {
                    if wire.name.ends_with("MUX") && !source_is_f8mux {
                        if let Some((from, to)) = &mux_from {
                            total += self.slice_delay(from, to);
                        }
                    } else if wire.name.ends_with("_O") {
                        total += self.terms.lut_output_to_o_sitepin;
                    }
                }
            }
        }
        total
    }
}

/// `AFF`, `AFF2`, ... `HFF`, `HFF2`.
fn is_flip_flop_bel(bel: &str) -> bool {
    let b = bel.as_bytes();
    matches!(b.first(), Some(b'A'..=b'H')) && (&b[1..] == b"FF" || &b[1..] == b"FF2")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kairos_design::{PhysDesign, RouteNode, Wire};
    use kairos_device::{Tile, TileGrid};

    struct Fixture {
        tables: DelayTables,
        terms: InterconnectTerms,
        distances: DistanceTables,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_tables("site SLICEL\nAQ AFF/D 20\nAFF/Q AQ 7\nA6LUT/O6 AMUX 33\n")
        }

        fn with_tables(text: &str) -> Self {
            let tables = DelayTables::from_text(text, "fixture.txt").unwrap();
            let terms = InterconnectTerms::default();
            let tiles = (0..8).map(|c| Tile::new(1, c, "CLEL_R")).collect();
            let distances = DistanceTables::build(&TileGrid::from_tiles("t", 4, 8, tiles), &terms);
            Self {
                tables,
                terms,
                distances,
            }
        }

        fn estimator(&self, options: EstimatorOptions) -> NetDelayEstimator<'_> {
            NetDelayEstimator::new(&self.tables, &self.terms, &self.distances, options)
        }
    }

    fn wire(name: &str, col: u32) -> Wire {
        Wire::new(name, format!("INT_X{col}Y0"), 0, col)
    }

    fn net_with(pips: Vec<Pip>) -> Net {
        let mut net = Net::new("n");
        net.pips = pips;
        net
    }

    /// Output pin, east double, input pin feed with site pin `A3`.
    fn east_double_route(d: &mut PhysDesign) -> RoutePath {
        let out = d.add_node(
            RouteNode::new("CLE_O", IntentCode::CleOutput, vec![wire("AQ", 0)])
                .with_site_pin("AQ", false),
        );
        let local = d.add_node(RouteNode::new("INODE", IntentCode::Local, vec![wire("INODE_0", 0)]));
        let dbl = d.add_node(RouteNode::new(
            "EE2",
            IntentCode::Double,
            vec![wire("EE2_E_BEG0", 0), wire("EE2_E_END0", 2)],
        ));
        let feed = d.add_node(
            RouteNode::new("IMUX", IntentCode::PinFeed, vec![wire("IMUX_E3", 2)])
                .with_site_pin("A3", true),
        );
        RoutePath {
            nodes: vec![out, local, dbl, feed],
            pips: vec![Pip::new(out, local), Pip::new(local, dbl), Pip::new(dbl, feed)],
        }
    }

    #[test]
    fn trace_walks_back_to_source() {
        let (a, b, c) = (NodeId::from_raw(0), NodeId::from_raw(1), NodeId::from_raw(2));
        let net = net_with(vec![Pip::new(b, c), Pip::new(a, b)]);
        let path = trace_route(&net, Some(a), c).unwrap();
        assert_eq!(path.nodes, vec![a, b, c]);
        assert_eq!(path.pips, vec![Pip::new(a, b), Pip::new(b, c)]);
    }

    #[test]
    fn trace_without_source_node_uses_first_pip() {
        let (a, b) = (NodeId::from_raw(0), NodeId::from_raw(1));
        let net = net_with(vec![Pip::new(a, b)]);
        assert_eq!(trace_route(&net, None, b).unwrap().nodes, vec![a, b]);
    }

    #[test]
    fn trace_source_equals_sink() {
        let a = NodeId::from_raw(4);
        let path = trace_route(&net_with(Vec::new()), Some(a), a).unwrap();
        assert_eq!(path.nodes, vec![a]);
        assert!(path.pips.is_empty());
    }

    #[test]
    fn trace_broken_chain_names_node() {
        let (a, b, c) = (NodeId::from_raw(0), NodeId::from_raw(1), NodeId::from_raw(2));
        let net = net_with(vec![Pip::new(b, c)]);
        let err = trace_route(&net, Some(a), c).unwrap_err();
        assert_eq!(
            err,
            RouteError::Unreachable {
                net: "n".into(),
                node: b
            }
        );
    }

    #[test]
    fn trace_detects_loop() {
        let (a, b, c) = (NodeId::from_raw(0), NodeId::from_raw(1), NodeId::from_raw(2));
        let net = net_with(vec![Pip::new(c, b), Pip::new(b, c)]);
        let err = trace_route(&net, Some(a), c).unwrap_err();
        assert!(matches!(err, RouteError::Loop { .. }));
    }

    #[test]
    fn empty_path_is_zero() {
        let f = Fixture::new();
        let d = PhysDesign::new("t");
        let delay = f
            .estimator(EstimatorOptions::default())
            .estimate(&RoutePath::default(), &Endpoints::default(), &d)
            .unwrap();
        assert_eq!(delay, NetDelay::default());
    }

    #[test]
    fn prices_double_and_pin_feed() {
        let f = Fixture::new();
        let mut d = PhysDesign::new("t");
        let path = east_double_route(&mut d);
        let est = f.estimator(EstimatorOptions::default());

        let groups = est.groups(&path, &d).unwrap();
        // feed, then double paired with the local node upstream, then the output
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].delay_type, Some(GroupDelayType::PinFeed));
        assert_eq!(groups[1].delay_type, Some(GroupDelayType::Double));
        assert_eq!(groups[1].nodes, vec![path.nodes[2], path.nodes[1]]);
        assert!(groups[2].is_final);

        let delay = est.estimate(&path, &Endpoints::default(), &d).unwrap();
        let t = &f.terms;
        let expected = t.k0_horizontal + t.k1_horizontal * t.l_horizontal_double + t.sitepin_delay[2];
        assert!((delay.net - expected).abs() < 1e-9, "{}", delay.net);
        assert_eq!(delay.intra_site, 0.0);
    }

    #[test]
    fn sink_flip_flop_adds_intra_site() {
        let f = Fixture::new();
        let mut d = PhysDesign::new("t");
        let path = east_double_route(&mut d);
        let est = f.estimator(EstimatorOptions::default());

        let ends = Endpoints {
            sink_bel: Some("AFF"),
            sink_site_pin: Some("AQ"),
            ..Endpoints::default()
        };
        assert_eq!(est.estimate(&path, &ends, &d).unwrap().intra_site, 20.0);

        let cken = Endpoints {
            sink_bel: Some("BFF2"),
            sink_site_pin: Some("CKEN1"),
            ..Endpoints::default()
        };
        assert_eq!(est.estimate(&path, &cken, &d).unwrap().intra_site, 100.0);

        let lut = Endpoints {
            sink_bel: Some("A6LUT"),
            sink_site_pin: Some("AQ"),
            ..Endpoints::default()
        };
        assert_eq!(est.estimate(&path, &lut, &d).unwrap().intra_site, 0.0);
    }

    #[test]
    fn negative_surcharge_entry_is_ignored() {
        let f = Fixture::with_tables("site SLICEL\nAQ AFF/D -5\n");
        let mut d = PhysDesign::new("t");
        let path = east_double_route(&mut d);
        let ends = Endpoints {
            sink_bel: Some("AFF"),
            sink_site_pin: Some("AQ"),
            ..Endpoints::default()
        };
        let delay = f
            .estimator(EstimatorOptions::default())
            .estimate(&path, &ends, &d)
            .unwrap();
        assert_eq!(delay.intra_site, 0.0);
    }

    #[test]
    fn mux_wire_adds_source_intra_site() {
        let f = Fixture::new();
        let mut d = PhysDesign::new("t");
        let out = d.add_node(RouteNode::new(
            "CLE_MUX",
            IntentCode::CleOutput,
            vec![wire("CLE_CLE_L_SITE_0_AMUX", 0)],
        ));
        let feed = d.add_node(
            RouteNode::new("IMUX", IntentCode::PinFeed, vec![wire("IMUX_E3", 0)])
                .with_site_pin("B2", true),
        );
        let path = RoutePath {
            nodes: vec![out, feed],
            pips: vec![Pip::new(out, feed)],
        };
        let ends = Endpoints {
            source_bel: Some("A6LUT"),
            source_bel_pin: Some("O6"),
            source_site_pin: Some("AMUX"),
            ..Endpoints::default()
        };
        let est = f.estimator(EstimatorOptions::default());
        let delay = est.estimate(&path, &ends, &d).unwrap();
        assert_eq!(delay.intra_site, 33.0);
        assert_eq!(delay.net, f.terms.sitepin_delay[1]);

        let f8 = Endpoints {
            source_bel: Some("F8MUX_BOT"),
            ..ends
        };
        assert_eq!(est.estimate(&path, &f8, &d).unwrap().intra_site, 0.0);
    }

    #[test]
    fn pin_charges() {
        let f = Fixture::new();
        let est = f.estimator(EstimatorOptions::default());
        let t = &f.terms;
        assert_eq!(est.input_pin_charge("A6"), t.sitepin_delay[5]);
        assert_eq!(est.input_pin_charge("H1"), t.sitepin_delay[0]);
        assert_eq!(est.input_pin_charge("C_I"), t.sitepin_a_i_delay);
        assert_eq!(est.input_pin_charge("DX"), t.sitepin_ax_delay);
        assert_eq!(est.input_pin_charge("WCKEN"), t.sitepin_ax_delay);
        assert_eq!(est.input_pin_charge("SRST1"), t.sitepin_delay[0]);
        assert_eq!(est.input_pin_charge("CLK"), 0.0);
        assert_eq!(est.bounce_pin_charge("HX"), t.sitepin_ax_delay);
        assert_eq!(est.bounce_pin_charge("B_I"), t.sitepin_a_i_delay);
        assert_eq!(est.bounce_pin_charge("JX"), 0.0);
        assert_eq!(est.bounce_pin_charge("AQ"), 0.0);
    }

    #[test]
    fn double_adjustment_applies_when_enabled() {
        let f = Fixture::new();
        let mut d = PhysDesign::new("t");
        let mut ids = vec![d.add_node(RouteNode::new("o", IntentCode::CleOutput, vec![wire("AQ", 0)]))];
        for i in 0..2 {
            ids.push(d.add_node(RouteNode::new("l", IntentCode::Local, vec![wire("INODE", i)])));
            ids.push(d.add_node(RouteNode::new(
                "e",
                IntentCode::Double,
                vec![wire("EE2_BEG0", i), wire("EE2_END0", i + 2)],
            )));
        }
        ids.push(d.add_node(RouteNode::new("f", IntentCode::PinFeed, vec![wire("IMUX", 4)])));
        let path = RoutePath {
            pips: ids.windows(2).map(|w| Pip::new(w[0], w[1])).collect(),
            nodes: ids,
        };
        let plain = f.estimator(EstimatorOptions::default());
        let adjusted = f.estimator(EstimatorOptions {
            adjust_double_to_double: true,
            adjust_quad_to_quad: false,
        });
        let a = plain.estimate(&path, &Endpoints::default(), &d).unwrap();
        let b = adjusted.estimate(&path, &Endpoints::default(), &d).unwrap();
        assert!((a.net - b.net - 6.0).abs() < 1e-9);
    }

    #[test]
    fn flip_flop_bel_names() {
        assert!(is_flip_flop_bel("AFF"));
        assert!(is_flip_flop_bel("HFF2"));
        assert!(!is_flip_flop_bel("IFF"));
        assert!(!is_flip_flop_bel("AFF3"));
        assert!(!is_flip_flop_bel("A6LUT"));
    }

    #[test]
    fn options_from_config() {
        let config = EstimatorConfig {
            adjust_double_to_double: true,
            adjust_quad_to_quad: false,
        };
        let opts = EstimatorOptions::from(&config);
        assert!(opts.adjust_double_to_double);
        assert!(!opts.adjust_quad_to_quad);
    }
}
