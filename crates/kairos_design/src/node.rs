//! Routing nodes, their wires, and the PIPs joining them.

use crate::ids::NodeId;
use serde::{Deserialize, Serialize};

/// Routing-node class assigned by the device database.
///
/// The interconnect estimator groups and prices nodes by this code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentCode {
    /// A bounce node that re-enters the interconnect from a site input.
    PinBounce,
    /// A wire spanning one tile.
    Single,
    /// A wire spanning two tiles.
    Double,
    /// A horizontal quad wire.
    HQuad,
    /// A vertical quad wire.
    VQuad,
    /// A horizontal long wire.
    HLong,
    /// A vertical long wire.
    VLong,
    /// A local node inside an interconnect tile.
    Local,
    /// A node feeding a site input pin.
    PinFeed,
    /// A logic-block output node.
    CleOutput,
    /// Any other intent.
    Other,
}

/// One wire segment of a routing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    /// Wire name within its tile, e.g. `"EE2_E_BEG3"`.
    pub name: String,
    /// Name of the tile the wire lives in.
    pub tile: String,
    /// Tile row.
    pub row: u32,
    /// Tile column.
    pub col: u32,
}

impl Wire {
    /// Creates a wire record.
    pub fn new(name: impl Into<String>, tile: impl Into<String>, row: u32, col: u32) -> Self {
        Self {
            name: name.into(),
            tile: tile.into(),
            row,
            col,
        }
    }
}

/// The site pin a routing node attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePinRef {
    /// Site pin name, e.g. `"A3"` or `"AX"`.
    pub name: String,
    /// `true` for a site input.
    pub is_input: bool,
}

/// A routing node: electrically one conductor made of one or more wires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteNode {
    /// Node name, unique in the device.
    pub name: String,
    /// Device-assigned class.
    pub intent: IntentCode,
    /// The node's wires, base wire first.
    pub wires: Vec<Wire>,
    /// Site pin attached to this node, if any.
    #[serde(default)]
    pub site_pin: Option<SitePinRef>,
    /// Nodes reachable through one PIP, for routing-fabric exploration.
    #[serde(default)]
    pub downhill: Vec<NodeId>,
}

impl RouteNode {
    /// Creates a node with no site pin and no downhill list.
    pub fn new(name: impl Into<String>, intent: IntentCode, wires: Vec<Wire>) -> Self {
        Self {
            name: name.into(),
            intent,
            wires,
            site_pin: None,
            downhill: Vec::new(),
        }
    }

    /// Attaches a site pin.
    pub fn with_site_pin(mut self, name: impl Into<String>, is_input: bool) -> Self {
        self.site_pin = Some(SitePinRef {
            name: name.into(),
            is_input,
        });
        self
    }

    /// `true` if any wire belongs to the global clock/control network.
    pub fn has_global_wire(&self) -> bool {
        self.wires.iter().any(|w| w.name.contains("_GLOBAL"))
    }

    /// The base wire.
    pub fn first_wire(&self) -> Option<&Wire> {
        self.wires.first()
    }

    /// The last wire.
    pub fn last_wire(&self) -> Option<&Wire> {
        self.wires.last()
    }
}

/// A programmable interconnect point joining two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pip {
    /// Upstream node.
    pub start: NodeId,
    /// Downstream node.
    pub end: NodeId,
}

impl Pip {
    /// Creates a PIP.
    pub fn new(start: NodeId, end: NodeId) -> Self {
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_wire_detection() {
        let local = RouteNode::new(
            "INT_X1Y1/INODE_E_1",
            IntentCode::Local,
            vec![Wire::new("INODE_E_1_FT1", "INT_X1Y1", 1, 1)],
        );
        assert!(!local.has_global_wire());
        let global = RouteNode::new(
            "INT_X1Y1/GCLK",
            IntentCode::Local,
            vec![
                Wire::new("CLK_LEAF", "INT_X1Y1", 1, 1),
                Wire::new("GCLK_B_0_GLOBAL", "INT_X1Y1", 1, 1),
            ],
        );
        assert!(global.has_global_wire());
    }

    #[test]
    fn first_and_last_wire() {
        let node = RouteNode::new(
            "n",
            IntentCode::Double,
            vec![
                Wire::new("EE2_E_BEG0", "INT_X1Y1", 1, 1),
                Wire::new("EE2_E_END0", "INT_X2Y1", 1, 2),
            ],
        );
        assert_eq!(node.first_wire().unwrap().tile, "INT_X1Y1");
        assert_eq!(node.last_wire().unwrap().col, 2);
        assert!(RouteNode::new("empty", IntentCode::Other, vec![])
            .first_wire()
            .is_none());
    }

    #[test]
    fn site_pin_builder() {
        let node = RouteNode::new("n", IntentCode::PinFeed, vec![]).with_site_pin("A3", true);
        let pin = node.site_pin.unwrap();
        assert_eq!(pin.name, "A3");
        assert!(pin.is_input);
    }

    #[test]
    fn intent_code_json_names() {
        let json = serde_json::to_string(&IntentCode::PinFeed).unwrap();
        assert_eq!(json, "\"PinFeed\"");
        let back: IntentCode = serde_json::from_str("\"VLong\"").unwrap();
        assert_eq!(back, IntentCode::VLong);
    }
}
