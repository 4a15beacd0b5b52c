//! Placed cells, routed nets, and the design container.

use crate::ids::{CellId, NetId, NodeId};
use crate::node::{Pip, RouteNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Flip-flop primitive types recognised as sequential elements.
pub const FLIP_FLOP_TYPES: [&str; 4] = ["FDSE", "FDPE", "FDRE", "FDCE"];

/// What drives the `I5` input of a fractured `LUT6_2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum I5Tie {
    /// Driven by a real signal.
    #[default]
    Signal,
    /// Tied to constant 0.
    Const0,
    /// Tied to constant 1.
    Const1,
}

impl I5Tie {
    /// `true` for either constant.
    pub fn is_const(self) -> bool {
        !matches!(self, I5Tie::Signal)
    }
}

/// A placed leaf cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// Hierarchical instance name, e.g. `"u_core/add0"`.
    pub name: String,
    /// Primitive type, e.g. `"LUT6"`, `"CARRY8"`, `"FDRE"`.
    pub cell_type: String,
    /// Type of the macro this cell was expanded from, e.g. `"LUT6_2"`.
    #[serde(default)]
    pub parent_type: Option<String>,
    /// BEL the cell is placed on, e.g. `"A6LUT"`.
    #[serde(default)]
    pub bel: Option<String>,
    /// Site instance name.
    #[serde(default)]
    pub site: Option<String>,
    /// Site type, e.g. `"SLICEL"`.
    #[serde(default)]
    pub site_type: Option<String>,
    /// Logical pin name to physical BEL pin name.
    #[serde(default)]
    pub pin_map: BTreeMap<String, String>,
    /// Logical input pins, in port order.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Logical output pins, in port order.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// LUT INIT. For a half of a `LUT6_2` this is the parent's 64-bit
    /// value; for a standalone `LUTk` it is the cell's own, read from the
    /// low `2^k` bits.
    #[serde(default)]
    pub lut_init: Option<u64>,
    /// Tie-off of the parent `LUT6_2`'s `I5` input.
    #[serde(default)]
    pub i5_tie: I5Tie,
}

impl Cell {
    /// Creates an unplaced cell with no pins.
    pub fn new(name: impl Into<String>, cell_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell_type: cell_type.into(),
            parent_type: None,
            bel: None,
            site: None,
            site_type: None,
            pin_map: BTreeMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            lut_init: None,
            i5_tie: I5Tie::Signal,
        }
    }

    /// Places the cell on `bel` within `site` of type `site_type`.
    pub fn placed(
        mut self,
        site: impl Into<String>,
        site_type: impl Into<String>,
        bel: impl Into<String>,
    ) -> Self {
        self.site = Some(site.into());
        self.site_type = Some(site_type.into());
        self.bel = Some(bel.into());
        self
    }

    /// Adds a logical input pin mapped to a physical pin.
    pub fn with_input(mut self, logical: impl Into<String>, physical: impl Into<String>) -> Self {
        let logical = logical.into();
        self.pin_map.insert(logical.clone(), physical.into());
        self.inputs.push(logical);
        self
    }

    /// Adds a logical input pin with no physical mapping.
    pub fn with_unmapped_input(mut self, logical: impl Into<String>) -> Self {
        self.inputs.push(logical.into());
        self
    }

    /// Adds a logical output pin mapped to a physical pin.
    pub fn with_output(mut self, logical: impl Into<String>, physical: impl Into<String>) -> Self {
        let logical = logical.into();
        self.pin_map.insert(logical.clone(), physical.into());
        self.outputs.push(logical);
        self
    }

    /// The physical pin for a logical pin, if mapped.
    pub fn physical_pin(&self, logical: &str) -> Option<&str> {
        self.pin_map.get(logical).map(String::as_str)
    }

    /// `true` for FDSE/FDPE/FDRE/FDCE.
    pub fn is_flip_flop(&self) -> bool {
        FLIP_FLOP_TYPES.contains(&self.cell_type.as_str())
    }

    /// `true` if this cell is one half of a fractured `LUT6_2`.
    pub fn in_lut6_2(&self) -> bool {
        self.parent_type
            .as_deref()
            .is_some_and(|p| p.starts_with("LUT6_2"))
    }
}

/// One end of a net: a cell pin plus its physical attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminal {
    /// The owning cell.
    pub cell: CellId,
    /// Logical port name on the cell.
    pub port: String,
    /// Physical BEL pin, e.g. `"A6"` or `"O6"`.
    #[serde(default)]
    pub bel_pin: Option<String>,
    /// Site pin the signal leaves or enters the site through, if any.
    #[serde(default)]
    pub site_pin: Option<String>,
    /// Routing node attached at the site pin.
    #[serde(default)]
    pub node: Option<NodeId>,
}

impl Terminal {
    /// A terminal with no physical attachment.
    pub fn new(cell: CellId, port: impl Into<String>) -> Self {
        Self {
            cell,
            port: port.into(),
            bel_pin: None,
            site_pin: None,
            node: None,
        }
    }

    /// Sets the BEL pin.
    pub fn at_bel_pin(mut self, pin: impl Into<String>) -> Self {
        self.bel_pin = Some(pin.into());
        self
    }

    /// Sets the site pin and its routing node.
    pub fn at_site_pin(mut self, pin: impl Into<String>, node: NodeId) -> Self {
        self.site_pin = Some(pin.into());
        self.node = Some(node);
        self
    }
}

/// Electrical kind of a net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NetKind {
    /// Ordinary data or control signal.
    #[default]
    Signal,
    /// Clock distribution.
    Clock,
    /// Static power.
    Vcc,
    /// Static ground.
    Gnd,
}

/// A net with its driver, sinks, and routed PIPs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    /// Net name.
    pub name: String,
    /// Electrical kind.
    #[serde(default)]
    pub kind: NetKind,
    /// The driving terminal.
    #[serde(default)]
    pub source: Option<Terminal>,
    /// Driven terminals.
    #[serde(default)]
    pub sinks: Vec<Terminal>,
    /// Routed PIPs, in any order.
    #[serde(default)]
    pub pips: Vec<Pip>,
}

impl Net {
    /// Creates a signal net with no terminals.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NetKind::Signal,
            source: None,
            sinks: Vec::new(),
            pips: Vec::new(),
        }
    }
}

/// A placed and routed design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysDesign {
    /// Top-level design name.
    #[serde(default)]
    pub name: String,
    /// All cells.
    pub cells: Vec<Cell>,
    /// All nets.
    pub nets: Vec<Net>,
    /// All routing nodes referenced by nets.
    #[serde(default)]
    pub nodes: Vec<RouteNode>,
    /// Pins (`"cell/port"`) that drive design-level output ports.
    #[serde(default)]
    pub output_ports: Vec<String>,
    #[serde(skip)]
    cell_by_name: HashMap<String, CellId>,
    #[serde(skip)]
    net_by_name: HashMap<String, NetId>,
}

impl PhysDesign {
    /// Creates an empty design.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a cell and returns its ID.
    pub fn add_cell(&mut self, cell: Cell) -> CellId {
        let id = CellId::from_raw(self.cells.len() as u32);
        self.cell_by_name.insert(cell.name.clone(), id);
        self.cells.push(cell);
        id
    }

    /// Adds a net and returns its ID.
    pub fn add_net(&mut self, net: Net) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        self.net_by_name.insert(net.name.clone(), id);
        self.nets.push(net);
        id
    }

    /// Adds a routing node and returns its ID.
    pub fn add_node(&mut self, node: RouteNode) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Returns the cell with the given ID.
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.as_raw() as usize)
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> Option<&Net> {
        self.nets.get(id.as_raw() as usize)
    }

    /// Returns a mutable reference to the net with the given ID.
    pub fn net_mut(&mut self, id: NetId) -> Option<&mut Net> {
        self.nets.get_mut(id.as_raw() as usize)
    }

    /// Returns the routing node with the given ID.
    pub fn node(&self, id: NodeId) -> Option<&RouteNode> {
        self.nodes.get(id.as_raw() as usize)
    }

    /// Looks up a cell by name.
    pub fn cell_by_name(&self, name: &str) -> Option<CellId> {
        self.cell_by_name.get(name).copied()
    }

    /// Looks up a net by name.
    pub fn net_by_name(&self, name: &str) -> Option<NetId> {
        self.net_by_name.get(name).copied()
    }

    /// All net IDs in index order.
    pub fn net_ids(&self) -> impl Iterator<Item = NetId> + '_ {
        (0..self.nets.len() as u32).map(NetId::from_raw)
    }

    /// The `"cell/port"` name of a terminal.
    pub fn pin_name(&self, terminal: &Terminal) -> Option<String> {
        self.cell(terminal.cell)
            .map(|c| format!("{}/{}", c.name, terminal.port))
    }

    /// Rebuilds name indices after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.cell_by_name = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), CellId::from_raw(i as u32)))
            .collect();
        self.net_by_name = self
            .nets
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name.clone(), NetId::from_raw(i as u32)))
            .collect();
    }
}
