//! Read-only physical design snapshot consumed by timing analysis.
//!
//! A [`PhysDesign`] holds placed cells, routed nets, and the routing nodes
//! those nets use. It is a plain data model: loading one from a vendor
//! checkpoint is the caller's business, and the timing crate only ever
//! reads it.
//!
//! - [`ids`]: `u32` index newtypes for cells, nets, and routing nodes
//! - [`design`]: cells, nets, terminals, and the [`PhysDesign`] container
//! - [`node`]: routing nodes, wires, intent codes, and PIPs

#![warn(missing_docs)]

pub mod design;
pub mod ids;
pub mod node;

pub use design::{Cell, I5Tie, Net, NetKind, PhysDesign, Terminal};
pub use ids::{CellId, NetId, NodeId};
pub use node::{IntentCode, Pip, RouteNode, SitePinRef, Wire};
