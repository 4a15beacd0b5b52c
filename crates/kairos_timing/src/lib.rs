//! Static timing analysis and interconnect delay estimation for placed and
//! routed UltraScale+ designs.
//!
//! This crate loads per-device delay data, estimates the delay of every routed
//! connection from its wire composition, builds a pin-level timing graph, and
//! propagates arrival times, required times, and slack to find the critical
//! path and per-connection criticality.
//!
//! # Usage
//!
//! ```ignore
//! use kairos_timing::{ManagerOptions, TimingManager, TimingModel};
//! use std::sync::Arc;
//!
//! let model = Arc::new(TimingModel::load(&paths, &grid)?);
//! let manager = TimingManager::new(model, ManagerOptions::from(&paths));
//! let analysis = manager.analyze(&design, paths.requirement_ps)?;
//! println!("{}", analysis.report);
//! ```
//!
//! # Architecture
//!
//! - [`delay_table`]: logic and intra-site delay tables ([`delay_text`] parses them)
//! - [`terms`]: interconnect pricing terms
//! - [`geometry`]: per-column and per-row crossing penalties
//! - [`group`]: timing groups: coalescing and classifying routed nodes
//! - [`estimator`]: route tracing and per-connection delay estimation
//! - [`graph`]: pin-level timing graph arena
//! - [`builder`]: graph construction from a design, full or partial
//! - [`lut`]: used-input analysis of fractured LUTs
//! - [`sta`]: arrival/required/slack propagation and critical path
//! - [`criticality`]: per-connection criticality
//! - [`report`]: path report and Graphviz output
//! - [`manager`]: model loading and the end-to-end pipeline

#![warn(missing_docs)]

pub mod builder;
pub mod criticality;
pub mod delay_table;
pub mod delay_text;
pub mod error;
pub mod estimator;
pub mod geometry;
pub mod graph;
pub mod group;
pub mod ids;
pub mod lut;
pub mod manager;
pub mod report;
pub mod sta;
pub mod terms;

pub use builder::{carry_config, BuildStats, GraphBuilder};
pub use criticality::{criticality, criticality_for_pins};
pub use delay_table::DelayTables;
pub use error::{DataError, LookupError, RouteError};
pub use estimator::{
    trace_route, Endpoints, EstimatorOptions, NetDelay, NetDelayEstimator, RoutePath,
};
pub use geometry::DistanceTables;
pub use graph::{DelayEdge, EdgeKind, TimingGraph};
pub use group::{GroupDelayType, RoutingFabric, TimingDirection, TimingGroup};
pub use ids::{EdgeId, VertexId};
pub use manager::{Analysis, ManagerOptions, TimingManager, TimingModel};
pub use report::{write_dot, PathReport, PathRow};
pub use sta::{critical_path, propagate, topo_order, worst_slack, UNCONSTRAINED_REQUIRED};
pub use terms::{CrossingTerms, InterconnectTerms};
