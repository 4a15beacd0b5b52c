//! Opaque ID newtypes for timing graph entities.
//!
//! [`VertexId`] and [`EdgeId`] are thin `u32` wrappers used as arena indices
//! into the [`TimingGraph`](crate::graph::TimingGraph). Vertex 0 and vertex 1
//! are always the super-source and super-sink.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a pin vertex in the timing graph.
    VertexId
);

define_id!(
    /// Opaque, copyable ID for a delay edge in the timing graph.
    ///
    /// IDs of removed edges stay valid and resolve to a tombstone; they are
    /// never reused for a different edge.
    EdgeId
);

impl VertexId {
    /// The super-source vertex.
    pub const SUPER_SOURCE: VertexId = VertexId(0);
    /// The super-sink vertex.
    pub const SUPER_SINK: VertexId = VertexId(1);

    /// `true` for the super-source or super-sink.
    pub fn is_super(self) -> bool {
        self.0 < 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn vertex_id_roundtrip() {
        let id = VertexId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert!(!id.is_super());
    }

    #[test]
    fn reserved_vertices() {
        assert_eq!(VertexId::SUPER_SOURCE.as_raw(), 0);
        assert_eq!(VertexId::SUPER_SINK.as_raw(), 1);
        assert!(VertexId::SUPER_SINK.is_super());
    }

    #[test]
    fn ids_hash_by_value() {
        let mut set = HashSet::new();
        set.insert(EdgeId::from_raw(1));
        set.insert(EdgeId::from_raw(1));
        set.insert(EdgeId::from_raw(2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let id = EdgeId::from_raw(7);
        let json = serde_json::to_string(&id).unwrap();
        let back: EdgeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
