//! Strongly typed identifiers for road-network nodes and edges.
//!
//! Node identifiers come from the ingestion source (OSM ids and the like)
//! and are therefore sparse `u64` values.  A built network addresses its
//! arrays with dense `NodeIdx` / `EdgeIdx` values and keeps its own
//! `NodeId → NodeIdx` map.
//!
//! Edges of a directed multigraph are identified by `(from, to, key)`: the
//! `key` discriminates parallel edges between the same ordered node pair.
//! `EdgeKey`'s derived `Ord` is lexicographic over that tuple and is the
//! deterministic tie-break wherever an "edge identifier order" is needed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generate a dense index wrapper around a primitive integer.
///
/// Dense indices address the SoA `Vec`s of a built network; they are only
/// meaningful for the network instance that produced them.
macro_rules! typed_index {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid index" (`u32::MAX`).
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized indices are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_index! {
    /// Dense index of a node inside one `RoadNetwork`.
    pub struct NodeIdx(u32);
}

typed_index! {
    /// Dense index of a directed edge inside one `RoadNetwork`.
    pub struct EdgeIdx(u32);
}

/// External identifier of a road-network node (intersection).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    #[inline(always)]
    fn from(raw: u64) -> NodeId {
        NodeId(raw)
    }
}

/// Identifier of a directed edge in a multigraph.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: NodeId,
    pub to:   NodeId,
    /// Parallel-edge discriminator, unique per ordered `(from, to)` pair.
    pub key:  u32,
}

impl EdgeKey {
    #[inline]
    pub fn new(from: NodeId, to: NodeId, key: u32) -> Self {
        Self { from, to, key }
    }

    /// The node pair with the smaller id first.  Used to deduplicate
    /// connector proposals regardless of direction.
    #[inline]
    pub fn undirected_pair(&self) -> (NodeId, NodeId) {
        undirected(self.from, self.to)
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}#{}", self.from, self.to, self.key)
    }
}

/// Order a node pair so that `(a, b)` and `(b, a)` map to the same value.
#[inline]
pub fn undirected(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}
