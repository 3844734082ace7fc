//! Core identifier types for the Oxbow workflow engine.
//!
//! This module defines the newtypes used throughout the system to name
//! nodes and arcs in a workflow graph, tokens in a process's arena, and
//! process instances themselves. These are the core domain handles that
//! every other module trades in.
//!
//! # Key Types
//!
//! - [`NodeId`] / [`ArcId`]: indices into a [`Graph`](crate::graph::Graph)'s
//!   node and arc tables, assigned by the builder
//! - [`NodeTokenId`] / [`ArcTokenId`]: indices into a process's token arenas
//! - [`ProcessId`]: globally unique identifier for a process instance
//!
//! Graph and token ids are plain arena indices rather than references:
//! tokens form a DAG with back-references in both directions, and stable
//! indices sidestep the ownership cycles that direct links would create.
//!
//! # Examples
//!
//! ```rust
//! use oxbow::types::{NodeId, ProcessId};
//!
//! let node = NodeId(0);
//! assert_eq!(node.to_string(), "0");
//!
//! let process = ProcessId::new();
//! assert_ne!(process, ProcessId::new());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies a node within a [`Graph`](crate::graph::Graph).
///
/// Assigned by [`GraphBuilder`](crate::graph::GraphBuilder) in insertion
/// order; only valid for the graph that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// Identifies an arc within a [`Graph`](crate::graph::Graph).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArcId(pub u32);

/// Identifies a node token within a process's token arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTokenId(pub u32);

/// Identifies an arc token within a process's token arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArcTokenId(pub u32);

/// Globally unique identifier for a process instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub Uuid);

impl ProcessId {
    /// Mint a fresh process identifier (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProcessId {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! index_display {
    ($($ty:ty),+) => {
        $(
            impl $ty {
                /// The raw arena/table index this id names.
                #[must_use]
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

index_display!(NodeId, ArcId, NodeTokenId, ArcTokenId);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
