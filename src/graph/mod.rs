//! Graph definition: immutable workflow topology.
//!
//! A [`Graph`] is the static shape of a workflow: [`Node`]s connected by
//! directed [`Arc`]s, built once through [`GraphBuilder`] and shared
//! read-only (behind `std::sync::Arc`) by every process executing it.
//! Nodes carry the policy hooks the engine consults at runtime: a
//! [`NodeBehavior`] for guards and arrival handling, a backtrackable
//! flag, and a [`JoinPolicy`] deciding how arriving arc tokens combine.
//!
//! # Quick Start
//!
//! ```rust
//! use oxbow::graph::{GraphBuilder, NodeSpec};
//!
//! let graph = GraphBuilder::new()
//!     .add_node(NodeSpec::new("request").start(true))
//!     .add_node(NodeSpec::new("review"))
//!     .add_node(NodeSpec::new("archive"))
//!     .add_arc("request", "review")
//!     .add_arc("review", "archive")
//!     .build()
//!     .unwrap();
//!
//! let request = graph.node_by_name("request").unwrap();
//! assert_eq!(graph.outgoing(request).len(), 1);
//! assert_eq!(graph.start_nodes(), &[request]);
//! ```

mod builder;
#[cfg(feature = "petgraph-compat")]
pub mod petgraph_compat;

pub use builder::{GraphBuildError, GraphBuilder, NodeSpec};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::behavior::NodeBehavior;
use crate::types::{ArcId, NodeId};

/// How arriving arc tokens combine at a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinPolicy {
    /// Fire once per arriving arc token.
    #[default]
    Or,
    /// Wait until a pending arc token sits on every incoming arc, then
    /// consume one from each.
    And,
}

/// A vertex in the workflow graph.
///
/// Immutable once the graph is built. The behavior is the node's policy
/// surface; the `backtrackable` flag is the static default its
/// [`NodeBehavior::is_backtrackable`] answer falls back to.
pub struct Node {
    id: NodeId,
    name: String,
    backtrackable: bool,
    start: bool,
    join: JoinPolicy,
    behavior: Box<dyn NodeBehavior>,
}

impl Node {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn backtrackable(&self) -> bool {
        self.backtrackable
    }

    /// `true` if execution seeds an initial token here.
    #[must_use]
    pub fn is_start(&self) -> bool {
        self.start
    }

    #[must_use]
    pub fn join(&self) -> JoinPolicy {
        self.join
    }

    #[must_use]
    pub fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("backtrackable", &self.backtrackable)
            .field("start", &self.start)
            .field("join", &self.join)
            .finish_non_exhaustive()
    }
}

/// A directed edge between two nodes.
///
/// An arc may carry a name; completion selects which outgoing arcs fire
/// by name (unnamed arcs are the default set).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arc {
    id: ArcId,
    from: NodeId,
    to: NodeId,
    name: Option<String>,
}

impl Arc {
    #[must_use]
    pub fn id(&self) -> ArcId {
        self.id
    }

    #[must_use]
    pub fn from(&self) -> NodeId {
        self.from
    }

    #[must_use]
    pub fn to(&self) -> NodeId {
        self.to
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Immutable workflow topology with id- and name-based lookup.
///
/// Node and arc ids are dense indices assigned by the builder; lookups by
/// id are direct table accesses and are only defined for ids minted by
/// the builder that produced this graph.
pub struct Graph {
    nodes: Vec<Node>,
    arcs: Vec<Arc>,
    by_name: FxHashMap<String, NodeId>,
    outgoing: Vec<Vec<ArcId>>,
    incoming: Vec<Vec<ArcId>>,
    start_nodes: Vec<NodeId>,
}

impl Graph {
    pub(crate) fn from_parts(nodes: Vec<Node>, arcs: Vec<Arc>) -> Self {
        let mut by_name = FxHashMap::default();
        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        let mut start_nodes = Vec::new();

        for node in &nodes {
            by_name.insert(node.name.clone(), node.id);
            if node.start {
                start_nodes.push(node.id);
            }
        }
        for arc in &arcs {
            outgoing[arc.from.index()].push(arc.id);
            incoming[arc.to.index()].push(arc.id);
        }

        Self {
            nodes,
            arcs,
            by_name,
            outgoing,
            incoming,
            start_nodes,
        }
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Looks up a node id by name.
    #[must_use]
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Looks up an arc by id.
    #[must_use]
    pub fn arc(&self, id: ArcId) -> &Arc {
        &self.arcs[id.index()]
    }

    /// Arcs leaving `node`, in insertion order.
    #[must_use]
    pub fn outgoing(&self, node: NodeId) -> &[ArcId] {
        &self.outgoing[node.index()]
    }

    /// Arcs entering `node`, in insertion order.
    #[must_use]
    pub fn incoming(&self, node: NodeId) -> &[ArcId] {
        &self.incoming[node.index()]
    }

    /// Nodes flagged as execution entry points.
    #[must_use]
    pub fn start_nodes(&self) -> &[NodeId] {
        &self.start_nodes
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn arcs(&self) -> impl Iterator<Item = &Arc> {
        self.arcs.iter()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("arcs", &self.arcs)
            .field("start_nodes", &self.start_nodes)
            .finish_non_exhaustive()
    }
}

pub(crate) fn new_node(
    id: NodeId,
    name: String,
    backtrackable: bool,
    start: bool,
    join: JoinPolicy,
    behavior: Box<dyn NodeBehavior>,
) -> Node {
    Node {
        id,
        name,
        backtrackable,
        start,
        join,
        behavior,
    }
}

pub(crate) fn new_arc(id: ArcId, from: NodeId, to: NodeId, name: Option<String>) -> Arc {
    Arc { id, from, to, name }
}
