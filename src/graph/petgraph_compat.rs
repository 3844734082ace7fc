//! Optional petgraph compatibility layer.
//!
//! Converts a workflow [`Graph`](super::Graph) into a petgraph `DiGraph`
//! for analysis (cycle checks, reachability) and DOT visualization.
//!
//! # Feature Gate
//!
//! Only available with the `petgraph-compat` feature:
//!
//! ```toml
//! [dependencies]
//! oxbow = { version = "0.1", features = ["petgraph-compat"] }
//! ```
//!
//! # Examples
//!
//! ```ignore
//! use petgraph::algo::is_cyclic_directed;
//!
//! let conversion = graph.to_petgraph();
//! assert!(!is_cyclic_directed(&conversion.graph));
//! println!("{}", graph.to_dot());
//! ```

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use super::Graph;
use crate::types::NodeId;

/// A petgraph view of a workflow graph.
///
/// Node weights are node names, edge weights are arc names (empty string
/// for unnamed arcs).
pub type WorkflowDiGraph = DiGraph<String, String>;

/// Result of converting a workflow graph to petgraph form.
#[derive(Debug, Clone)]
pub struct PetgraphConversion {
    /// The petgraph directed graph.
    pub graph: WorkflowDiGraph,
    /// Mapping from workflow node id to petgraph index.
    pub index_map: FxHashMap<NodeId, NodeIndex>,
}

impl PetgraphConversion {
    /// Looks up the petgraph index for a workflow node.
    #[must_use]
    pub fn index_of(&self, node: NodeId) -> Option<NodeIndex> {
        self.index_map.get(&node).copied()
    }
}

impl Graph {
    /// Converts this topology into a petgraph `DiGraph`.
    #[must_use]
    pub fn to_petgraph(&self) -> PetgraphConversion {
        let mut graph = DiGraph::new();
        let mut index_map = FxHashMap::default();

        for node in self.nodes() {
            let index = graph.add_node(node.name().to_string());
            index_map.insert(node.id(), index);
        }
        for arc in self.arcs() {
            graph.add_edge(
                index_map[&arc.from()],
                index_map[&arc.to()],
                arc.name().unwrap_or_default().to_string(),
            );
        }

        PetgraphConversion { graph, index_map }
    }

    /// Renders this topology in DOT format.
    #[must_use]
    pub fn to_dot(&self) -> String {
        format!("{:?}", Dot::new(&self.to_petgraph().graph))
    }
}
