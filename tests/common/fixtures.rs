//! Graph fixtures and token lookup helpers.

use std::sync::Arc;

use oxbow::graph::{Graph, GraphBuilder, JoinPolicy, NodeSpec};
use oxbow::process::GraphProcess;
use oxbow::types::{ArcTokenId, NodeTokenId};

/// `a -> b -> c`, `a` is the start node.
pub fn linear_chain() -> Arc<Graph> {
    Arc::new(
        GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .add_node(NodeSpec::new("b"))
            .add_node(NodeSpec::new("c"))
            .add_arc("a", "b")
            .add_arc("b", "c")
            .build()
            .unwrap(),
    )
}

/// `a` fans out to `b` and `c`; both join at `d` (And-join).
pub fn diamond() -> Arc<Graph> {
    Arc::new(
        GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .add_node(NodeSpec::new("b"))
            .add_node(NodeSpec::new("c"))
            .add_node(NodeSpec::new("d").join(JoinPolicy::And))
            .add_arc("a", "b")
            .add_arc("a", "c")
            .add_arc("b", "d")
            .add_arc("c", "d")
            .build()
            .unwrap(),
    )
}

/// All node tokens resident at the named node, in creation order.
pub fn tokens_at(process: &GraphProcess, name: &str) -> Vec<NodeTokenId> {
    process
        .node_tokens()
        .filter(|t| process.graph().node(t.node()).name() == name)
        .map(|t| t.id())
        .collect()
}

/// The first (original) node token resident at the named node.
pub fn token_at(process: &GraphProcess, name: &str) -> NodeTokenId {
    tokens_at(process, name)[0]
}

/// All arc tokens traveling the arc `from -> to`, in creation order.
pub fn arc_tokens_between(process: &GraphProcess, from: &str, to: &str) -> Vec<ArcTokenId> {
    let graph = process.graph();
    let from = graph.node_by_name(from).unwrap();
    let to = graph.node_by_name(to).unwrap();
    process
        .arc_tokens()
        .filter(|t| {
            let arc = graph.arc(t.arc());
            arc.from() == from && arc.to() == to
        })
        .map(|t| t.id())
        .collect()
}
