//! Fluent construction and validation of workflow graphs.

use miette::Diagnostic;
use thiserror::Error;

use super::{Graph, JoinPolicy, new_arc, new_node};
use crate::behavior::{DefaultNodeBehavior, NodeBehavior};
use crate::types::{ArcId, NodeId};

/// Declarative description of one node, consumed by [`GraphBuilder`].
///
/// Nodes default to backtrackable, non-start, [`JoinPolicy::Or`], and the
/// pass-through [`DefaultNodeBehavior`].
///
/// # Examples
///
/// ```rust
/// use oxbow::graph::{JoinPolicy, NodeSpec};
///
/// let spec = NodeSpec::new("settle")
///     .join(JoinPolicy::And)
///     .backtrackable(false);
/// ```
pub struct NodeSpec {
    name: String,
    backtrackable: bool,
    start: bool,
    join: JoinPolicy,
    behavior: Box<dyn NodeBehavior>,
}

impl NodeSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backtrackable: true,
            start: false,
            join: JoinPolicy::Or,
            behavior: Box::new(DefaultNodeBehavior),
        }
    }

    /// Sets the static backtrackable flag (default `true`).
    #[must_use]
    pub fn backtrackable(mut self, backtrackable: bool) -> Self {
        self.backtrackable = backtrackable;
        self
    }

    /// Marks this node as an execution entry point.
    #[must_use]
    pub fn start(mut self, start: bool) -> Self {
        self.start = start;
        self
    }

    /// Sets the join policy (default [`JoinPolicy::Or`]).
    #[must_use]
    pub fn join(mut self, join: JoinPolicy) -> Self {
        self.join = join;
        self
    }

    /// Attaches a behavior (default: pass-through).
    #[must_use]
    pub fn behavior(mut self, behavior: impl NodeBehavior + 'static) -> Self {
        self.behavior = Box::new(behavior);
        self
    }
}

/// Builder for workflow graphs with a fluent API.
///
/// Collects node specs and arcs, then validates the whole topology in
/// [`build`](Self::build). Validation failures are typed errors, never
/// panics.
///
/// # Examples
///
/// ```rust
/// use oxbow::graph::{GraphBuilder, JoinPolicy, NodeSpec};
///
/// // Fan-out from "intake", fan-in at "settle".
/// let graph = GraphBuilder::new()
///     .add_node(NodeSpec::new("intake").start(true))
///     .add_node(NodeSpec::new("check_funds"))
///     .add_node(NodeSpec::new("check_fraud"))
///     .add_node(NodeSpec::new("settle").join(JoinPolicy::And))
///     .add_arc("intake", "check_funds")
///     .add_arc("intake", "check_fraud")
///     .add_arc("check_funds", "settle")
///     .add_arc("check_fraud", "settle")
///     .build()
///     .unwrap();
///
/// assert_eq!(graph.node_count(), 4);
/// assert_eq!(graph.arc_count(), 4);
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    specs: Vec<NodeSpec>,
    arcs: Vec<(String, String, Option<String>)>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node to the graph.
    #[must_use]
    pub fn add_node(mut self, spec: NodeSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Adds an unnamed arc between two nodes (referenced by name).
    #[must_use]
    pub fn add_arc(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.arcs.push((from.into(), to.into(), None));
        self
    }

    /// Adds a named arc; completion fires it only when selected by name.
    #[must_use]
    pub fn add_named_arc(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.arcs.push((from.into(), to.into(), Some(name.into())));
        self
    }

    /// Validates the topology and produces an immutable [`Graph`].
    ///
    /// # Errors
    ///
    /// - [`GraphBuildError::DuplicateNode`]: two nodes share a name
    /// - [`GraphBuildError::UnknownNode`]: an arc references a name that
    ///   was never added
    /// - [`GraphBuildError::NoStartNode`]: nothing is flagged `start`
    pub fn build(self) -> Result<Graph, GraphBuildError> {
        let mut nodes = Vec::with_capacity(self.specs.len());
        for (index, spec) in self.specs.into_iter().enumerate() {
            if nodes
                .iter()
                .any(|n: &super::Node| n.name() == spec.name.as_str())
            {
                return Err(GraphBuildError::DuplicateNode { name: spec.name });
            }
            nodes.push(new_node(
                NodeId(index as u32),
                spec.name,
                spec.backtrackable,
                spec.start,
                spec.join,
                spec.behavior,
            ));
        }

        if !nodes.iter().any(super::Node::is_start) {
            return Err(GraphBuildError::NoStartNode);
        }

        let resolve = |name: &str| -> Result<NodeId, GraphBuildError> {
            nodes
                .iter()
                .find(|n| n.name() == name)
                .map(super::Node::id)
                .ok_or_else(|| GraphBuildError::UnknownNode {
                    name: name.to_string(),
                })
        };

        let mut arcs = Vec::with_capacity(self.arcs.len());
        for (index, (from, to, name)) in self.arcs.iter().enumerate() {
            arcs.push(new_arc(
                ArcId(index as u32),
                resolve(from)?,
                resolve(to)?,
                name.clone(),
            ));
        }

        Ok(Graph::from_parts(nodes, arcs))
    }
}

/// Structural problems detected while building a graph.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphBuildError {
    /// Two nodes were added under the same name.
    #[error("duplicate node name: {name}")]
    #[diagnostic(
        code(oxbow::graph::duplicate_node),
        help("Node names identify nodes in arcs; each must be unique.")
    )]
    DuplicateNode { name: String },

    /// An arc endpoint references a node that was never added.
    #[error("arc references unknown node: {name}")]
    #[diagnostic(code(oxbow::graph::unknown_node))]
    UnknownNode { name: String },

    /// No node is flagged as an execution entry point.
    #[error("graph has no start node")]
    #[diagnostic(
        code(oxbow::graph::no_start_node),
        help("Flag at least one node with NodeSpec::start(true).")
    )]
    NoStartNode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::JoinPolicy;

    #[test]
    fn builds_a_linear_graph() {
        let graph = GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .add_node(NodeSpec::new("b"))
            .add_arc("a", "b")
            .build()
            .unwrap();

        let a = graph.node_by_name("a").unwrap();
        let b = graph.node_by_name("b").unwrap();
        assert_eq!(graph.outgoing(a).len(), 1);
        assert_eq!(graph.incoming(b).len(), 1);
        assert_eq!(graph.arc(graph.outgoing(a)[0]).to(), b);
        assert_eq!(graph.start_nodes(), &[a]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .add_node(NodeSpec::new("a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphBuildError::DuplicateNode { .. }));
    }

    #[test]
    fn rejects_unknown_arc_endpoints() {
        let err = GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .add_arc("a", "ghost")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphBuildError::UnknownNode { name } if name == "ghost"));
    }

    #[test]
    fn rejects_graphs_without_a_start_node() {
        let err = GraphBuilder::new()
            .add_node(NodeSpec::new("a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphBuildError::NoStartNode));
    }

    #[test]
    fn node_defaults() {
        let graph = GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .build()
            .unwrap();
        let a = graph.node(graph.node_by_name("a").unwrap());
        assert!(a.backtrackable());
        assert_eq!(a.join(), JoinPolicy::Or);
    }

    #[test]
    fn named_arcs_keep_their_name() {
        let graph = GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .add_node(NodeSpec::new("b"))
            .add_named_arc("a", "b", "reject")
            .build()
            .unwrap();
        let a = graph.node_by_name("a").unwrap();
        assert_eq!(graph.arc(graph.outgoing(a)[0]).name(), Some("reject"));
    }
}
