//! Forward execution: the queue-driven engine.
//!
//! The [`Engine`] drives a [`GraphProcess`] forward by consuming its FIFO
//! work queue of arc tokens. Processing an arc token gathers the join set
//! required by the target node, asks the node's guard what to do with it,
//! and on acceptance consumes the parents into a new node token created
//! through the injected [`TokenFactory`]. Completion then fans out new
//! arc tokens over the satisfied outgoing arcs and enqueues them.
//!
//! Execution is synchronous and cooperative: guard evaluation and token
//! transitions run to completion before the next queue item is touched,
//! and discovery order is processing order.
//!
//! # Quick Start
//!
//! ```rust
//! use oxbow::engine::Engine;
//! use oxbow::graph::{GraphBuilder, NodeSpec};
//! use oxbow::process::ProcessState;
//!
//! let graph = std::sync::Arc::new(
//!     GraphBuilder::new()
//!         .add_node(NodeSpec::new("open").start(true))
//!         .add_node(NodeSpec::new("close"))
//!         .add_arc("open", "close")
//!         .build()
//!         .unwrap(),
//! );
//!
//! let engine = Engine::new();
//! let mut process = engine.start_process(graph).unwrap();
//! engine.run(&mut process).unwrap();
//! assert_eq!(process.state(), ProcessState::Complete);
//! ```

use miette::Diagnostic;
use thiserror::Error;

use crate::backtrack::{BacktrackError, BacktrackVisitor, compute_frontier};
use crate::behavior::{ArrivalOutcome, GuardAction};
use crate::factory::{MemTokenFactory, TokenFactory};
use crate::graph::{Graph, JoinPolicy};
use crate::process::{GraphProcess, ProcessState};
use crate::tokens::{ExecutionType, TokenStateError};
use crate::types::{ArcTokenId, NodeId, NodeTokenId};

/// Errors raised by forward execution.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    /// An internal token invariant was broken; the operation failed as a
    /// whole.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Token(#[from] TokenStateError),
}

/// Queue-driven forward executor over [`GraphProcess`] instances.
///
/// The engine is stateless apart from its token factory, so one engine
/// can drive any number of independent processes; exclusive access per
/// process is enforced by `&mut GraphProcess`.
pub struct Engine {
    factory: Box<dyn TokenFactory>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine backed by the in-memory token factory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factory: Box::new(MemTokenFactory),
        }
    }

    /// Creates an engine backed by a custom token factory.
    #[must_use]
    pub fn with_factory(factory: impl TokenFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
        }
    }

    /// Creates a process over `graph` and seeds a Forward node token at
    /// every start node, applying each one's arrival outcome.
    ///
    /// The queue is not drained; call [`run`](Self::run) to advance.
    pub fn start_process(
        &self,
        graph: std::sync::Arc<Graph>,
    ) -> Result<GraphProcess, EngineError> {
        let mut process = GraphProcess::new(graph);
        process.set_state(ProcessState::Executing);
        tracing::info!(process = %process.id(), "start process");

        let starts = process.graph().start_nodes().to_vec();
        for node in starts {
            let token =
                self.factory
                    .new_node_token(&mut process, node, ExecutionType::Forward, vec![], None);
            process.add_active_node_token(token);
            self.apply_arrival(&mut process, token)?;
        }
        process.refresh_state();
        Ok(process)
    }

    /// Drains the forward-execution queue in FIFO order.
    pub fn run(&self, process: &mut GraphProcess) -> Result<(), EngineError> {
        while let Some(token) = process.dequeue_arc_token() {
            self.process_arc_token(process, token)?;
        }
        process.refresh_state();
        Ok(())
    }

    /// Completes a node token and fans out over the outgoing arcs
    /// selected by `arc_name` (`None` selects the unnamed arcs).
    ///
    /// New arc tokens are linked as the token's children, added to the
    /// active set and enqueued, but not yet processed.
    pub fn complete_execution(
        &self,
        process: &mut GraphProcess,
        token: NodeTokenId,
        arc_name: Option<&str>,
    ) -> Result<(), EngineError> {
        process.node_token_mut(token).mark_complete()?;
        process.remove_active_node_token(token);

        let graph = process.graph_handle();
        let node = process.node_token(token).node();
        for &arc_id in graph.outgoing(node) {
            if graph.arc(arc_id).name() != arc_name {
                continue;
            }
            let arc_token =
                self.factory
                    .new_arc_token(process, arc_id, ExecutionType::Forward, token);
            process.node_token_mut(token).push_child(arc_token);
            process.add_active_arc_token(arc_token);
            process.enqueue_arc_token_for_execution(arc_token);
        }
        process.refresh_state();
        Ok(())
    }

    /// Rewinds completed history back to `destination` and returns the
    /// new live node token standing in for it.
    ///
    /// Validation covers the whole frontier before any mutation: if any
    /// visited node refuses backtracking, the process is left untouched.
    /// UTurn arc tokens re-entering live execution are enqueued but the
    /// queue is not drained here; call [`run`](Self::run) to resume.
    pub fn backtrack(
        &self,
        process: &mut GraphProcess,
        destination: NodeTokenId,
    ) -> Result<NodeTokenId, BacktrackError> {
        let frontier = compute_frontier(process, destination)?;
        tracing::info!(
            process = %process.id(),
            destination = %destination,
            visited = frontier.visited_len(),
            "backtrack"
        );
        let result =
            BacktrackVisitor::new(self.factory.as_ref(), destination, frontier).rewind(process)?;
        process.add_active_node_token(result);
        process.set_state(ProcessState::Executing);
        Ok(result)
    }

    fn process_arc_token(
        &self,
        process: &mut GraphProcess,
        token: ArcTokenId,
    ) -> Result<(), EngineError> {
        // Stale queue entries: consumed by an earlier join, discarded, or
        // rewound while waiting.
        if !process.is_arc_token_active(token) || process.arc_token(token).is_complete() {
            tracing::trace!(process = %process.id(), token = %token, "skip stale arc token");
            return Ok(());
        }

        let graph = process.graph_handle();
        let target = graph.arc(process.arc_token(token).arc()).to();
        let node = graph.node(target);

        let parents = match node.join() {
            JoinPolicy::Or => vec![token],
            JoinPolicy::And => match self.gather_and_join(process, target) {
                Some(parents) => parents,
                None => {
                    tracing::debug!(process = %process.id(), token = %token, node = node.name(), "join unsatisfied");
                    return Ok(());
                }
            },
        };

        match node.behavior().evaluate_guard(process, node, &parents) {
            GuardAction::Accept => {
                let node_token = self.factory.new_node_token(
                    process,
                    target,
                    ExecutionType::Forward,
                    parents.clone(),
                    None,
                );
                process
                    .node_token_mut(node_token)
                    .record_guard_action(GuardAction::Accept);
                for &parent in &parents {
                    process.arc_token_mut(parent).mark_complete(node_token)?;
                    process.remove_active_arc_token(parent);
                }
                process.add_active_node_token(node_token);
                self.apply_arrival(process, node_token)
            }
            GuardAction::Defer => {
                // Ordinary control flow: the token stays pending in the
                // active set until the host re-enqueues it.
                tracing::debug!(process = %process.id(), token = %token, node = node.name(), "guard deferred");
                Ok(())
            }
            GuardAction::Discard => {
                tracing::debug!(process = %process.id(), token = %token, node = node.name(), "guard discarded");
                process.remove_active_arc_token(token);
                process.refresh_state();
                Ok(())
            }
        }
    }

    /// One pending arc token per incoming arc, in incoming-arc order, or
    /// `None` while the join is unsatisfied.
    fn gather_and_join(
        &self,
        process: &GraphProcess,
        target: NodeId,
    ) -> Option<Vec<ArcTokenId>> {
        let graph = process.graph();
        let mut parents = Vec::with_capacity(graph.incoming(target).len());
        for &arc_id in graph.incoming(target) {
            let pending = process.active_arc_tokens().iter().copied().find(|&t| {
                let at = process.arc_token(t);
                at.arc() == arc_id && at.is_pending()
            })?;
            parents.push(pending);
        }
        Some(parents)
    }

    fn apply_arrival(
        &self,
        process: &mut GraphProcess,
        token: NodeTokenId,
    ) -> Result<(), EngineError> {
        let graph = process.graph_handle();
        let node = graph.node(process.node_token(token).node());
        match node.behavior().on_arrival(process, token) {
            ArrivalOutcome::Complete { arc_name } => {
                self.complete_execution(process, token, arc_name.as_deref())
            }
            ArrivalOutcome::Wait => {
                tracing::debug!(process = %process.id(), token = %token, node = node.name(), "token waiting");
                Ok(())
            }
        }
    }
}
