//! Process instances: token arenas, active sets, and the work queue.
//!
//! A [`GraphProcess`] is one running workflow instance. It owns the
//! authoritative state of that instance: the token arenas, the sets of
//! currently active tokens, the process-level environment and the FIFO
//! queue of arc tokens awaiting forward execution. It exposes the
//! mutation operations the engine and the backtracker act through.
//!
//! Exclusive ownership is enforced by the borrow checker: every mutating
//! operation takes `&mut self`, so only one logical operation can be in
//! flight against a process at a time. For hosting many processes behind
//! a lock-per-instance discipline, see
//! [`ProcessRegistry`](crate::runtime::ProcessRegistry).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::env::{MapEnv, NestedEnv};
use crate::graph::Graph;
use crate::tokens::{ArcToken, NodeToken};
use crate::types::{ArcTokenId, NodeTokenId, ProcessId};

/// Lifecycle state of a process instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessState {
    /// Created but not yet seeded with tokens.
    #[default]
    Created,
    /// Live: tokens are active or queued.
    Executing,
    /// Terminal: no active tokens remain and nothing is queued.
    Complete,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Executing => write!(f, "executing"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// One running workflow instance.
///
/// Tokens are arena-stored and referenced by dense ids; they are never
/// deleted. Backtracked tokens stay in the arena as permanent, audit-only
/// history; the active sets and the queue are what shrink as work
/// completes or is rewound.
pub struct GraphProcess {
    id: ProcessId,
    graph: std::sync::Arc<Graph>,
    env: MapEnv,
    node_tokens: Vec<NodeToken>,
    arc_tokens: Vec<ArcToken>,
    active_node_tokens: Vec<NodeTokenId>,
    active_arc_tokens: Vec<ArcTokenId>,
    execution_queue: VecDeque<ArcTokenId>,
    state: ProcessState,
}

impl GraphProcess {
    /// Creates an empty process instance over `graph`.
    #[must_use]
    pub fn new(graph: std::sync::Arc<Graph>) -> Self {
        Self {
            id: ProcessId::new(),
            graph,
            env: MapEnv::new(),
            node_tokens: Vec::new(),
            arc_tokens: Vec::new(),
            active_node_tokens: Vec::new(),
            active_arc_tokens: Vec::new(),
            execution_queue: VecDeque::new(),
            state: ProcessState::Created,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: ProcessId,
        graph: std::sync::Arc<Graph>,
        env: MapEnv,
        node_tokens: Vec<NodeToken>,
        arc_tokens: Vec<ArcToken>,
        active_node_tokens: Vec<NodeTokenId>,
        active_arc_tokens: Vec<ArcTokenId>,
        execution_queue: VecDeque<ArcTokenId>,
        state: ProcessState,
    ) -> Self {
        Self {
            id,
            graph,
            env,
            node_tokens,
            arc_tokens,
            active_node_tokens,
            active_arc_tokens,
            execution_queue,
            state,
        }
    }

    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// A cloneable handle to the graph, for use while the process itself
    /// is mutably borrowed.
    #[must_use]
    pub fn graph_handle(&self) -> std::sync::Arc<Graph> {
        std::sync::Arc::clone(&self.graph)
    }

    #[must_use]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ProcessState) {
        if self.state != state {
            tracing::info!(process = %self.id, from = %self.state, to = %state, "process state");
            self.state = state;
        }
    }

    /// Marks the process terminal when nothing is active or queued.
    pub(crate) fn refresh_state(&mut self) {
        if self.state == ProcessState::Executing
            && self.active_node_tokens.is_empty()
            && self.active_arc_tokens.is_empty()
            && self.execution_queue.is_empty()
        {
            self.set_state(ProcessState::Complete);
        }
    }

    // --- environment ------------------------------------------------------

    /// The process-level environment scope.
    #[must_use]
    pub fn env(&self) -> &MapEnv {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut MapEnv {
        &mut self.env
    }

    /// The effective environment of a node token: its local scope nested
    /// over this process's scope.
    #[must_use]
    pub fn full_env(&self, token: NodeTokenId) -> NestedEnv<'_> {
        NestedEnv::new(self.node_token(token).env(), &self.env)
    }

    /// Mutable access to a node token's local scope. Writes through the
    /// effective environment always land here, never in the process
    /// scope.
    pub fn token_env_mut(&mut self, token: NodeTokenId) -> &mut MapEnv {
        self.node_token_mut(token).env_mut()
    }

    // --- arenas -----------------------------------------------------------

    /// Looks up a node token. Ids are minted by the token factory and are
    /// only defined for this process.
    #[must_use]
    pub fn node_token(&self, id: NodeTokenId) -> &NodeToken {
        &self.node_tokens[id.index()]
    }

    pub(crate) fn node_token_mut(&mut self, id: NodeTokenId) -> &mut NodeToken {
        &mut self.node_tokens[id.index()]
    }

    /// Looks up an arc token.
    #[must_use]
    pub fn arc_token(&self, id: ArcTokenId) -> &ArcToken {
        &self.arc_tokens[id.index()]
    }

    pub(crate) fn arc_token_mut(&mut self, id: ArcTokenId) -> &mut ArcToken {
        &mut self.arc_tokens[id.index()]
    }

    /// All node tokens ever created, live and historical.
    pub fn node_tokens(&self) -> impl Iterator<Item = &NodeToken> {
        self.node_tokens.iter()
    }

    /// All arc tokens ever created, live and historical.
    pub fn arc_tokens(&self) -> impl Iterator<Item = &ArcToken> {
        self.arc_tokens.iter()
    }

    pub(crate) fn next_node_token_id(&self) -> NodeTokenId {
        NodeTokenId(self.node_tokens.len() as u32)
    }

    pub(crate) fn next_arc_token_id(&self) -> ArcTokenId {
        ArcTokenId(self.arc_tokens.len() as u32)
    }

    pub(crate) fn insert_node_token(&mut self, token: NodeToken) -> NodeTokenId {
        let id = token.id();
        debug_assert_eq!(id.index(), self.node_tokens.len());
        self.node_tokens.push(token);
        id
    }

    pub(crate) fn insert_arc_token(&mut self, token: ArcToken) -> ArcTokenId {
        let id = token.id();
        debug_assert_eq!(id.index(), self.arc_tokens.len());
        self.arc_tokens.push(token);
        id
    }

    // --- active sets ------------------------------------------------------

    /// Currently active (incomplete) node tokens, in insertion order.
    #[must_use]
    pub fn active_node_tokens(&self) -> &[NodeTokenId] {
        &self.active_node_tokens
    }

    /// Currently active (unconsumed) arc tokens, in insertion order.
    #[must_use]
    pub fn active_arc_tokens(&self) -> &[ArcTokenId] {
        &self.active_arc_tokens
    }

    pub fn add_active_node_token(&mut self, id: NodeTokenId) {
        tracing::trace!(process = %self.id, token = %id, "activate node token");
        self.active_node_tokens.push(id);
    }

    pub fn remove_active_node_token(&mut self, id: NodeTokenId) {
        if let Some(pos) = self.active_node_tokens.iter().position(|t| *t == id) {
            self.active_node_tokens.remove(pos);
        }
    }

    pub fn add_active_arc_token(&mut self, id: ArcTokenId) {
        tracing::trace!(process = %self.id, token = %id, "activate arc token");
        self.active_arc_tokens.push(id);
    }

    pub fn remove_active_arc_token(&mut self, id: ArcTokenId) {
        if let Some(pos) = self.active_arc_tokens.iter().position(|t| *t == id) {
            self.active_arc_tokens.remove(pos);
        }
    }

    #[must_use]
    pub fn is_arc_token_active(&self, id: ArcTokenId) -> bool {
        self.active_arc_tokens.contains(&id)
    }

    #[must_use]
    pub fn has_active_tokens(&self) -> bool {
        !self.active_node_tokens.is_empty() || !self.active_arc_tokens.is_empty()
    }

    // --- execution queue --------------------------------------------------

    /// Appends an arc token to the forward-execution work queue.
    pub fn enqueue_arc_token_for_execution(&mut self, id: ArcTokenId) {
        tracing::trace!(process = %self.id, token = %id, "enqueue arc token");
        self.execution_queue.push_back(id);
    }

    pub(crate) fn dequeue_arc_token(&mut self) -> Option<ArcTokenId> {
        self.execution_queue.pop_front()
    }

    /// The pending forward-execution queue, front first.
    #[must_use]
    pub fn execution_queue(&self) -> &VecDeque<ArcTokenId> {
        &self.execution_queue
    }
}

impl fmt::Debug for GraphProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphProcess")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("node_tokens", &self.node_tokens.len())
            .field("arc_tokens", &self.arc_tokens.len())
            .field("active_node_tokens", &self.active_node_tokens)
            .field("active_arc_tokens", &self.active_arc_tokens)
            .field("execution_queue", &self.execution_queue)
            .finish_non_exhaustive()
    }
}
