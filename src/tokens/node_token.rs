//! Node-resident execution tokens.

use chrono::{DateTime, Utc};

use super::{ExecutionType, TokenStateError};
use crate::behavior::GuardAction;
use crate::env::MapEnv;
use crate::types::{ArcTokenId, NodeId, NodeTokenId, ProcessId};

/// A unit of execution resident at a node.
///
/// Node tokens are created by the token factory as execution advances (or
/// as the backtracker rebuilds ancestry) and live in their process's arena
/// for good: a backtracked token is permanent history, never deleted and
/// never mutated further except to receive newly linked children during
/// the rewind it participates in.
///
/// The parent list holds the arc tokens that produced this token (several
/// for a join node, in incoming-arc order); the child list holds the arc
/// tokens it has spawned, one per taken outgoing arc.
#[derive(Clone, Debug)]
pub struct NodeToken {
    id: NodeTokenId,
    node: NodeId,
    process: ProcessId,
    execution_type: ExecutionType,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    guard_action: Option<GuardAction>,
    parents: Vec<ArcTokenId>,
    children: Vec<ArcTokenId>,
    replaced_by: Option<NodeTokenId>,
    env: MapEnv,
}

impl NodeToken {
    pub(crate) fn new(
        id: NodeTokenId,
        node: NodeId,
        process: ProcessId,
        execution_type: ExecutionType,
        parents: Vec<ArcTokenId>,
        created_at: DateTime<Utc>,
        env: MapEnv,
    ) -> Self {
        Self {
            id,
            node,
            process,
            execution_type,
            created_at,
            completed_at: None,
            guard_action: None,
            parents,
            children: Vec::new(),
            replaced_by: None,
            env,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: NodeTokenId,
        node: NodeId,
        process: ProcessId,
        execution_type: ExecutionType,
        created_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        guard_action: Option<GuardAction>,
        parents: Vec<ArcTokenId>,
        children: Vec<ArcTokenId>,
        replaced_by: Option<NodeTokenId>,
        env: MapEnv,
    ) -> Self {
        Self {
            id,
            node,
            process,
            execution_type,
            created_at,
            completed_at,
            guard_action,
            parents,
            children,
            replaced_by,
            env,
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeTokenId {
        self.id
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn process(&self) -> ProcessId {
        self.process
    }

    #[must_use]
    pub fn execution_type(&self) -> ExecutionType {
        self.execution_type
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// `true` once the completion timestamp has been set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// The last recorded guard-evaluation outcome, if any.
    #[must_use]
    pub fn guard_action(&self) -> Option<GuardAction> {
        self.guard_action
    }

    /// Parent arc tokens, in the order they were consumed.
    #[must_use]
    pub fn parents(&self) -> &[ArcTokenId] {
        &self.parents
    }

    /// Child arc tokens, in the order they were spawned.
    #[must_use]
    pub fn children(&self) -> &[ArcTokenId] {
        &self.children
    }

    /// The token that replaced this one during a rewind, if any.
    #[must_use]
    pub fn replaced_by(&self) -> Option<NodeTokenId> {
        self.replaced_by
    }

    /// This token's local environment scope.
    #[must_use]
    pub fn env(&self) -> &MapEnv {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut MapEnv {
        &mut self.env
    }

    /// Sets the completion timestamp.
    ///
    /// The timestamp is set exactly once; a second call is a consistency
    /// error.
    pub fn mark_complete(&mut self) -> Result<(), TokenStateError> {
        if self.completed_at.is_some() {
            return Err(TokenStateError::NodeAlreadyComplete { token: self.id });
        }
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Records the outcome of a guard evaluation.
    pub fn record_guard_action(&mut self, action: GuardAction) {
        self.guard_action = Some(action);
    }

    /// Applies the backtracked execution-type transition.
    ///
    /// Fails if the token already carries a backtracked tag; the transition
    /// is the only way a token becomes backtracked.
    pub fn mark_backtracked(&mut self) -> Result<(), TokenStateError> {
        self.execution_type = self
            .execution_type
            .corresponding_backtracked(self.is_complete())?;
        Ok(())
    }

    pub(crate) fn push_child(&mut self, child: ArcTokenId) {
        self.children.push(child);
    }

    pub(crate) fn set_replaced_by(&mut self, replacement: NodeTokenId) {
        self.replaced_by = Some(replacement);
    }
}
