//! Arc-traveling execution tokens.

use chrono::{DateTime, Utc};

use super::{ExecutionType, TokenStateError};
use crate::types::{ArcId, ArcTokenId, NodeTokenId, ProcessId};

/// A unit of execution traveling along one arc.
///
/// An arc token is pending (a leaf) until a consumer node token is
/// assigned via [`mark_complete`](Self::mark_complete). The `processed`
/// flag is backtracker bookkeeping: it records that the token has been
/// fully folded into a rewind, which is distinct from being complete.
#[derive(Clone, Debug)]
pub struct ArcToken {
    id: ArcTokenId,
    arc: ArcId,
    process: ProcessId,
    execution_type: ExecutionType,
    completed_at: Option<DateTime<Utc>>,
    parent: NodeTokenId,
    child: Option<NodeTokenId>,
    processed: bool,
}

impl ArcToken {
    pub(crate) fn new(
        id: ArcTokenId,
        arc: ArcId,
        process: ProcessId,
        execution_type: ExecutionType,
        parent: NodeTokenId,
    ) -> Self {
        Self {
            id,
            arc,
            process,
            execution_type,
            completed_at: None,
            parent,
            child: None,
            processed: false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: ArcTokenId,
        arc: ArcId,
        process: ProcessId,
        execution_type: ExecutionType,
        completed_at: Option<DateTime<Utc>>,
        parent: NodeTokenId,
        child: Option<NodeTokenId>,
        processed: bool,
    ) -> Self {
        Self {
            id,
            arc,
            process,
            execution_type,
            completed_at,
            parent,
            child,
            processed,
        }
    }

    #[must_use]
    pub fn id(&self) -> ArcTokenId {
        self.id
    }

    #[must_use]
    pub fn arc(&self) -> ArcId {
        self.arc
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
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// The node token that produced this token.
    #[must_use]
    pub fn parent(&self) -> NodeTokenId {
        self.parent
    }

    /// The node token that consumed this token, if any.
    #[must_use]
    pub fn child(&self) -> Option<NodeTokenId> {
        self.child
    }

    /// `true` while no consumer has been assigned.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.child.is_none() && self.completed_at.is_none()
    }

    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Assigns the consumer and sets the completion timestamp.
    pub fn mark_complete(&mut self, child: NodeTokenId) -> Result<(), TokenStateError> {
        if self.completed_at.is_some() {
            return Err(TokenStateError::ArcAlreadyComplete { token: self.id });
        }
        self.child = Some(child);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Applies the backtracked execution-type transition.
    pub fn mark_backtracked(&mut self) -> Result<(), TokenStateError> {
        self.execution_type = self
            .execution_type
            .corresponding_backtracked(self.is_complete())?;
        Ok(())
    }

    /// Flags the token as folded into a rewind's bookkeeping.
    pub fn mark_processed(&mut self) {
        self.processed = true;
    }
}
