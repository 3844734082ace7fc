//! Node behavior contracts: guards, backtrackability, arrival handling.
//!
//! This module provides the seam between the engine and per-node business
//! logic. A [`NodeBehavior`] is a pure decision function attached to a
//! node at graph-build time: it inspects the process and answers, and the
//! engine applies every side effect. That split keeps behaviors trivially
//! testable and keeps all token mutation in one place.
//!
//! # Guard Evaluation
//!
//! When the accumulated parent arc tokens at a node satisfy its join
//! policy, the engine asks the behavior's guard what to do with them:
//!
//! - [`GuardAction::Accept`]: consume the parents into a new node token
//! - [`GuardAction::Defer`]: leave the arc token pending; ordinary
//!   control flow, not an error; the host may re-enqueue it later
//! - [`GuardAction::Discard`]: retire the arc token without a consumer
//!
//! # Examples
//!
//! ```rust
//! use oxbow::behavior::{GuardAction, NodeBehavior};
//! use oxbow::graph::Node;
//! use oxbow::process::GraphProcess;
//! use oxbow::types::ArcTokenId;
//!
//! /// Accepts only when the process env carries an approval flag.
//! struct ApprovalGate;
//!
//! impl NodeBehavior for ApprovalGate {
//!     fn evaluate_guard(
//!         &self,
//!         process: &GraphProcess,
//!         _node: &Node,
//!         _parents: &[ArcTokenId],
//!     ) -> GuardAction {
//!         if process.env().get("approved") == Some("true") {
//!             GuardAction::Accept
//!         } else {
//!             GuardAction::Defer
//!         }
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::graph::Node;
use crate::process::GraphProcess;
use crate::tokens::NodeToken;
use crate::types::{ArcTokenId, NodeTokenId};

/// Outcome of a node's arrival guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardAction {
    /// Consume the arriving arc tokens into a new node token.
    Accept,
    /// Retire the arriving arc token without a consumer.
    Discard,
    /// Leave the arriving arc token pending.
    Defer,
}

/// What happens to a freshly created node token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrivalOutcome {
    /// Complete the token immediately, firing the outgoing arcs whose
    /// name matches `arc_name` (`None` fires the unnamed arcs).
    Complete { arc_name: Option<String> },
    /// Leave the token active; the host completes it later through
    /// [`Engine::complete_execution`](crate::engine::Engine::complete_execution).
    Wait,
}

impl ArrivalOutcome {
    /// Complete through the default (unnamed) outgoing arcs.
    #[must_use]
    pub fn complete() -> Self {
        Self::Complete { arc_name: None }
    }

    /// Complete through the outgoing arcs named `name`.
    #[must_use]
    pub fn complete_through(name: impl Into<String>) -> Self {
        Self::Complete {
            arc_name: Some(name.into()),
        }
    }

    #[must_use]
    pub fn wait() -> Self {
        Self::Wait
    }
}

/// Per-node policy hooks, implemented by the host.
///
/// All methods have defaults, so the unit implementation of a behavior is
/// a pass-through node: it accepts every arrival and completes through
/// its unnamed outgoing arcs immediately.
pub trait NodeBehavior: Send + Sync {
    /// Decides whether the accumulated parent arc tokens may enter the
    /// node.
    fn evaluate_guard(
        &self,
        _process: &GraphProcess,
        _node: &Node,
        _parents: &[ArcTokenId],
    ) -> GuardAction {
        GuardAction::Accept
    }

    /// Policy query: may this specific token be rewound through this node?
    ///
    /// The default answers the node's static flag; overrides may consult
    /// per-execution state (the token's env, guard action, timestamps).
    fn is_backtrackable(&self, process: &GraphProcess, token: &NodeToken) -> bool {
        process.graph().node(token.node()).backtrackable()
    }

    /// Decides what happens to a node token the moment it is created.
    fn on_arrival(&self, _process: &GraphProcess, _token: NodeTokenId) -> ArrivalOutcome {
        ArrivalOutcome::complete()
    }
}

/// Pass-through behavior: accept, auto-complete, follow the static
/// backtrackable flag.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNodeBehavior;

impl NodeBehavior for DefaultNodeBehavior {}
