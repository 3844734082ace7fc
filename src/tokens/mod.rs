//! Token model: the mutable units of execution.
//!
//! Two token kinds mark the loci of execution in a process:
//!
//! - [`NodeToken`]: a unit of execution resident at a node
//! - [`ArcToken`]: a unit of execution traveling along an arc
//!
//! Both carry an [`ExecutionType`] tag encoding their causal role
//! (forward work, rewind bookkeeping, or a re-entry turn) and whether they
//! are live or inert history. Tokens live in per-process arenas and refer
//! to each other by id; see [`crate::process::GraphProcess`].
//!
//! State transitions are strict: completing a token twice, or applying the
//! backtracked transition to a token that already carries a backtracked
//! tag, is a [`TokenStateError`]: a programming-error class that callers
//! must surface, never swallow.

mod arc_token;
mod execution_type;
mod node_token;

pub use arc_token::ArcToken;
pub use execution_type::ExecutionType;
pub use node_token::NodeToken;

use miette::Diagnostic;
use thiserror::Error;

use crate::types::{ArcTokenId, NodeTokenId};

/// Consistency violations raised by token state transitions.
///
/// These indicate a broken internal invariant rather than a recoverable
/// condition; an operation that hits one fails as a whole.
#[derive(Debug, Error, Diagnostic)]
pub enum TokenStateError {
    /// A node token's completion timestamp was set a second time.
    #[error("node token {token} is already complete")]
    #[diagnostic(
        code(oxbow::tokens::node_double_completion),
        help("A token is completed exactly once; check the caller's bookkeeping.")
    )]
    NodeAlreadyComplete { token: NodeTokenId },

    /// An arc token was completed (assigned a consumer) a second time.
    #[error("arc token {token} is already complete")]
    #[diagnostic(code(oxbow::tokens::arc_double_completion))]
    ArcAlreadyComplete { token: ArcTokenId },

    /// No backtracked counterpart is defined for this transition input.
    ///
    /// Raised when the input execution type already carries a backtracked
    /// tag; the mapping is exhaustive for live types and refuses to guess
    /// for anything else.
    #[error("no backtracked counterpart for execution type {from} (complete: {is_complete})")]
    #[diagnostic(
        code(oxbow::tokens::undefined_transition),
        help("Only Forward, Backward and UTurn tokens can be marked backtracked.")
    )]
    UndefinedTransition {
        from: ExecutionType,
        is_complete: bool,
    },
}
