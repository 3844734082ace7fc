//! Backtracking: rewinding completed history into an inert audit trail.
//!
//! Given a destination node token `D` somewhere in completed history, the
//! backtracker reverts every token causally downstream of `D` to a
//! backtracked, audit-only state and produces a brand-new live node token
//! standing in for `D`, from which forward execution resumes (possibly
//! diverging differently this time). Prior history is never deleted and
//! its meaning is never rewritten.
//!
//! The operation runs in two phases:
//!
//! 1. [`compute_frontier`] walks the token DAG forward from `D` and
//!    validates that every visited node accepts backtracking. This phase
//!    mutates nothing, so a policy refusal leaves the process untouched
//!    (all-or-nothing).
//! 2. [`BacktrackVisitor::rewind`] performs the rewind over a FIFO work
//!    queue in discovery order, distinguishing internal branches (kept
//!    unwinding with Backward bookkeeping tokens) from branches whose
//!    ancestry lies outside the rewound region (reconnected with UTurn
//!    tokens that re-enter the forward queue as new live work).
//!
//! Joins and splits mean "downstream of `D`" is a DAG region, not a
//! path. The canonical-parent resolution skips links already folded into
//! a prior replacement chain, which is what keeps repeated backtracks
//! from duplicating work or corrupting ancestry.
//!
//! Hosts normally reach this module through
//! [`Engine::backtrack`](crate::engine::Engine::backtrack).

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use thiserror::Error;

use crate::factory::TokenFactory;
use crate::process::GraphProcess;
use crate::tokens::{ExecutionType, TokenStateError};
use crate::types::{ArcTokenId, NodeId, NodeTokenId};

/// Errors raised by a backtrack attempt.
///
/// Policy violations are detected before any mutation; consistency
/// violations abort the rewind mid-flight and must be surfaced by the
/// caller; there is no partial-success result.
#[derive(Debug, Error, Diagnostic)]
pub enum BacktrackError {
    /// A node in the frontier refuses backtracking for its token.
    #[error("cannot backtrack node {name} (id: {node})")]
    #[diagnostic(
        code(oxbow::backtrack::not_backtrackable),
        help("Every node between the destination and the frontier must be backtrackable.")
    )]
    NotBacktrackable { name: String, node: NodeId },

    /// The destination is not completed, live history.
    #[error("destination token {token} is not completed live history")]
    #[diagnostic(
        code(oxbow::backtrack::invalid_destination),
        help("Backtrack targets a completed node token that has not itself been backtracked.")
    )]
    InvalidDestination { token: NodeTokenId },

    /// A mapping entry expected during the rewind was never recorded.
    #[error("no replacement mapping recorded for arc token {arc_token}")]
    #[diagnostic(code(oxbow::backtrack::missing_mapping))]
    MissingMapping { arc_token: ArcTokenId },

    /// The work queue drained without ever reaching the destination.
    #[error("destination token {token} was never reached by the rewind")]
    #[diagnostic(code(oxbow::backtrack::destination_not_reached))]
    DestinationNotReached { token: NodeTokenId },

    /// A token state transition broke an invariant mid-rewind.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Token(#[from] TokenStateError),
}

/// The validated region downstream of a backtrack destination.
///
/// Holds the visited node-token set plus the active leaves, in discovery
/// order: node tokens with no children yet and arc tokens with no
/// consumer yet. Computing a frontier performs no mutation, so a caller
/// may compute one and then abandon the operation entirely.
#[derive(Debug)]
pub struct Frontier {
    visited: FxHashSet<NodeTokenId>,
    leaf_node_tokens: Vec<NodeTokenId>,
    leaf_arc_tokens: Vec<ArcTokenId>,
}

impl Frontier {
    #[must_use]
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    #[must_use]
    pub fn leaf_node_tokens(&self) -> &[NodeTokenId] {
        &self.leaf_node_tokens
    }

    #[must_use]
    pub fn leaf_arc_tokens(&self) -> &[ArcTokenId] {
        &self.leaf_arc_tokens
    }
}

/// Walks the token DAG forward from `destination`, validating
/// backtrackability for every node token it visits.
///
/// Traversal follows child links and, for tokens replaced by an earlier
/// rewind, the replacement back-link. That is how re-executions spawned
/// by a previous, deeper backtrack are found and unwound when a higher
/// ancestor is targeted later.
///
/// # Errors
///
/// - [`BacktrackError::InvalidDestination`]: the destination is
///   incomplete or already backtracked
/// - [`BacktrackError::NotBacktrackable`]: some visited node's behavior
///   refuses the rewind; the process is untouched
pub fn compute_frontier(
    process: &GraphProcess,
    destination: NodeTokenId,
) -> Result<Frontier, BacktrackError> {
    let dest = process.node_token(destination);
    if !dest.is_complete() || dest.execution_type().is_backtracked() {
        return Err(BacktrackError::InvalidDestination { token: destination });
    }

    let graph = process.graph_handle();
    let mut visited = FxHashSet::default();
    let mut leaf_node_tokens = Vec::new();
    let mut leaf_arc_tokens = Vec::new();
    let mut seen_arc_leaves = FxHashSet::default();
    let mut queue = VecDeque::from([destination]);
    let mut seen = FxHashSet::from_iter([destination]);

    while let Some(id) = queue.pop_front() {
        let token = process.node_token(id);
        let node = graph.node(token.node());
        if !node.behavior().is_backtrackable(process, token) {
            return Err(BacktrackError::NotBacktrackable {
                name: node.name().to_string(),
                node: node.id(),
            });
        }
        visited.insert(id);

        if token.children().is_empty() {
            leaf_node_tokens.push(id);
        }
        for &child in token.children() {
            let arc_token = process.arc_token(child);
            match arc_token.child() {
                None => {
                    if seen_arc_leaves.insert(child) {
                        leaf_arc_tokens.push(child);
                    }
                }
                Some(consumer) => {
                    if seen.insert(consumer) {
                        queue.push_back(consumer);
                    }
                }
            }
        }
        if let Some(replacement) = token.replaced_by() {
            if seen.insert(replacement) {
                queue.push_back(replacement);
            }
        }
    }

    Ok(Frontier {
        visited,
        leaf_node_tokens,
        leaf_arc_tokens,
    })
}

/// Executes the rewind over a validated [`Frontier`].
///
/// Consumes the visitor; a visitor performs exactly one rewind.
pub struct BacktrackVisitor<'a> {
    factory: &'a dyn TokenFactory,
    destination: NodeTokenId,
    frontier: Frontier,
    queue: VecDeque<NodeTokenId>,
    queued: FxHashSet<NodeTokenId>,
    canonicalized: FxHashSet<NodeTokenId>,
    arc_token_map: FxHashMap<ArcTokenId, ArcTokenId>,
}

impl<'a> BacktrackVisitor<'a> {
    #[must_use]
    pub fn new(
        factory: &'a dyn TokenFactory,
        destination: NodeTokenId,
        frontier: Frontier,
    ) -> Self {
        Self {
            factory,
            destination,
            frontier,
            queue: VecDeque::new(),
            queued: FxHashSet::default(),
            canonicalized: FxHashSet::default(),
            arc_token_map: FxHashMap::default(),
        }
    }

    /// Runs the rewind and returns the new live node token for the
    /// destination's node.
    pub fn rewind(mut self, process: &mut GraphProcess) -> Result<NodeTokenId, BacktrackError> {
        let leaves: Vec<NodeTokenId> = self.frontier.leaf_node_tokens.clone();
        for token in leaves {
            self.enqueue(token);
        }
        self.seed_leaf_arc_tokens(process)?;

        let mut result = None;
        while let Some(token) = self.queue.pop_front() {
            if token == self.destination {
                // Terminal case: every child mapping must exist before the
                // replacement can be assembled, so the destination waits
                // until it is the only remaining work.
                if !self.queue.is_empty() {
                    self.queue.push_back(token);
                    continue;
                }
                result = Some(self.replace_completed_token(
                    process,
                    token,
                    ExecutionType::Forward,
                )?);
            } else {
                self.fold_into_history(process, token)?;
            }
        }

        result.ok_or(BacktrackError::DestinationNotReached {
            token: self.destination,
        })
    }

    fn enqueue(&mut self, token: NodeTokenId) {
        if self.queued.insert(token) {
            self.queue.push_back(token);
        }
    }

    /// Seeds the rewind: each pending leaf arc token maps to itself until
    /// superseded, is marked backtracked, retires from the active set,
    /// and enqueues its producer.
    fn seed_leaf_arc_tokens(&mut self, process: &mut GraphProcess) -> Result<(), BacktrackError> {
        let leaves: Vec<ArcTokenId> = self.frontier.leaf_arc_tokens.clone();
        for token in leaves {
            self.arc_token_map.insert(token, token);
            process.arc_token_mut(token).mark_backtracked()?;
            let parent = process.arc_token(token).parent();
            self.enqueue(parent);
            process.remove_active_arc_token(token);
        }
        Ok(())
    }

    /// Builds the replacement node token for a completed original:
    /// its parents are the replacements recorded for the original's
    /// children, in the same order, and each is completed with the new
    /// token as consumer.
    fn replace_completed_token(
        &mut self,
        process: &mut GraphProcess,
        token: NodeTokenId,
        execution_type: ExecutionType,
    ) -> Result<NodeTokenId, BacktrackError> {
        process.node_token_mut(token).mark_backtracked()?;

        let children: Vec<ArcTokenId> = process.node_token(token).children().to_vec();
        let mut parents = Vec::with_capacity(children.len());
        for child in children {
            let mapped = self
                .arc_token_map
                .get(&child)
                .copied()
                .ok_or(BacktrackError::MissingMapping { arc_token: child })?;
            parents.push(mapped);
        }

        let node = process.node_token(token).node();
        let replacement = self.factory.new_node_token(
            process,
            node,
            execution_type,
            parents.clone(),
            Some(token),
        );
        for parent in parents {
            process.arc_token_mut(parent).mark_complete(replacement)?;
        }
        Ok(replacement)
    }

    /// Folds a non-destination node token into history and unwinds its
    /// canonical parents.
    fn fold_into_history(
        &mut self,
        process: &mut GraphProcess,
        token: NodeTokenId,
    ) -> Result<(), BacktrackError> {
        let (is_complete, is_backtracked) = {
            let t = process.node_token(token);
            (t.is_complete(), t.execution_type().is_backtracked())
        };

        let representative = if !is_complete {
            // Live work in progress becomes retroactively finished.
            process.node_token_mut(token).mark_complete()?;
            process.node_token_mut(token).mark_backtracked()?;
            process.remove_active_node_token(token);
            token
        } else if !is_backtracked {
            let replacement =
                self.replace_completed_token(process, token, ExecutionType::Backward)?;
            process.node_token_mut(replacement).mark_backtracked()?;
            process.node_token_mut(replacement).mark_complete()?;
            replacement
        } else {
            // Already folded by an earlier rewind; only its ancestry still
            // needs reconnecting.
            token
        };

        let (terminal, parents) = self.canonical_parents(process, token);
        if !self.canonicalized.insert(terminal) {
            return Ok(());
        }

        for parent in parents {
            let (arc, producer) = {
                let at = process.arc_token(parent);
                (at.arc(), at.parent())
            };
            let internal = self.frontier.visited.contains(&producer);
            process.arc_token_mut(parent).mark_backtracked()?;

            let execution_type = if internal {
                ExecutionType::Backward
            } else {
                ExecutionType::UTurn
            };
            let replacement_arc =
                self.factory
                    .new_arc_token(process, arc, execution_type, representative);
            process
                .node_token_mut(representative)
                .push_child(replacement_arc);
            self.arc_token_map.insert(parent, replacement_arc);

            if internal {
                process.arc_token_mut(replacement_arc).mark_backtracked()?;
                self.enqueue(producer);
                process.arc_token_mut(replacement_arc).mark_processed();
            } else {
                // This branch originates outside the rewound region: the
                // new token re-enters normal forward processing and the
                // producer's ancestry is left untouched.
                tracing::debug!(
                    process = %process.id(),
                    token = %replacement_arc,
                    "uturn re-entry"
                );
                process.add_active_arc_token(replacement_arc);
                process.enqueue_arc_token_for_execution(replacement_arc);
            }
        }
        Ok(())
    }

    /// Resolves a token's canonical parent list: while the token is
    /// reached through a singleton parent arc token that is already
    /// backtracked, substitute the arc token's producer, until a node
    /// with an empty parent list or a non-backtracked parent chain is
    /// found.
    fn canonical_parents(
        &self,
        process: &GraphProcess,
        mut token: NodeTokenId,
    ) -> (NodeTokenId, Vec<ArcTokenId>) {
        loop {
            let parents = process.node_token(token).parents();
            match parents.first() {
                None => return (token, Vec::new()),
                Some(&first) if !process.arc_token(first).execution_type().is_backtracked() => {
                    return (token, parents.to_vec());
                }
                Some(&first) => token = process.arc_token(first).parent(),
            }
        }
    }
}
