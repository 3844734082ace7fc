//! Serde record types for process and graph state.
//!
//! The records here are the interoperability schema: plain field sets a
//! storage backend (or a test) can serialize with any serde format. A
//! [`ProcessRecord`] captures everything a [`GraphProcess`] owns
//! (arenas, active sets, queue, env, lifecycle state) and
//! [`GraphProcess::from_record`] reconstructs an identical process over
//! the same graph, validating every id on the way in.
//!
//! ```rust
//! use oxbow::engine::Engine;
//! use oxbow::graph::{GraphBuilder, NodeSpec};
//! use oxbow::process::GraphProcess;
//!
//! let graph = std::sync::Arc::new(
//!     GraphBuilder::new()
//!         .add_node(NodeSpec::new("only").start(true))
//!         .build()
//!         .unwrap(),
//! );
//! let engine = Engine::new();
//! let process = engine.start_process(graph.clone()).unwrap();
//!
//! let record = process.to_record();
//! let json = serde_json::to_string(&record).unwrap();
//! let restored = GraphProcess::from_record(graph, serde_json::from_str(&json).unwrap()).unwrap();
//! assert_eq!(restored.to_record(), process.to_record());
//! ```

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

use crate::behavior::GuardAction;
use crate::env::MapEnv;
use crate::graph::Graph;
use crate::process::{GraphProcess, ProcessState};
use crate::tokens::{ArcToken, ExecutionType, NodeToken};
use crate::types::{ArcId, ArcTokenId, NodeId, NodeTokenId, ProcessId};

/// Persisted form of a graph node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub name: String,
    pub backtrackable: bool,
}

/// Persisted form of a graph arc.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcRecord {
    pub id: ArcId,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    pub name: Option<String>,
}

/// Persisted form of a node token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTokenRecord {
    pub id: NodeTokenId,
    pub node_id: NodeId,
    pub process_id: ProcessId,
    pub execution_type: ExecutionType,
    pub create_time: DateTime<Utc>,
    pub complete_time: Option<DateTime<Utc>>,
    pub guard_action: Option<GuardAction>,
    pub parents: Vec<ArcTokenId>,
    pub children: Vec<ArcTokenId>,
    pub replaced_by: Option<NodeTokenId>,
    pub env: MapEnv,
}

/// Persisted form of an arc token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcTokenRecord {
    pub id: ArcTokenId,
    pub arc_id: ArcId,
    pub process_id: ProcessId,
    pub parent_token_id: NodeTokenId,
    pub child_token_id: Option<NodeTokenId>,
    pub execution_type: ExecutionType,
    pub complete_time: Option<DateTime<Utc>>,
    pub processed: bool,
}

/// Persisted form of a whole process instance (minus its graph, which the
/// caller supplies on restore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: ProcessId,
    pub state: ProcessState,
    pub env: MapEnv,
    pub node_tokens: Vec<NodeTokenRecord>,
    pub arc_tokens: Vec<ArcTokenRecord>,
    pub active_node_tokens: Vec<NodeTokenId>,
    pub active_arc_tokens: Vec<ArcTokenId>,
    pub execution_queue: Vec<ArcTokenId>,
}

/// Problems found while reconstructing a process from a record.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistError {
    /// Token records must be dense and in id order.
    #[error("token record at position {position} carries id {id}")]
    #[diagnostic(code(oxbow::persist::record_out_of_order))]
    RecordOutOfOrder { position: usize, id: u32 },

    /// A token references a node the supplied graph does not have.
    #[error("record references unknown node {node}")]
    #[diagnostic(code(oxbow::persist::unknown_node))]
    UnknownNode { node: NodeId },

    /// A token references an arc the supplied graph does not have.
    #[error("record references unknown arc {arc}")]
    #[diagnostic(code(oxbow::persist::unknown_arc))]
    UnknownArc { arc: ArcId },

    /// A token, active-set entry or queue entry references a token id
    /// outside the record's arenas.
    #[error("record references unknown token id {id}")]
    #[diagnostic(code(oxbow::persist::dangling_token))]
    DanglingToken { id: u32 },

    /// A token record belongs to a different process.
    #[error("token record belongs to process {found}, expected {expected}")]
    #[diagnostic(code(oxbow::persist::process_mismatch))]
    ProcessMismatch {
        expected: ProcessId,
        found: ProcessId,
    },
}

/// Extracts the persisted node table of a graph.
#[must_use]
pub fn node_records(graph: &Graph) -> Vec<NodeRecord> {
    graph
        .nodes()
        .map(|n| NodeRecord {
            id: n.id(),
            name: n.name().to_string(),
            backtrackable: n.backtrackable(),
        })
        .collect()
}

/// Extracts the persisted arc table of a graph.
#[must_use]
pub fn arc_records(graph: &Graph) -> Vec<ArcRecord> {
    graph
        .arcs()
        .map(|a| ArcRecord {
            id: a.id(),
            from_node_id: a.from(),
            to_node_id: a.to(),
            name: a.name().map(str::to_string),
        })
        .collect()
}

impl GraphProcess {
    /// Captures this process's full state as a serde record.
    #[must_use]
    pub fn to_record(&self) -> ProcessRecord {
        ProcessRecord {
            id: self.id(),
            state: self.state(),
            env: self.env().clone(),
            node_tokens: self
                .node_tokens()
                .map(|t| NodeTokenRecord {
                    id: t.id(),
                    node_id: t.node(),
                    process_id: t.process(),
                    execution_type: t.execution_type(),
                    create_time: t.created_at(),
                    complete_time: t.completed_at(),
                    guard_action: t.guard_action(),
                    parents: t.parents().to_vec(),
                    children: t.children().to_vec(),
                    replaced_by: t.replaced_by(),
                    env: t.env().clone(),
                })
                .collect(),
            arc_tokens: self
                .arc_tokens()
                .map(|t| ArcTokenRecord {
                    id: t.id(),
                    arc_id: t.arc(),
                    process_id: t.process(),
                    parent_token_id: t.parent(),
                    child_token_id: t.child(),
                    execution_type: t.execution_type(),
                    complete_time: t.completed_at(),
                    processed: t.is_processed(),
                })
                .collect(),
            active_node_tokens: self.active_node_tokens().to_vec(),
            active_arc_tokens: self.active_arc_tokens().to_vec(),
            execution_queue: self.execution_queue().iter().copied().collect(),
        }
    }

    /// Reconstructs a process from a record over the graph it was
    /// captured against.
    ///
    /// Every id in the record is validated against the graph and the
    /// record's own arenas before anything is built.
    pub fn from_record(
        graph: std::sync::Arc<Graph>,
        record: ProcessRecord,
    ) -> Result<GraphProcess, PersistError> {
        let node_token_count = record.node_tokens.len();
        let arc_token_count = record.arc_tokens.len();

        let check_node_token = |id: NodeTokenId| -> Result<(), PersistError> {
            if id.index() < node_token_count {
                Ok(())
            } else {
                Err(PersistError::DanglingToken { id: id.0 })
            }
        };
        let check_arc_token = |id: ArcTokenId| -> Result<(), PersistError> {
            if id.index() < arc_token_count {
                Ok(())
            } else {
                Err(PersistError::DanglingToken { id: id.0 })
            }
        };

        let mut node_tokens = Vec::with_capacity(node_token_count);
        for (position, rec) in record.node_tokens.into_iter().enumerate() {
            if rec.id.index() != position {
                return Err(PersistError::RecordOutOfOrder {
                    position,
                    id: rec.id.0,
                });
            }
            if rec.process_id != record.id {
                return Err(PersistError::ProcessMismatch {
                    expected: record.id,
                    found: rec.process_id,
                });
            }
            if rec.node_id.index() >= graph.node_count() {
                return Err(PersistError::UnknownNode { node: rec.node_id });
            }
            for &p in &rec.parents {
                check_arc_token(p)?;
            }
            for &c in &rec.children {
                check_arc_token(c)?;
            }
            if let Some(r) = rec.replaced_by {
                if r.index() >= node_token_count {
                    return Err(PersistError::DanglingToken { id: r.0 });
                }
            }
            node_tokens.push(NodeToken::from_parts(
                rec.id,
                rec.node_id,
                rec.process_id,
                rec.execution_type,
                rec.create_time,
                rec.complete_time,
                rec.guard_action,
                rec.parents,
                rec.children,
                rec.replaced_by,
                rec.env,
            ));
        }

        let mut arc_tokens = Vec::with_capacity(arc_token_count);
        for (position, rec) in record.arc_tokens.into_iter().enumerate() {
            if rec.id.index() != position {
                return Err(PersistError::RecordOutOfOrder {
                    position,
                    id: rec.id.0,
                });
            }
            if rec.process_id != record.id {
                return Err(PersistError::ProcessMismatch {
                    expected: record.id,
                    found: rec.process_id,
                });
            }
            if rec.arc_id.index() >= graph.arc_count() {
                return Err(PersistError::UnknownArc { arc: rec.arc_id });
            }
            check_node_token(rec.parent_token_id)?;
            if let Some(c) = rec.child_token_id {
                check_node_token(c)?;
            }
            arc_tokens.push(ArcToken::from_parts(
                rec.id,
                rec.arc_id,
                rec.process_id,
                rec.execution_type,
                rec.complete_time,
                rec.parent_token_id,
                rec.child_token_id,
                rec.processed,
            ));
        }

        for &t in &record.active_node_tokens {
            check_node_token(t)?;
        }
        for &t in &record.active_arc_tokens {
            check_arc_token(t)?;
        }
        for &t in &record.execution_queue {
            check_arc_token(t)?;
        }

        Ok(GraphProcess::from_parts(
            record.id,
            graph,
            record.env,
            node_tokens,
            arc_tokens,
            record.active_node_tokens,
            record.active_arc_tokens,
            VecDeque::from(record.execution_queue),
            record.state,
        ))
    }
}
