//! Token construction, behind a single injectable seam.
//!
//! Both forward execution and the backtracker construct tokens through a
//! [`TokenFactory`], guaranteeing identical identity and timestamp
//! semantics regardless of which side is creating them. The engine holds
//! its factory by explicit injection: pass one to
//! [`Engine::with_factory`](crate::engine::Engine::with_factory) or use
//! the in-memory default.

use chrono::Utc;

use crate::env::MapEnv;
use crate::process::GraphProcess;
use crate::tokens::{ArcToken, ExecutionType, NodeToken};
use crate::types::{ArcId, ArcTokenId, NodeId, NodeTokenId};

/// Constructs tokens into a process's arenas.
///
/// `predecessor` is the historical token a replacement stands in for
/// during a rewind: the factory carries its environment onto the new
/// token and records the replacement back-link on it. Forward execution
/// passes `None`.
pub trait TokenFactory: Send + Sync {
    /// Creates a node token resident at `node`.
    fn new_node_token(
        &self,
        process: &mut GraphProcess,
        node: NodeId,
        execution_type: ExecutionType,
        parents: Vec<ArcTokenId>,
        predecessor: Option<NodeTokenId>,
    ) -> NodeTokenId;

    /// Creates an arc token traveling along `arc`, produced by `parent`.
    fn new_arc_token(
        &self,
        process: &mut GraphProcess,
        arc: ArcId,
        execution_type: ExecutionType,
        parent: NodeTokenId,
    ) -> ArcTokenId;
}

/// Default in-memory factory: dense arena ids, `Utc::now()` timestamps.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemTokenFactory;

impl TokenFactory for MemTokenFactory {
    fn new_node_token(
        &self,
        process: &mut GraphProcess,
        node: NodeId,
        execution_type: ExecutionType,
        parents: Vec<ArcTokenId>,
        predecessor: Option<NodeTokenId>,
    ) -> NodeTokenId {
        let id = process.next_node_token_id();
        let env = match predecessor {
            Some(p) => process.node_token(p).env().clone(),
            None => MapEnv::new(),
        };
        let token = NodeToken::new(
            id,
            node,
            process.id(),
            execution_type,
            parents,
            Utc::now(),
            env,
        );
        process.insert_node_token(token);
        if let Some(p) = predecessor {
            process.node_token_mut(p).set_replaced_by(id);
        }
        tracing::debug!(process = %process.id(), token = %id, node = %node, execution_type = %execution_type, "new node token");
        id
    }

    fn new_arc_token(
        &self,
        process: &mut GraphProcess,
        arc: ArcId,
        execution_type: ExecutionType,
        parent: NodeTokenId,
    ) -> ArcTokenId {
        let id = process.next_arc_token_id();
        let token = ArcToken::new(id, arc, process.id(), execution_type, parent);
        process.insert_arc_token(token);
        tracing::debug!(process = %process.id(), token = %id, arc = %arc, execution_type = %execution_type, "new arc token");
        id
    }
}
