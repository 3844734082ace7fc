//! Property tests over arbitrary linear chains.

mod common;
use common::*;

use proptest::prelude::*;
use std::sync::Arc;

use oxbow::engine::Engine;
use oxbow::graph::{Graph, GraphBuilder, NodeSpec};
use oxbow::process::ProcessState;
use oxbow::tokens::ExecutionType;

/// `n0 -> n1 -> ... -> n{len-1}`, `n0` is the start node.
fn chain_of(len: usize) -> Arc<Graph> {
    let mut builder = GraphBuilder::new().add_node(NodeSpec::new("n0").start(true));
    for i in 1..len {
        builder = builder
            .add_node(NodeSpec::new(format!("n{i}")))
            .add_arc(format!("n{}", i - 1), format!("n{i}"));
    }
    Arc::new(builder.build().unwrap())
}

proptest! {
    /// Rewinding any fully executed chain to its head leaves exactly one
    /// live token (at the head node) and folds everything else into
    /// complete, backtracked history.
    #[test]
    fn backtrack_to_head_leaves_one_live_token(len in 1usize..12) {
        let graph = chain_of(len);
        let engine = Engine::new();
        let mut process = engine.start_process(graph).unwrap();
        engine.run(&mut process).unwrap();
        prop_assert_eq!(process.state(), ProcessState::Complete);

        let head = token_at(&process, "n0");
        let revived = engine.backtrack(&mut process, head).unwrap();

        prop_assert_eq!(process.active_node_tokens(), &[revived]);
        prop_assert!(process.active_arc_tokens().is_empty());
        prop_assert!(process.execution_queue().is_empty());

        let revived_token = process.node_token(revived);
        prop_assert_eq!(revived_token.execution_type(), ExecutionType::Forward);
        prop_assert!(!revived_token.is_complete());
        prop_assert_eq!(
            process.graph().node(revived_token.node()).name(),
            "n0"
        );

        for token in process.node_tokens() {
            if token.id() != revived {
                prop_assert!(token.execution_type().is_backtracked());
                prop_assert!(token.is_complete());
            }
        }
        for token in process.arc_tokens() {
            prop_assert!(token.execution_type().is_backtracked());
            prop_assert!(token.is_complete());
        }
    }

    /// Forward execution of a chain is deterministic: one token per node,
    /// all Forward, processed in discovery order.
    #[test]
    fn forward_execution_is_deterministic(len in 1usize..12) {
        let graph = chain_of(len);
        let engine = Engine::new();
        let mut process = engine.start_process(graph).unwrap();
        engine.run(&mut process).unwrap();

        prop_assert_eq!(process.node_tokens().count(), len);
        prop_assert_eq!(process.arc_tokens().count(), len - 1);
        for (i, token) in process.node_tokens().enumerate() {
            prop_assert_eq!(process.graph().node(token.node()).name(), format!("n{i}"));
            prop_assert_eq!(token.execution_type(), ExecutionType::Forward);
            prop_assert!(token.is_complete());
        }
    }
}
