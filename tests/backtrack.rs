//! Backtracking integration tests: rewind, re-entry, and atomicity.

mod common;
use common::*;

use std::sync::Arc;

use oxbow::backtrack::{BacktrackError, compute_frontier};
use oxbow::engine::Engine;
use oxbow::graph::{GraphBuilder, NodeSpec};
use oxbow::process::{GraphProcess, ProcessState};
use oxbow::tokens::ExecutionType;

/// Every token carrying a backtracked tag must be complete.
fn assert_backtracked_tokens_complete(process: &GraphProcess) {
    for token in process.node_tokens() {
        if token.execution_type().is_backtracked() {
            assert!(token.is_complete(), "node token {} backtracked but incomplete", token.id());
        }
    }
    for token in process.arc_tokens() {
        if token.execution_type().is_backtracked() {
            assert!(token.is_complete(), "arc token {} backtracked but incomplete", token.id());
        }
    }
}

#[test]
fn linear_chain_rewinds_to_the_head() {
    let engine = Engine::new();
    let mut process = engine.start_process(linear_chain()).unwrap();
    engine.run(&mut process).unwrap();

    let a = token_at(&process, "a");
    let b = token_at(&process, "b");
    let c = token_at(&process, "c");

    let revived = engine.backtrack(&mut process, a).unwrap();

    // One new live Forward token stands in for the destination.
    let new_token = process.node_token(revived);
    assert_eq!(new_token.execution_type(), ExecutionType::Forward);
    assert!(!new_token.is_complete());
    assert_eq!(new_token.node(), process.node_token(a).node());
    assert_eq!(process.active_node_tokens(), &[revived]);
    assert!(process.active_arc_tokens().is_empty());
    assert!(process.execution_queue().is_empty());

    // The old chain is complete, backtracked history.
    for original in [a, b, c] {
        let token = process.node_token(original);
        assert!(token.is_complete());
        assert_eq!(token.execution_type(), ExecutionType::ForwardBacktracked);
    }

    // B and C each gained a Backward replacement folded into history.
    for original in [b, c] {
        let replacement = process.node_token(original).replaced_by().unwrap();
        let token = process.node_token(replacement);
        assert_eq!(token.execution_type(), ExecutionType::BackwardBacktracked);
        assert!(token.is_complete());
    }

    assert_backtracked_tokens_complete(&process);
}

#[test]
fn external_branch_reenters_as_uturn() {
    let engine = Engine::new();
    let mut process = engine.start_process(diamond()).unwrap();
    engine.run(&mut process).unwrap();

    let b = token_at(&process, "b");
    let c = token_at(&process, "c");
    let d = token_at(&process, "d");

    let revived = engine.backtrack(&mut process, b).unwrap();

    // The b branch is rewound: d and its consumed inputs are history.
    assert_eq!(
        process.node_token(d).execution_type(),
        ExecutionType::ForwardBacktracked
    );
    let bd = arc_tokens_between(&process, "b", "d")[0];
    assert_eq!(
        process.arc_token(bd).execution_type(),
        ExecutionType::ForwardBacktracked
    );

    // The c branch's ancestry is untouched history.
    assert_eq!(process.node_token(c).execution_type(), ExecutionType::Forward);
    let ac = arc_tokens_between(&process, "a", "c")[0];
    assert_eq!(process.arc_token(ac).execution_type(), ExecutionType::Forward);

    // The link reconnecting c's branch is a UTurn on the forward queue:
    // new live work, not part of the rewritten history.
    let cd_tokens = arc_tokens_between(&process, "c", "d");
    assert_eq!(cd_tokens.len(), 2);
    let uturn = cd_tokens[1];
    assert_eq!(process.arc_token(uturn).execution_type(), ExecutionType::UTurn);
    assert!(process.arc_token(uturn).is_pending());
    assert!(process.is_arc_token_active(uturn));
    assert_eq!(process.execution_queue().front(), Some(&uturn));

    // Exactly one live token for b's node, one parent per child d had.
    assert_eq!(process.active_node_tokens(), &[revived]);
    assert_eq!(process.node_token(revived).parents().len(), 1);
    assert_backtracked_tokens_complete(&process);
}

#[test]
fn uturn_token_joins_the_resumed_branch() {
    let engine = Engine::new();
    let mut process = engine.start_process(diamond()).unwrap();
    engine.run(&mut process).unwrap();

    let b = token_at(&process, "b");
    let revived = engine.backtrack(&mut process, b).unwrap();

    // Node d hosts the original and its Backward replacement; the UTurn
    // alone cannot satisfy the And-join, so no third token appears yet.
    engine.run(&mut process).unwrap();
    assert_eq!(process.state(), ProcessState::Executing);
    assert_eq!(tokens_at(&process, "d").len(), 2);

    // Completing the revived b token provides the missing input.
    engine.complete_execution(&mut process, revived, None).unwrap();
    engine.run(&mut process).unwrap();

    let d_tokens = tokens_at(&process, "d");
    assert_eq!(d_tokens.len(), 3);
    let new_d = process.node_token(*d_tokens.last().unwrap());
    assert_eq!(new_d.parents().len(), 2);
    assert!(
        new_d
            .parents()
            .iter()
            .any(|&p| process.arc_token(p).execution_type() == ExecutionType::UTurn)
    );
    assert_eq!(process.state(), ProcessState::Complete);
}

#[test]
fn refusal_is_atomic_and_leaves_the_process_untouched() {
    let graph = Arc::new(
        GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .add_node(NodeSpec::new("b"))
            .add_node(NodeSpec::new("c").backtrackable(false))
            .add_arc("a", "b")
            .add_arc("b", "c")
            .build()
            .unwrap(),
    );
    let engine = Engine::new();
    let mut process = engine.start_process(graph).unwrap();
    engine.run(&mut process).unwrap();

    let before = process.to_record();
    let a = token_at(&process, "a");
    let err = engine.backtrack(&mut process, a).unwrap_err();

    assert!(matches!(err, BacktrackError::NotBacktrackable { ref name, .. } if name == "c"));
    assert_eq!(process.to_record(), before);
}

#[test]
fn live_leaves_are_forced_complete() {
    let graph = Arc::new(
        GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .add_node(NodeSpec::new("hold").behavior(WaitNode))
            .add_arc("a", "hold")
            .build()
            .unwrap(),
    );
    let engine = Engine::new();
    let mut process = engine.start_process(graph).unwrap();
    engine.run(&mut process).unwrap();

    let a = token_at(&process, "a");
    let hold = token_at(&process, "hold");
    assert!(!process.node_token(hold).is_complete());

    let revived = engine.backtrack(&mut process, a).unwrap();

    // Live work in progress became retroactively finished history.
    let hold_token = process.node_token(hold);
    assert!(hold_token.is_complete());
    assert_eq!(hold_token.execution_type(), ExecutionType::ForwardBacktracked);
    assert_eq!(process.active_node_tokens(), &[revived]);
    assert_backtracked_tokens_complete(&process);
}

#[test]
fn destination_must_be_completed_live_history() {
    let graph = Arc::new(
        GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .add_node(NodeSpec::new("hold").behavior(WaitNode))
            .add_arc("a", "hold")
            .build()
            .unwrap(),
    );
    let engine = Engine::new();
    let mut process = engine.start_process(graph).unwrap();
    engine.run(&mut process).unwrap();

    // An incomplete token is live, not history.
    let hold = token_at(&process, "hold");
    assert!(matches!(
        engine.backtrack(&mut process, hold),
        Err(BacktrackError::InvalidDestination { .. })
    ));

    // A token already rewound cannot be targeted again.
    let a = token_at(&process, "a");
    engine.backtrack(&mut process, a).unwrap();
    assert!(matches!(
        engine.backtrack(&mut process, a),
        Err(BacktrackError::InvalidDestination { .. })
    ));
}

#[test]
fn execution_resumes_and_may_diverge() {
    let engine = Engine::new();
    let mut process = engine.start_process(linear_chain()).unwrap();
    engine.run(&mut process).unwrap();

    let a = token_at(&process, "a");
    let revived = engine.backtrack(&mut process, a).unwrap();

    engine.complete_execution(&mut process, revived, None).unwrap();
    engine.run(&mut process).unwrap();

    // The chain executed twice end to end.
    assert_eq!(tokens_at(&process, "b").len(), 3); // original, replacement, re-execution
    assert_eq!(process.state(), ProcessState::Complete);

    let reexecuted = *tokens_at(&process, "b").last().unwrap();
    assert_eq!(
        process.node_token(reexecuted).execution_type(),
        ExecutionType::Forward
    );
}

#[test]
fn repeated_backtrack_reuses_folded_links_without_duplication() {
    let engine = Engine::new();
    let mut process = engine.start_process(linear_chain()).unwrap();
    engine.run(&mut process).unwrap();

    let a = token_at(&process, "a");
    let b = token_at(&process, "b");

    // First rewind stops at b; the chain re-executes from there.
    let revived_b = engine.backtrack(&mut process, b).unwrap();
    engine.complete_execution(&mut process, revived_b, None).unwrap();
    engine.run(&mut process).unwrap();
    assert_eq!(process.state(), ProcessState::Complete);

    // Second rewind targets a, above the previously rewound region. The
    // canonical-parent resolution must reuse the folded links instead of
    // reprocessing them.
    let revived_a = engine.backtrack(&mut process, a).unwrap();

    assert_eq!(process.active_node_tokens(), &[revived_a]);
    assert_eq!(process.node_token(revived_a).parents().len(), 1);
    assert_eq!(process.state(), ProcessState::Executing);

    // No duplicate replacement was created for the original a->b link:
    // the only tokens on that arc are the original and one Backward
    // bookkeeping token.
    let ab_tokens = arc_tokens_between(&process, "a", "b");
    assert_eq!(ab_tokens.len(), 2);
    assert_eq!(
        process.arc_token(ab_tokens[0]).execution_type(),
        ExecutionType::ForwardBacktracked
    );
    assert_eq!(
        process.arc_token(ab_tokens[1]).execution_type(),
        ExecutionType::BackwardBacktracked
    );

    // Everything but the revived token is inert, completed history.
    for token in process.node_tokens() {
        if token.id() != revived_a {
            assert!(token.execution_type().is_backtracked());
        }
    }
    assert_backtracked_tokens_complete(&process);
}

#[test]
fn replacement_parent_count_matches_destination_children() {
    let graph = Arc::new(
        GraphBuilder::new()
            .add_node(NodeSpec::new("a").start(true))
            .add_node(NodeSpec::new("b"))
            .add_node(NodeSpec::new("c"))
            .add_arc("a", "b")
            .add_arc("a", "c")
            .build()
            .unwrap(),
    );
    let engine = Engine::new();
    let mut process = engine.start_process(graph).unwrap();
    engine.run(&mut process).unwrap();

    let a = token_at(&process, "a");
    let children = process.node_token(a).children().len();
    assert_eq!(children, 2);

    let revived = engine.backtrack(&mut process, a).unwrap();
    assert_eq!(process.node_token(revived).parents().len(), children);
    assert_backtracked_tokens_complete(&process);
}

#[test]
fn replacement_inherits_the_destination_env() {
    let engine = Engine::new();
    let mut process = engine.start_process(linear_chain()).unwrap();
    engine.run(&mut process).unwrap();

    let a = token_at(&process, "a");
    process.token_env_mut(a).set("attempt", "1");

    let revived = engine.backtrack(&mut process, a).unwrap();
    assert_eq!(process.node_token(revived).env().get("attempt"), Some("1"));
}

#[test]
fn frontier_computation_alone_mutates_nothing() {
    let engine = Engine::new();
    let mut process = engine.start_process(linear_chain()).unwrap();
    engine.run(&mut process).unwrap();

    let before = process.to_record();
    let a = token_at(&process, "a");
    let frontier = compute_frontier(&process, a).unwrap();
    assert_eq!(frontier.visited_len(), 3);
    assert_eq!(frontier.leaf_node_tokens().len(), 1);

    // The caller aborts; nothing changed.
    drop(frontier);
    assert_eq!(process.to_record(), before);
}
