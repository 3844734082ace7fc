//! # Oxbow: Token Workflow Engine with Backtracking
//!
//! Oxbow drives a unit of work (a *process instance*) through a directed
//! graph of nodes and arcs. Each in-flight execution locus is a token:
//! node tokens reside at nodes, arc tokens travel along arcs. The engine
//! advances a process by consuming a FIFO queue of arc tokens (joins,
//! splits and guards included), and the backtracker can rewind any
//! completed region of the execution history into an inert audit trail
//! while producing a new live token to resume from.
//!
//! ## Core Concepts
//!
//! - **Graph**: immutable topology built once and shared by processes
//! - **Tokens**: the mutable execution units, arena-stored per process,
//!   tagged with an [`ExecutionType`](tokens::ExecutionType) encoding
//!   their causal role and live-vs-historical status
//! - **Behaviors**: per-node policy hooks (guards, backtrackability,
//!   arrival handling) implemented by the host
//! - **Backtracking**: a graph-rewind procedure that reconstructs causal
//!   ancestry across splits and joins without rewriting history
//!
//! ## Quick Start
//!
//! ```rust
//! use oxbow::engine::Engine;
//! use oxbow::graph::{GraphBuilder, NodeSpec};
//!
//! // Build: draft -> review -> publish
//! let graph = std::sync::Arc::new(
//!     GraphBuilder::new()
//!         .add_node(NodeSpec::new("draft").start(true))
//!         .add_node(NodeSpec::new("review"))
//!         .add_node(NodeSpec::new("publish"))
//!         .add_arc("draft", "review")
//!         .add_arc("review", "publish")
//!         .build()
//!         .unwrap(),
//! );
//!
//! let engine = Engine::new();
//! let mut process = engine.start_process(graph).unwrap();
//! engine.run(&mut process).unwrap();
//!
//! // Everything ran to completion; rewind to the draft token and the
//! // downstream history becomes inert while a fresh live token appears.
//! let draft = process
//!     .node_tokens()
//!     .find(|t| process.graph().node(t.node()).name() == "draft")
//!     .map(|t| t.id())
//!     .unwrap();
//! let revived = engine.backtrack(&mut process, draft).unwrap();
//! assert!(process.active_node_tokens().contains(&revived));
//! ```
//!
//! ## Execution Model
//!
//! Synchronous and single-threaded per process: guard evaluation and
//! token transitions run to completion before the next queue item, and
//! both the forward queue and the rewind queue are strict FIFO, so
//! replay is deterministic. Independent processes share nothing; host
//! many of them behind [`runtime::ProcessRegistry`]'s lock-per-instance
//! discipline.
//!
//! ## Module Guide
//!
//! - [`graph`] - topology definition and the fluent builder
//! - [`behavior`] - guard/backtrackability/arrival contracts
//! - [`tokens`] - node and arc tokens, execution-type tagging
//! - [`process`] - process instances: arenas, active sets, work queue
//! - [`engine`] - forward execution
//! - [`backtrack`] - frontier computation and the rewind algorithm
//! - [`factory`] - token construction seam
//! - [`env`] - hierarchical key/value scopes
//! - [`persist`] - serde records for state interchange
//! - [`runtime`] - multi-process hosting
//! - [`telemetry`] - tracing subscriber setup

pub mod backtrack;
pub mod behavior;
pub mod engine;
pub mod env;
pub mod factory;
pub mod graph;
pub mod persist;
pub mod process;
pub mod runtime;
pub mod telemetry;
pub mod tokens;
pub mod types;
