//! Hosting many processes: the lock-per-instance discipline.
//!
//! Independent processes share no mutable state and may execute fully in
//! parallel, but each process admits only one logical operation at a
//! time. [`ProcessRegistry`] encodes that contract directly: every
//! process sits behind its own `parking_lot::Mutex`, so a host can hand
//! out handles across threads and let the per-instance lock serialize
//! access.
//!
//! # Examples
//!
//! ```rust
//! use oxbow::engine::Engine;
//! use oxbow::graph::{GraphBuilder, NodeSpec};
//! use oxbow::runtime::ProcessRegistry;
//!
//! let graph = std::sync::Arc::new(
//!     GraphBuilder::new()
//!         .add_node(NodeSpec::new("step").start(true))
//!         .build()
//!         .unwrap(),
//! );
//! let engine = Engine::new();
//! let mut registry = ProcessRegistry::new();
//!
//! let id = registry.insert(engine.start_process(graph).unwrap());
//! let state = registry.with_process(id, |process| process.state());
//! assert!(state.is_some());
//! ```

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::process::GraphProcess;
use crate::types::ProcessId;

/// Shared handle to one process instance.
pub type ProcessHandle = Arc<Mutex<GraphProcess>>;

/// Owns the processes a host is currently executing, one lock per
/// instance.
#[derive(Default)]
pub struct ProcessRegistry {
    processes: FxHashMap<ProcessId, ProcessHandle>,
}

impl ProcessRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a process, returning its id.
    pub fn insert(&mut self, process: GraphProcess) -> ProcessId {
        let id = process.id();
        self.processes.insert(id, Arc::new(Mutex::new(process)));
        id
    }

    /// A cloneable handle to a registered process.
    #[must_use]
    pub fn handle(&self, id: ProcessId) -> Option<ProcessHandle> {
        self.processes.get(&id).cloned()
    }

    /// Runs one logical operation against a process under its lock.
    pub fn with_process<R>(
        &self,
        id: ProcessId,
        op: impl FnOnce(&mut GraphProcess) -> R,
    ) -> Option<R> {
        let handle = self.processes.get(&id)?;
        let mut process = handle.lock();
        Some(op(&mut process))
    }

    /// Drops a process from the registry. Outstanding handles keep the
    /// instance alive; archival is the host's concern.
    pub fn remove(&mut self, id: ProcessId) -> Option<ProcessHandle> {
        self.processes.remove(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::graph::{GraphBuilder, NodeSpec};
    use crate::process::ProcessState;

    fn graph() -> std::sync::Arc<crate::graph::Graph> {
        std::sync::Arc::new(
            GraphBuilder::new()
                .add_node(NodeSpec::new("solo").start(true))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn independent_processes_run_in_parallel() {
        let engine = Arc::new(Engine::new());
        let mut registry = ProcessRegistry::new();
        let a = registry.insert(engine.start_process(graph()).unwrap());
        let b = registry.insert(engine.start_process(graph()).unwrap());
        assert_eq!(registry.len(), 2);

        let registry = Arc::new(registry);
        let handles: Vec<_> = [a, b]
            .into_iter()
            .map(|id| {
                let registry = Arc::clone(&registry);
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    registry.with_process(id, |process| {
                        engine.run(process).unwrap();
                        process.state()
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(ProcessState::Complete));
        }
    }

    #[test]
    fn remove_returns_the_handle() {
        let engine = Engine::new();
        let mut registry = ProcessRegistry::new();
        let id = registry.insert(engine.start_process(graph()).unwrap());
        assert!(registry.remove(id).is_some());
        assert!(registry.handle(id).is_none());
        assert!(registry.is_empty());
    }
}
