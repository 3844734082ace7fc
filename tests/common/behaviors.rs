//! Node behaviors shared by the integration suites.

use oxbow::behavior::{ArrivalOutcome, GuardAction, NodeBehavior};
use oxbow::graph::Node;
use oxbow::process::GraphProcess;
use oxbow::types::{ArcTokenId, NodeTokenId};

/// Leaves every arriving token active until the host completes it.
pub struct WaitNode;

impl NodeBehavior for WaitNode {
    fn on_arrival(&self, _process: &GraphProcess, _token: NodeTokenId) -> ArrivalOutcome {
        ArrivalOutcome::wait()
    }
}

/// Completes through a fixed named arc.
pub struct ChooseArc(pub &'static str);

impl NodeBehavior for ChooseArc {
    fn on_arrival(&self, _process: &GraphProcess, _token: NodeTokenId) -> ArrivalOutcome {
        ArrivalOutcome::complete_through(self.0)
    }
}

/// Defers arrivals until the process env sets `key` to `"true"`.
pub struct EnvGate {
    pub key: &'static str,
}

impl NodeBehavior for EnvGate {
    fn evaluate_guard(
        &self,
        process: &GraphProcess,
        _node: &Node,
        _parents: &[ArcTokenId],
    ) -> GuardAction {
        if process.env().get(self.key) == Some("true") {
            GuardAction::Accept
        } else {
            GuardAction::Defer
        }
    }
}

/// Discards every arrival.
pub struct DiscardAll;

impl NodeBehavior for DiscardAll {
    fn evaluate_guard(
        &self,
        _process: &GraphProcess,
        _node: &Node,
        _parents: &[ArcTokenId],
    ) -> GuardAction {
        GuardAction::Discard
    }
}
