//! Two-phase chain message router.
//!
//! ## Phases
//!
//! - **Toward head.** While the message carries the `launch:` marker it is
//!   relayed to the predecessor on the chain input slot, without being
//!   handled. The node with no chain predecessor is the head; the marker is
//!   dropped there.
//! - **Toward tail.** The message is handled locally, then passed to every
//!   successor on the chain output slot in link order. Each controller
//!   handles it at most once per pass.
//!
//! ## Termination
//!
//! A visited set is threaded through both phases. Walking back into any
//! node already on the walk (or into the sender) is a cycle: the traversal
//! is aborted with a warning and nothing is delivered. Forward revisits are
//! skipped.

use std::collections::BTreeSet;

use style_chain_core::{HostGraph, NodeId};
use tracing::{debug, trace, warn};

use crate::config::SyncConfig;
use crate::controller::{Delivery, Effects, NodeController};
use crate::message::ChainMessage;
use crate::registry::ControllerRegistry;

/// Outcome of routing one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteReport {
    /// Node where the message turned tail-ward.
    pub head: Option<NodeId>,
    /// Handled deliveries in delivery order.
    pub deliveries: Vec<(NodeId, Delivery)>,
    /// Backward walk that closed a cycle, if the traversal was aborted.
    pub cycle: Option<Vec<NodeId>>,
}

impl RouteReport {
    /// Nodes that handled the message, in delivery order.
    pub fn delivered(&self) -> Vec<NodeId> {
        self.deliveries.iter().map(|(node, _)| *node).collect()
    }

    /// True when a cycle stopped the traversal.
    pub fn is_aborted(&self) -> bool {
        self.cycle.is_some()
    }
}

/// Routes chain messages between registered controllers.
pub struct ChainRouter<'a> {
    registry: &'a mut ControllerRegistry,
    graph: &'a mut dyn HostGraph,
    config: &'a SyncConfig,
    fx: &'a mut Effects,
}

impl<'a> ChainRouter<'a> {
    /// Create a router over a registry and the graph its controllers sit on.
    pub fn new(
        registry: &'a mut ControllerRegistry,
        graph: &'a mut dyn HostGraph,
        config: &'a SyncConfig,
        fx: &'a mut Effects,
    ) -> Self {
        Self {
            registry,
            graph,
            config,
            fx,
        }
    }

    /// Route `message` starting at controller `start`.
    pub fn route(&mut self, start: NodeId, message: &mut ChainMessage) -> RouteReport {
        let mut report = RouteReport::default();
        if !self.is_chain_member(start) {
            debug!(node = start.0, message = %message, "chain_route_skipped");
            return report;
        }

        let mut walk = vec![start];
        let mut current = start;
        while message.is_launch() {
            match self.predecessor(current) {
                Some(prev) if prev == message.sender_id || walk.contains(&prev) => {
                    walk.push(prev);
                    warn!(
                        sender = message.sender_id.0,
                        node = current.0,
                        predecessor = prev.0,
                        cycles = ?self.graph.chain_cycles(&self.config.chain_output),
                        "chain_cycle_detected"
                    );
                    report.cycle = Some(walk);
                    return report;
                }
                Some(prev) => {
                    trace!(from = current.0, to = prev.0, message = %message, "chain_relay");
                    walk.push(prev);
                    current = prev;
                }
                None => message.land(),
            }
        }

        report.head = Some(current);
        let mut visited = BTreeSet::new();
        self.deliver(current, message, &mut visited, &mut report);

        debug!(
            sender = message.sender_id.0,
            message = %message,
            head = current.0,
            delivered = report.deliveries.len(),
            "chain_message_routed"
        );
        report
    }

    fn deliver(
        &mut self,
        node: NodeId,
        message: &mut ChainMessage,
        visited: &mut BTreeSet<NodeId>,
        report: &mut RouteReport,
    ) {
        if !visited.insert(node) {
            trace!(node = node.0, "chain_revisit_skipped");
            return;
        }
        let Some(controller) = self.registry.get_mut(node) else {
            return;
        };

        let delivery = controller.on_chain_message(&mut *self.graph, message, &mut *self.fx);
        trace!(node = node.0, message = %message, delivery = ?delivery, "chain_delivered");
        report.deliveries.push((node, delivery));

        for next in self.successors(node) {
            self.deliver(next, message, visited, report);
        }
    }

    fn is_chain_member(&self, node: NodeId) -> bool {
        self.registry
            .get(node)
            .is_some_and(NodeController::is_chain_member)
    }

    fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        self.graph
            .input_origin(node, Some(&self.config.chain_input))
            .filter(|prev| self.is_chain_member(*prev))
    }

    fn successors(&self, node: NodeId) -> Vec<NodeId> {
        self.graph
            .output_nodes(node, Some(&self.config.chain_output))
            .into_iter()
            .filter(|next| self.is_chain_member(*next))
            .collect()
    }
}
