//! Low-priority poll scheduler.
//!
//! Owns the set of nodes whose controllers are polled each round. The host
//! calls [`StyleSync::tick`](crate::StyleSync::tick) whenever it is idle; a
//! round only runs once the configured period has elapsed since the last one.

use std::time::{Duration, Instant};

use style_chain_core::NodeId;
use tracing::trace;

/// Registration set and period bookkeeping for poll rounds.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    period: Duration,
    registered: Vec<NodeId>,
    last_run: Option<Instant>,
    rounds: u64,
}

impl PollScheduler {
    /// Create a scheduler with the given minimum round interval.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            registered: Vec::new(),
            last_run: None,
            rounds: 0,
        }
    }

    /// Minimum interval between rounds.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change the minimum interval between rounds.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Register a node. Returns false if it was already registered.
    pub fn register(&mut self, node: NodeId) -> bool {
        if self.registered.contains(&node) {
            return false;
        }
        self.registered.push(node);
        true
    }

    /// Deregister a node. Returns false if it was not registered.
    pub fn deregister(&mut self, node: NodeId) -> bool {
        let before = self.registered.len();
        self.registered.retain(|n| *n != node);
        self.registered.len() != before
    }

    /// Check if a node is registered.
    pub fn is_registered(&self, node: NodeId) -> bool {
        self.registered.contains(&node)
    }

    /// Registered nodes in registration order.
    pub fn registered(&self) -> &[NodeId] {
        &self.registered
    }

    /// Number of rounds run so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// True when a round may run at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.period,
        }
    }

    /// Start a round if one is due. Returns the nodes to poll.
    pub fn begin_round(&mut self, now: Instant) -> Option<Vec<NodeId>> {
        if !self.is_due(now) {
            trace!(rounds = self.rounds, "poll_round_not_due");
            return None;
        }
        Some(self.force_round(now))
    }

    /// Start a round regardless of the period.
    pub fn force_round(&mut self, now: Instant) -> Vec<NodeId> {
        self.last_run = Some(now);
        self.rounds += 1;
        self.registered.clone()
    }
}
