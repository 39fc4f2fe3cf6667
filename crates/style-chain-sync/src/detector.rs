//! Connection change detection by polling.
//!
//! Host connection-change notifications are not reliable, so each
//! controller polls its watched input slots once per tick and compares the
//! resolved origin node against the last observed one. A change is reported
//! exactly once per actual transition, including connect and disconnect.

use style_chain_core::{HostGraph, NodeId};
use tracing::debug;

/// A transition observed on a watched slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionChange {
    /// Watched input slot.
    pub slot: String,
    /// Origin node observed on the previous tick.
    pub previous: Option<NodeId>,
    /// Origin node observed now, `None` when disconnected.
    pub origin: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct WatchedSlot {
    name: String,
    last_origin: Option<NodeId>,
}

/// Per-controller cache of the origin node seen on each watched slot.
///
/// The cache starts empty, so a slot that is already connected when the
/// watcher is created reports one transition on the first poll.
#[derive(Debug, Clone, Default)]
pub struct ConnectionWatcher {
    slots: Vec<WatchedSlot>,
}

impl ConnectionWatcher {
    /// Watch the given input slots.
    pub fn new<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: slots
                .into_iter()
                .map(|name| WatchedSlot {
                    name: name.into(),
                    last_origin: None,
                })
                .collect(),
        }
    }

    /// Names of the watched slots.
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }

    /// Last origin observed on `slot`.
    pub fn last_origin(&self, slot: &str) -> Option<NodeId> {
        self.slots
            .iter()
            .find(|s| s.name == slot)
            .and_then(|s| s.last_origin)
    }

    /// Resolve every watched slot of `node` and report transitions.
    pub fn poll(&mut self, graph: &dyn HostGraph, node: NodeId) -> Vec<ConnectionChange> {
        let mut changes = Vec::new();
        for slot in &mut self.slots {
            let origin = graph.input_origin(node, Some(&slot.name));
            if origin == slot.last_origin {
                continue;
            }

            debug!(
                node = node.0,
                slot = %slot.name,
                previous = ?slot.last_origin,
                origin = ?origin,
                "connection_changed"
            );
            changes.push(ConnectionChange {
                slot: slot.name.clone(),
                previous: slot.last_origin,
                origin,
            });
            slot.last_origin = origin;
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use style_chain_core::{InputSocket, Node, OutputSocket, StyleGraph};

    fn graph() -> StyleGraph {
        let mut graph = StyleGraph::new();
        for id in 1..=3 {
            graph
                .add_node(
                    Node::new(NodeId(id), "MyTop10Styles")
                        .with_input(InputSocket::new("input", "STRING"))
                        .with_input(InputSocket::new("top_styles", "TOP_STYLES"))
                        .with_output(OutputSocket::new("output", "STRING")),
                )
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_idempotent_polling() {
        let mut graph = graph();
        graph.connect(NodeId(1), "output", NodeId(2), "input").unwrap();
        let mut watcher = ConnectionWatcher::new(["input", "top_styles"]);

        let first = watcher.poll(&graph, NodeId(2));
        assert_eq!(
            first,
            vec![ConnectionChange {
                slot: "input".into(),
                previous: None,
                origin: Some(NodeId(1)),
            }]
        );
        assert!(watcher.poll(&graph, NodeId(2)).is_empty());
        assert_eq!(watcher.last_origin("input"), Some(NodeId(1)));
    }

    #[test]
    fn test_unconnected_start_reports_nothing() {
        let graph = graph();
        let mut watcher = ConnectionWatcher::new(["input"]);
        assert!(watcher.poll(&graph, NodeId(1)).is_empty());
    }

    #[test]
    fn test_reconnect_and_disconnect() {
        let mut graph = graph();
        graph.connect(NodeId(1), "output", NodeId(3), "input").unwrap();
        let mut watcher = ConnectionWatcher::new(["input"]);
        watcher.poll(&graph, NodeId(3));

        graph.connect(NodeId(2), "output", NodeId(3), "input").unwrap();
        let changes = watcher.poll(&graph, NodeId(3));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].previous, Some(NodeId(1)));
        assert_eq!(changes[0].origin, Some(NodeId(2)));

        graph.disconnect_input(NodeId(3), "input").unwrap();
        let changes = watcher.poll(&graph, NodeId(3));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].origin, None);
        assert!(watcher.poll(&graph, NodeId(3)).is_empty());
    }

    #[test]
    fn test_missing_node_reads_as_disconnected() {
        let mut graph = graph();
        graph.connect(NodeId(1), "output", NodeId(2), "input").unwrap();
        let mut watcher = ConnectionWatcher::new(["input"]);
        watcher.poll(&graph, NodeId(2));

        graph.remove_node(NodeId(1)).unwrap();
        let changes = watcher.poll(&graph, NodeId(2));
        assert_eq!(changes[0].origin, None);
    }
}
