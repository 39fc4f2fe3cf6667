//! Controller registry keyed by node.

use std::collections::BTreeMap;
use std::fmt;

use style_chain_core::NodeId;

use crate::controller::{Controller, ControllerKind, NodeController};

/// Associates each node with at most one controller.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: BTreeMap<NodeId, Controller>,
}

impl ControllerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller under its node, replacing any previous one.
    pub fn register(&mut self, controller: Controller) -> Option<Controller> {
        self.controllers.insert(controller.node(), controller)
    }

    /// Remove the controller of `node`.
    pub fn deregister(&mut self, node: NodeId) -> Option<Controller> {
        self.controllers.remove(&node)
    }

    /// Get the controller of `node`.
    pub fn get(&self, node: NodeId) -> Option<&Controller> {
        self.controllers.get(&node)
    }

    /// Get the controller of `node`, mutably.
    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut Controller> {
        self.controllers.get_mut(&node)
    }

    /// Check if `node` has a controller.
    pub fn contains(&self, node: NodeId) -> bool {
        self.controllers.contains_key(&node)
    }

    /// Kind of the controller attached to `node`.
    pub fn kind_of(&self, node: NodeId) -> Option<ControllerKind> {
        self.get(node).map(NodeController::kind)
    }

    /// All controlled nodes, in id order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.controllers.keys().copied().collect()
    }

    /// Number of controllers.
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// True when no controller is registered.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("controller_count", &self.controllers.len())
            .field("nodes", &self.controllers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::controller::EditorController;
    use style_chain_core::{Node, StyleGraph, Widget};

    fn editor(graph: &mut StyleGraph, id: u64) -> Controller {
        graph
            .add_node(Node::new(NodeId(id), "MyTop10StylesEditor").with_widget(Widget::new("style_1", "")))
            .unwrap();
        Controller::Editor(EditorController::attach(&*graph, NodeId(id), &SyncConfig::default()).unwrap())
    }

    #[test]
    fn test_register_and_deregister() {
        let mut graph = StyleGraph::new();
        let mut registry = ControllerRegistry::new();
        assert!(registry.register(editor(&mut graph, 2)).is_none());
        registry.register(editor(&mut graph, 1));

        assert_eq!(registry.ids(), vec![NodeId(1), NodeId(2)]);
        assert_eq!(registry.kind_of(NodeId(1)), Some(ControllerKind::Editor));
        assert!(registry.deregister(NodeId(1)).is_some());
        assert!(registry.deregister(NodeId(1)).is_none());
        assert!(!registry.contains(NodeId(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_one_controller_per_node() {
        let mut graph = StyleGraph::new();
        let mut registry = ControllerRegistry::new();
        let first = editor(&mut graph, 1);
        let second = first.clone();
        registry.register(first);
        assert!(registry.register(second).is_some());
        assert_eq!(registry.len(), 1);
    }
}
