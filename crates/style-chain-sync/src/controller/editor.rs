//! Top-styles list producer ("Top-10 Style Editor").

use style_chain_core::{HostGraph, NodeId, WidgetValue};

use super::{ControllerKind, Effects, NodeController};
use crate::broadcast::TopStylesList;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::observer::Origin;

/// Controller for an editor node. Its style widgets hold the list.
#[derive(Debug, Clone)]
pub struct EditorController {
    node: NodeId,
    widgets: Vec<String>,
}

impl EditorController {
    /// Attach to `node`. Fails when the node has no style widgets.
    pub fn attach(graph: &dyn HostGraph, node: NodeId, config: &SyncConfig) -> SyncResult<Self> {
        let widgets = graph
            .node(node)
            .ok_or(SyncError::NodeNotFound { node_id: node })?
            .widget_names_with_prefix(&config.style_widget_prefix);
        if widgets.is_empty() {
            return Err(SyncError::MissingStyleWidgets {
                node_id: node,
                prefix: config.style_widget_prefix.clone(),
            });
        }
        Ok(Self { node, widgets })
    }

    /// Style widget names in rank order.
    pub fn widgets(&self) -> &[String] {
        &self.widgets
    }
}

impl NodeController for EditorController {
    fn node(&self) -> NodeId {
        self.node
    }

    fn kind(&self) -> ControllerKind {
        ControllerKind::Editor
    }

    fn on_widget_changed(
        &mut self,
        graph: &mut dyn HostGraph,
        _config: &SyncConfig,
        widget: &str,
        _value: &WidgetValue,
        _origin: Origin,
        fx: &mut Effects,
    ) {
        if !self.widgets.iter().any(|w| w == widget) {
            return;
        }
        if let Some(list) = self.top_styles(graph) {
            fx.publications.push((self.node, list));
        }
        if let Some(n) = graph.node_mut(self.node) {
            n.mark_dirty();
        }
    }

    fn top_styles(&self, graph: &dyn HostGraph) -> Option<TopStylesList> {
        let node = graph.node(self.node)?;
        Some(TopStylesList::new(self.widgets.iter().map(|name| {
            node.widget(name)
                .map(|w| w.value.to_string())
                .unwrap_or_default()
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use style_chain_core::{Node, StyleGraph, Widget};

    #[test]
    fn test_list_follows_widget_order() {
        let mut graph = StyleGraph::new();
        graph
            .add_node(
                Node::new(NodeId(2), "MyTop10StylesEditor //ZImage")
                    .with_widget(Widget::new("style_1", "Anime"))
                    .with_widget(Widget::new("notes", "ignored"))
                    .with_widget(Widget::new("style_2", "none")),
            )
            .unwrap();
        let ctrl = EditorController::attach(&graph, NodeId(2), &SyncConfig::default()).unwrap();

        let list = ctrl.top_styles(&graph).unwrap();
        assert_eq!(list.names(), ["Anime", "none"]);
    }

    #[test]
    fn test_style_edit_publishes() {
        let mut graph = StyleGraph::new();
        graph
            .add_node(
                Node::new(NodeId(2), "MyTop10StylesEditor")
                    .with_widget(Widget::new("style_1", "Anime")),
            )
            .unwrap();
        let mut ctrl = EditorController::attach(&graph, NodeId(2), &SyncConfig::default()).unwrap();
        let mut fx = Effects::default();

        graph.set_widget_value(NodeId(2), "style_1", "Film Noir".into()).unwrap();
        ctrl.on_widget_changed(
            &mut graph,
            &SyncConfig::default(),
            "style_1",
            &"Film Noir".into(),
            Origin::User,
            &mut fx,
        );

        assert_eq!(fx.publications.len(), 1);
        assert_eq!(fx.publications[0].0, NodeId(2));
        assert_eq!(fx.publications[0].1.names(), ["Film Noir"]);
        assert_eq!(graph.node(NodeId(2)).unwrap().revision, 1);
    }
}
