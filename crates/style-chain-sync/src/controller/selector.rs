//! Standalone selector ("Top-10 Styles Selector").
//!
//! Consumes a top-styles list like the chained controller, but keeps
//! exclusivity local to its own node and only accepts quoted names.

use style_chain_core::{HostGraph, NodeId, WidgetValue};

use super::{relabel, ControllerKind, Effects, NodeController};
use crate::broadcast::TopStylesList;
use crate::config::SyncConfig;
use crate::detector::{ConnectionChange, ConnectionWatcher};
use crate::error::{SyncError, SyncResult};
use crate::names::{LabelFormat, NameRule};
use crate::observer::Origin;
use crate::selection::StyleSelection;

/// Controller for a selector node.
#[derive(Debug, Clone)]
pub struct SelectorController {
    node: NodeId,
    selection: StyleSelection,
    watcher: ConnectionWatcher,
}

impl SelectorController {
    /// Attach to `node` and reset every style label to the initial label.
    pub fn attach(graph: &mut dyn HostGraph, node: NodeId, config: &SyncConfig) -> SyncResult<Self> {
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

        for widget in &widgets {
            relabel(graph, node, widget, &config.selector_initial_label);
        }

        Ok(Self {
            node,
            selection: StyleSelection::new(widgets),
            watcher: ConnectionWatcher::new([config.top_styles_input.clone()]),
        })
    }

    /// Style selection state.
    pub fn selection(&self) -> &StyleSelection {
        &self.selection
    }
}

impl NodeController for SelectorController {
    fn node(&self) -> NodeId {
        self.node
    }

    fn kind(&self) -> ControllerKind {
        ControllerKind::Selector
    }

    fn on_poll_tick(
        &mut self,
        graph: &dyn HostGraph,
        _config: &SyncConfig,
        fx: &mut Effects,
    ) -> Vec<ConnectionChange> {
        let changes = self.watcher.poll(graph, self.node);
        for change in &changes {
            if let Some(producer) = change.origin {
                fx.pulls.push((self.node, producer));
            }
        }
        changes
    }

    fn on_widget_changed(
        &mut self,
        graph: &mut dyn HostGraph,
        _config: &SyncConfig,
        widget: &str,
        value: &WidgetValue,
        origin: Origin,
        fx: &mut Effects,
    ) {
        if let (Some(index), Some(on)) = (self.selection.index_of(widget), value.as_bool()) {
            self.selection
                .on_toggle(graph, self.node, index, on, origin, fx);
        }
    }

    fn receive_top_styles(
        &mut self,
        graph: &mut dyn HostGraph,
        config: &SyncConfig,
        list: &TopStylesList,
        _fx: &mut Effects,
    ) -> bool {
        for (index, widget) in self.selection.widgets().iter().enumerate() {
            let label = list.slot_label(
                index,
                NameRule::Quoted,
                LabelFormat::Raw,
                &config.placeholder_label,
            );
            relabel(graph, self.node, widget, &label);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use style_chain_core::{Node, StyleGraph, Widget};

    fn setup() -> (StyleGraph, SelectorController) {
        let mut node = Node::new(NodeId(5), "MyTop10StylesSelector //ZImage");
        for i in 1..=3 {
            node = node.with_widget(Widget::toggle(format!("style_{i}"), false));
        }
        let mut graph = StyleGraph::new();
        graph.add_node(node).unwrap();
        let ctrl = SelectorController::attach(&mut graph, NodeId(5), &SyncConfig::default()).unwrap();
        (graph, ctrl)
    }

    #[test]
    fn test_attach_sets_initial_labels() {
        let (graph, _) = setup();
        for i in 1..=3 {
            let w = graph.widget(NodeId(5), &format!("style_{i}")).unwrap();
            assert_eq!(w.display_label(), "\"Style Name\"");
        }
    }

    #[test]
    fn test_quoted_labels() {
        let (mut graph, mut ctrl) = setup();
        let mut fx = Effects::default();
        let list = TopStylesList::new(["\"Anime\"", "Anime"]);
        ctrl.receive_top_styles(&mut graph, &SyncConfig::default(), &list, &mut fx);

        assert_eq!(graph.widget(NodeId(5), "style_1").unwrap().display_label(), "\"Anime\"");
        assert_eq!(graph.widget(NodeId(5), "style_2").unwrap().display_label(), "-");
        assert_eq!(graph.widget(NodeId(5), "style_3").unwrap().display_label(), "-");
    }

    #[test]
    fn test_selection_stays_local() {
        let (mut graph, mut ctrl) = setup();
        let config = SyncConfig::default();
        let mut fx = Effects::default();
        for widget in ["style_1", "style_3"] {
            graph.set_widget_value(NodeId(5), widget, true.into()).unwrap();
            ctrl.on_widget_changed(&mut graph, &config, widget, &true.into(), Origin::User, &mut fx);
        }

        assert_eq!(ctrl.selection().selected(&graph, NodeId(5)), Some(2));
        assert_eq!(ctrl.selection().selected_count(&graph, NodeId(5)), 1);
        assert!(fx.messages.is_empty());
    }
}
