//! Category-filtered style combo.
//!
//! Switching the category combo refills the style combo with `"none"`
//! followed by that category's styles. The style picked in each category is
//! remembered and restored when the category is revisited.

use std::collections::BTreeMap;

use style_chain_core::{HostGraph, NodeId, WidgetValue};
use tracing::debug;

use super::{write_widget, ControllerKind, Effects, NodeController};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::observer::Origin;

const NONE_STYLE: &str = "none";

/// Controller for nodes with a category combo and a style combo.
#[derive(Debug, Clone)]
pub struct CategoryController {
    node: NodeId,
    category_widget: String,
    style_widget: String,
    styles_by_category: BTreeMap<String, Vec<String>>,
    current_category: String,
    selected_by_category: BTreeMap<String, String>,
}

impl CategoryController {
    /// Attach to `node` with the category to styles map.
    pub fn attach(
        graph: &dyn HostGraph,
        node: NodeId,
        config: &SyncConfig,
        styles_by_category: BTreeMap<String, Vec<String>>,
    ) -> SyncResult<Self> {
        let n = graph
            .node(node)
            .ok_or(SyncError::NodeNotFound { node_id: node })?;

        let category = n
            .widget(&config.category_widget)
            .ok_or_else(|| SyncError::MissingWidget {
                node_id: node,
                widget: config.category_widget.clone(),
            })?;
        if n.widget(&config.category_style_widget).is_none() {
            return Err(SyncError::MissingWidget {
                node_id: node,
                widget: config.category_style_widget.clone(),
            });
        }
        if styles_by_category.is_empty() {
            return Err(SyncError::MissingCategoryData { node_id: node });
        }

        Ok(Self {
            node,
            current_category: category.value.to_string(),
            category_widget: config.category_widget.clone(),
            style_widget: config.category_style_widget.clone(),
            styles_by_category,
            selected_by_category: BTreeMap::new(),
        })
    }

    /// Category currently shown.
    pub fn current_category(&self) -> &str {
        &self.current_category
    }

    /// Style remembered for `category`.
    pub fn remembered(&self, category: &str) -> Option<&str> {
        self.selected_by_category.get(category).map(String::as_str)
    }

    /// Show `category`: refill the style combo and pick its style.
    ///
    /// Returns the style now selected.
    pub fn switch_category(
        &mut self,
        graph: &mut dyn HostGraph,
        category: &str,
        fx: &mut Effects,
    ) -> String {
        let previous_style = graph
            .node(self.node)
            .and_then(|n| n.widget(&self.style_widget))
            .map(|w| w.value.to_string());
        if let Some(style) = previous_style {
            self.selected_by_category
                .insert(self.current_category.clone(), style);
        }
        self.current_category = category.to_string();

        let (options, selected) = match self.styles_by_category.get(category) {
            Some(styles) => {
                let mut options = vec![NONE_STYLE.to_string()];
                options.extend(styles.iter().cloned());
                let selected = self
                    .selected_by_category
                    .get(category)
                    .cloned()
                    .or_else(|| options.get(1).cloned())
                    .unwrap_or_else(|| NONE_STYLE.to_string());
                (options, selected)
            }
            None => (vec![NONE_STYLE.to_string()], NONE_STYLE.to_string()),
        };

        debug!(
            node = self.node.0,
            category,
            styles = options.len(),
            selected = %selected,
            "category_switched"
        );
        if let Some(w) = graph
            .node_mut(self.node)
            .and_then(|n| n.widget_mut(&self.style_widget))
        {
            w.options = options;
        }
        write_widget(
            graph,
            self.node,
            &self.style_widget,
            selected.clone().into(),
            Origin::Programmatic,
            fx,
        );
        selected
    }
}

impl NodeController for CategoryController {
    fn node(&self) -> NodeId {
        self.node
    }

    fn kind(&self) -> ControllerKind {
        ControllerKind::Category
    }

    fn on_widget_changed(
        &mut self,
        graph: &mut dyn HostGraph,
        _config: &SyncConfig,
        widget: &str,
        value: &WidgetValue,
        _origin: Origin,
        fx: &mut Effects,
    ) {
        if widget == self.category_widget {
            let category = value.to_string();
            self.switch_category(graph, &category, fx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use style_chain_core::{Node, StyleGraph, Widget};

    fn setup() -> (StyleGraph, CategoryController) {
        let mut graph = StyleGraph::new();
        graph
            .add_node(
                Node::new(NodeId(3), "StylePromptEncoder //ZImage")
                    .with_widget(Widget::combo("category", "Photo", vec![]))
                    .with_widget(Widget::combo("style", "\"Portrait\"", vec![])),
            )
            .unwrap();
        let map = BTreeMap::from([
            ("Photo".to_string(), vec!["\"Portrait\"".to_string(), "\"Macro\"".to_string()]),
            ("Art".to_string(), vec!["\"Anime\"".to_string()]),
            ("Empty".to_string(), vec![]),
        ]);
        let ctrl = CategoryController::attach(&graph, NodeId(3), &SyncConfig::default(), map).unwrap();
        (graph, ctrl)
    }

    fn style_widget(graph: &StyleGraph) -> &Widget {
        graph.widget(NodeId(3), "style").unwrap()
    }

    #[test]
    fn test_switch_selects_first_real_style() {
        let (mut graph, mut ctrl) = setup();
        let mut fx = Effects::default();

        assert_eq!(ctrl.switch_category(&mut graph, "Art", &mut fx), "\"Anime\"");
        assert_eq!(style_widget(&graph).options, vec!["none", "\"Anime\""]);
        assert_eq!(ctrl.current_category(), "Art");
        assert_eq!(fx.widget_events.len(), 1);
        assert_eq!(fx.widget_events[0].origin, Origin::Programmatic);
    }

    #[test]
    fn test_selection_remembered_per_category() {
        let (mut graph, mut ctrl) = setup();
        let mut fx = Effects::default();
        graph.set_widget_value(NodeId(3), "style", "\"Macro\"".into()).unwrap();

        ctrl.switch_category(&mut graph, "Art", &mut fx);
        assert_eq!(ctrl.remembered("Photo"), Some("\"Macro\""));

        assert_eq!(ctrl.switch_category(&mut graph, "Photo", &mut fx), "\"Macro\"");
        assert_eq!(style_widget(&graph).options.len(), 3);
    }

    #[test]
    fn test_unknown_and_empty_categories() {
        let (mut graph, mut ctrl) = setup();
        let mut fx = Effects::default();

        assert_eq!(ctrl.switch_category(&mut graph, "Nope", &mut fx), "none");
        assert_eq!(style_widget(&graph).options, vec!["none"]);

        assert_eq!(ctrl.switch_category(&mut graph, "Empty", &mut fx), "none");
    }

    #[test]
    fn test_attach_requires_widgets_and_data() {
        let mut graph = StyleGraph::new();
        graph
            .add_node(Node::new(NodeId(1), "StyleStringInjector").with_widget(Widget::combo("category", "Photo", vec![])))
            .unwrap();
        let map = BTreeMap::from([("Photo".to_string(), vec![])]);
        let err = CategoryController::attach(&graph, NodeId(1), &SyncConfig::default(), map).unwrap_err();
        assert!(matches!(err, SyncError::MissingWidget { .. }));

        graph.remove_node(NodeId(1)).unwrap();
        graph
            .add_node(
                Node::new(NodeId(1), "StyleStringInjector")
                    .with_widget(Widget::combo("category", "Photo", vec![]))
                    .with_widget(Widget::combo("style", "none", vec![])),
            )
            .unwrap();
        let err = CategoryController::attach(&graph, NodeId(1), &SyncConfig::default(), BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, SyncError::MissingCategoryData { .. }));
    }

    #[test]
    fn test_category_widget_change_switches() {
        let (mut graph, mut ctrl) = setup();
        let mut fx = Effects::default();
        graph.set_widget_value(NodeId(3), "category", "Art".into()).unwrap();
        ctrl.on_widget_changed(&mut graph, &SyncConfig::default(), "category", &"Art".into(), Origin::User, &mut fx);
        assert_eq!(style_widget(&graph).value, WidgetValue::from("\"Anime\""));
    }
}
