//! Controllers attached to host graph nodes.
//!
//! Each node kind gets its own controller type. The registry stores them as
//! the [`Controller`] tagged union and dispatches through the
//! [`NodeController`] capability interface.

mod category;
mod editor;
mod selector;
mod styles;

use std::fmt;

use style_chain_core::{HostGraph, NodeId, WidgetValue};
use tracing::warn;

use crate::broadcast::TopStylesList;
use crate::channel::Channel;
use crate::config::SyncConfig;
use crate::detector::ConnectionChange;
use crate::message::ChainMessage;
use crate::observer::{Origin, WidgetEvent};

pub use category::CategoryController;
pub use editor::EditorController;
pub use selector::SelectorController;
pub use styles::StylesController;

/// Kind of controller attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerKind {
    /// Chained style node with a channel.
    Styles,
    /// Standalone selector fed by a top-styles list.
    Selector,
    /// Top-styles list producer.
    Editor,
    /// Category combo filtering a style combo.
    Category,
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerKind::Styles => "styles",
            ControllerKind::Selector => "selector",
            ControllerKind::Editor => "editor",
            ControllerKind::Category => "category",
        };
        write!(f, "{name}")
    }
}

/// What a controller did with a chain message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// All local styles were deselected; carries how many changed.
    Deselected(usize),
    /// The controller claimed its channel for the rest of the pass.
    Claimed(Channel),
    /// The message did not concern this controller.
    Ignored,
    /// The controller does not take part in chains.
    NotMember,
}

/// Follow-up work produced by a controller callback.
///
/// Controllers never reach other controllers directly; the coordinator
/// drains this after the callback returns.
#[derive(Debug, Default)]
pub struct Effects {
    /// Widget changes to report to observers.
    pub widget_events: Vec<WidgetEvent>,
    /// Chain messages to route, starting at their sender.
    pub messages: Vec<ChainMessage>,
    /// Top-styles lists to broadcast, keyed by producer.
    pub publications: Vec<(NodeId, TopStylesList)>,
    /// Consumers asking a producer for its current list, as (consumer, producer).
    pub pulls: Vec<(NodeId, NodeId)>,
}

impl Effects {
    /// True when there is nothing left to process.
    pub fn is_empty(&self) -> bool {
        self.widget_events.is_empty()
            && self.messages.is_empty()
            && self.publications.is_empty()
            && self.pulls.is_empty()
    }

    /// True when only observer notifications remain.
    pub fn is_settled(&self) -> bool {
        self.messages.is_empty() && self.publications.is_empty() && self.pulls.is_empty()
    }
}

/// Capability interface shared by every controller kind.
pub trait NodeController {
    /// Node this controller is attached to.
    fn node(&self) -> NodeId;

    /// Kind of this controller.
    fn kind(&self) -> ControllerKind;

    /// True when the controller relays and handles chain messages.
    fn is_chain_member(&self) -> bool {
        false
    }

    /// Poll watched slots and react to connection changes.
    fn on_poll_tick(
        &mut self,
        _graph: &dyn HostGraph,
        _config: &SyncConfig,
        _fx: &mut Effects,
    ) -> Vec<ConnectionChange> {
        Vec::new()
    }

    /// React to a widget value change that was already written to the graph.
    fn on_widget_changed(
        &mut self,
        _graph: &mut dyn HostGraph,
        _config: &SyncConfig,
        _widget: &str,
        _value: &WidgetValue,
        _origin: Origin,
        _fx: &mut Effects,
    ) {
    }

    /// Handle a chain message during the forward phase.
    fn on_chain_message(
        &mut self,
        _graph: &mut dyn HostGraph,
        _message: &mut ChainMessage,
        _fx: &mut Effects,
    ) -> Delivery {
        Delivery::NotMember
    }

    /// Render a received top-styles list. Returns false for non-consumers.
    fn receive_top_styles(
        &mut self,
        _graph: &mut dyn HostGraph,
        _config: &SyncConfig,
        _list: &TopStylesList,
        _fx: &mut Effects,
    ) -> bool {
        false
    }

    /// Current list of a producer. `None` for non-producers.
    fn top_styles(&self, _graph: &dyn HostGraph) -> Option<TopStylesList> {
        None
    }
}

/// A controller of any kind.
#[derive(Debug, Clone)]
pub enum Controller {
    /// See [`StylesController`].
    Styles(StylesController),
    /// See [`SelectorController`].
    Selector(SelectorController),
    /// See [`EditorController`].
    Editor(EditorController),
    /// See [`CategoryController`].
    Category(CategoryController),
}

impl Controller {
    fn inner(&self) -> &dyn NodeController {
        match self {
            Controller::Styles(c) => c,
            Controller::Selector(c) => c,
            Controller::Editor(c) => c,
            Controller::Category(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn NodeController {
        match self {
            Controller::Styles(c) => c,
            Controller::Selector(c) => c,
            Controller::Editor(c) => c,
            Controller::Category(c) => c,
        }
    }

    /// Style widget names in slot order. Empty for category controllers.
    pub fn style_widgets(&self) -> &[String] {
        match self {
            Controller::Styles(c) => c.selection().widgets(),
            Controller::Selector(c) => c.selection().widgets(),
            Controller::Editor(c) => c.widgets(),
            Controller::Category(_) => &[],
        }
    }

    /// The styles controller, if this is one.
    pub fn as_styles(&self) -> Option<&StylesController> {
        match self {
            Controller::Styles(c) => Some(c),
            _ => None,
        }
    }

    /// The selector controller, if this is one.
    pub fn as_selector(&self) -> Option<&SelectorController> {
        match self {
            Controller::Selector(c) => Some(c),
            _ => None,
        }
    }

    /// The editor controller, if this is one.
    pub fn as_editor(&self) -> Option<&EditorController> {
        match self {
            Controller::Editor(c) => Some(c),
            _ => None,
        }
    }

    /// The category controller, if this is one.
    pub fn as_category(&self) -> Option<&CategoryController> {
        match self {
            Controller::Category(c) => Some(c),
            _ => None,
        }
    }
}

impl NodeController for Controller {
    fn node(&self) -> NodeId {
        self.inner().node()
    }

    fn kind(&self) -> ControllerKind {
        self.inner().kind()
    }

    fn is_chain_member(&self) -> bool {
        self.inner().is_chain_member()
    }

    fn on_poll_tick(
        &mut self,
        graph: &dyn HostGraph,
        config: &SyncConfig,
        fx: &mut Effects,
    ) -> Vec<ConnectionChange> {
        self.inner_mut().on_poll_tick(graph, config, fx)
    }

    fn on_widget_changed(
        &mut self,
        graph: &mut dyn HostGraph,
        config: &SyncConfig,
        widget: &str,
        value: &WidgetValue,
        origin: Origin,
        fx: &mut Effects,
    ) {
        self.inner_mut()
            .on_widget_changed(graph, config, widget, value, origin, fx)
    }

    fn on_chain_message(
        &mut self,
        graph: &mut dyn HostGraph,
        message: &mut ChainMessage,
        fx: &mut Effects,
    ) -> Delivery {
        self.inner_mut().on_chain_message(graph, message, fx)
    }

    fn receive_top_styles(
        &mut self,
        graph: &mut dyn HostGraph,
        config: &SyncConfig,
        list: &TopStylesList,
        fx: &mut Effects,
    ) -> bool {
        self.inner_mut().receive_top_styles(graph, config, list, fx)
    }

    fn top_styles(&self, graph: &dyn HostGraph) -> Option<TopStylesList> {
        self.inner().top_styles(graph)
    }
}

/// Write a widget value and record the event. Returns false when the
/// widget is missing or already holds `value`.
pub(crate) fn write_widget(
    graph: &mut dyn HostGraph,
    node: NodeId,
    widget: &str,
    value: WidgetValue,
    origin: Origin,
    fx: &mut Effects,
) -> bool {
    let Some(w) = graph.node_mut(node).and_then(|n| n.widget_mut(widget)) else {
        return false;
    };
    if w.value == value {
        return false;
    }
    w.value = value.clone();
    fx.widget_events.push(WidgetEvent {
        node,
        widget: widget.to_string(),
        value,
        origin,
    });
    true
}

/// Force-rename a widget label. A failed rename is cosmetic: it is logged
/// and reported as false, never retried.
pub(crate) fn relabel(graph: &mut dyn HostGraph, node: NodeId, widget: &str, label: &str) -> bool {
    match graph.force_rename_widget(node, widget, Some(label)) {
        Ok(()) => true,
        Err(e) => {
            warn!(node = node.0, widget, error = %e, "widget_rename_failed");
            false
        }
    }
}
