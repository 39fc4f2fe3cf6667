//! Chained style controller ("My Top-10 Styles").

use style_chain_core::{HostGraph, NodeId, WidgetValue};
use tracing::{debug, warn};

use super::{relabel, ControllerKind, Delivery, Effects, NodeController};
use crate::broadcast::TopStylesList;
use crate::channel::Channel;
use crate::config::SyncConfig;
use crate::detector::{ConnectionChange, ConnectionWatcher};
use crate::error::{SyncError, SyncResult};
use crate::message::{ChainMessage, MessageKind};
use crate::names::{normalize_style_name, LabelFormat, NameRule};
use crate::observer::Origin;
use crate::selection::{StyleSelection, ToggleOutcome};

/// Controller for a chain member with a channel and exclusive style slots.
#[derive(Debug, Clone)]
pub struct StylesController {
    node: NodeId,
    channel: Channel,
    selection: StyleSelection,
    watcher: ConnectionWatcher,
    received: TopStylesList,
}

impl StylesController {
    /// Attach to `node`. Fails when the node has no style widgets.
    ///
    /// A missing or unparsable channel widget falls back to
    /// [`Channel::FIRST`].
    pub fn attach(graph: &dyn HostGraph, node: NodeId, config: &SyncConfig) -> SyncResult<Self> {
        let n = graph
            .node(node)
            .ok_or(SyncError::NodeNotFound { node_id: node })?;

        let widgets = n.widget_names_with_prefix(&config.style_widget_prefix);
        if widgets.is_empty() {
            return Err(SyncError::MissingStyleWidgets {
                node_id: node,
                prefix: config.style_widget_prefix.clone(),
            });
        }

        let raw_channel = n
            .widget(&config.channel_widget)
            .and_then(|w| w.value.as_text());
        let channel = match raw_channel.map(|v| Channel::parse(v, config.channel_count)) {
            Some(Ok(channel)) => channel,
            Some(Err(e)) => {
                warn!(node = node.0, error = %e, "channel_fallback");
                Channel::FIRST
            }
            None => Channel::FIRST,
        };

        Ok(Self {
            node,
            channel,
            selection: StyleSelection::new(widgets),
            watcher: ConnectionWatcher::new([
                config.chain_input.clone(),
                config.top_styles_input.clone(),
            ]),
            received: TopStylesList::default(),
        })
    }

    /// Current channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Style selection state.
    pub fn selection(&self) -> &StyleSelection {
        &self.selection
    }

    /// Connection watcher state.
    pub fn watcher(&self) -> &ConnectionWatcher {
        &self.watcher
    }

    /// Last received top-styles list.
    pub fn received(&self) -> &TopStylesList {
        &self.received
    }

    /// Selected slot and its normalized style name.
    ///
    /// `None` when nothing is selected or the slot holds no valid name.
    pub fn active_style(&self, graph: &dyn HostGraph) -> Option<(usize, String)> {
        let index = self.selection.selected(graph, self.node)?;
        let name = normalize_style_name(self.received.get(index)?);
        if name.is_empty() {
            None
        } else {
            Some((index, name))
        }
    }

    fn change_channel(&mut self, value: &WidgetValue, config: &SyncConfig, fx: &mut Effects) {
        let Some(text) = value.as_text() else {
            return;
        };
        match Channel::parse(text, config.channel_count) {
            Ok(channel) if channel != self.channel => {
                debug!(node = self.node.0, from = %self.channel, to = %channel, "channel_changed");
                self.channel = channel;
                fx.messages
                    .push(ChainMessage::force_no_repeat_channels(self.node));
            }
            Ok(_) => {}
            Err(e) => warn!(node = self.node.0, error = %e, "channel_rejected"),
        }
    }
}

impl NodeController for StylesController {
    fn node(&self) -> NodeId {
        self.node
    }

    fn kind(&self) -> ControllerKind {
        ControllerKind::Styles
    }

    fn is_chain_member(&self) -> bool {
        true
    }

    fn on_poll_tick(
        &mut self,
        graph: &dyn HostGraph,
        config: &SyncConfig,
        fx: &mut Effects,
    ) -> Vec<ConnectionChange> {
        let changes = self.watcher.poll(graph, self.node);
        for change in &changes {
            if change.slot == config.chain_input {
                fx.messages
                    .push(ChainMessage::force_no_repeat_channels(self.node));
            } else if change.slot == config.top_styles_input {
                if let Some(producer) = change.origin {
                    fx.pulls.push((self.node, producer));
                }
            }
        }
        changes
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
        if widget == config.channel_widget {
            self.change_channel(value, config, fx);
            return;
        }

        let (Some(index), Some(on)) = (self.selection.index_of(widget), value.as_bool()) else {
            return;
        };
        if let ToggleOutcome::Selected(_) =
            self.selection
                .on_toggle(graph, self.node, index, on, origin, fx)
        {
            fx.messages
                .push(ChainMessage::deselect_all_styles(self.node, self.channel));
        }
    }

    fn on_chain_message(
        &mut self,
        graph: &mut dyn HostGraph,
        message: &mut ChainMessage,
        fx: &mut Effects,
    ) -> Delivery {
        match &mut message.kind {
            MessageKind::DeselectAllStyles => {
                if message.sender_id == self.node {
                    return Delivery::Ignored;
                }
                if message.channel.is_some_and(|c| c != self.channel) {
                    return Delivery::Ignored;
                }
                Delivery::Deselected(self.selection.deselect_all(graph, self.node, fx))
            }
            MessageKind::ForceNoRepeatChannels { channels } => {
                if channels.contains(&self.channel) {
                    Delivery::Deselected(self.selection.deselect_all(graph, self.node, fx))
                } else {
                    channels.insert(self.channel);
                    Delivery::Claimed(self.channel)
                }
            }
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
                NameRule::Standard,
                LabelFormat::Ranked,
                &config.placeholder_label,
            );
            relabel(graph, self.node, widget, &label);
        }
        self.received = list.clone();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use style_chain_core::{Node, StyleGraph, Widget};

    fn styles_node(id: u64, channel: &str) -> Node {
        let mut node = Node::new(NodeId(id), "MyTop10Styles //ZImage")
            .with_widget(Widget::combo("output_to", channel, Channel::names(4)));
        for i in 1..=4 {
            node = node.with_widget(Widget::toggle(format!("style_{i}"), false));
        }
        node
    }

    fn setup(channel: &str) -> (StyleGraph, StylesController) {
        let mut graph = StyleGraph::new();
        graph.add_node(styles_node(1, channel)).unwrap();
        let ctrl = StylesController::attach(&graph, NodeId(1), &SyncConfig::default()).unwrap();
        (graph, ctrl)
    }

    #[test]
    fn test_attach_reads_channel() {
        let (_, ctrl) = setup("custom_3");
        assert_eq!(ctrl.channel().number(), 3);
        assert_eq!(ctrl.selection().len(), 4);
        assert_eq!(ctrl.watcher().slots().collect::<Vec<_>>(), ["input", "top_styles"]);
        assert!(ctrl.received().is_empty());
    }

    #[test]
    fn test_attach_invalid_channel_falls_back() {
        let (_, ctrl) = setup("bogus");
        assert_eq!(ctrl.channel(), Channel::FIRST);
    }

    #[test]
    fn test_attach_without_style_widgets_fails() {
        let mut graph = StyleGraph::new();
        graph.add_node(Node::new(NodeId(1), "MyTop10Styles")).unwrap();
        let err = StylesController::attach(&graph, NodeId(1), &SyncConfig::default()).unwrap_err();
        assert!(matches!(err, SyncError::MissingStyleWidgets { .. }));
    }

    #[test]
    fn test_select_launches_deselect() {
        let (mut graph, mut ctrl) = setup("custom_2");
        let config = SyncConfig::default();
        let mut fx = Effects::default();
        graph.set_widget_value(NodeId(1), "style_2", true.into()).unwrap();
        ctrl.on_widget_changed(&mut graph, &config, "style_2", &true.into(), Origin::User, &mut fx);

        assert_eq!(fx.messages.len(), 1);
        let msg = &fx.messages[0];
        assert_eq!(msg.type_name(), "launch:deselectAllStyles");
        assert_eq!(msg.sender_id, NodeId(1));
        assert_eq!(msg.channel, Some(Channel::new(2, 4).unwrap()));
    }

    #[test]
    fn test_deselect_message_filters() {
        let (mut graph, mut ctrl) = setup("custom_1");
        let mut fx = Effects::default();
        graph.set_widget_value(NodeId(1), "style_1", true.into()).unwrap();

        let mut own = ChainMessage::deselect_all_styles(NodeId(1), Channel::FIRST);
        own.land();
        assert_eq!(ctrl.on_chain_message(&mut graph, &mut own, &mut fx), Delivery::Ignored);

        let mut other_channel = ChainMessage::deselect_all_styles(NodeId(9), Channel::new(2, 4).unwrap());
        other_channel.land();
        assert_eq!(
            ctrl.on_chain_message(&mut graph, &mut other_channel, &mut fx),
            Delivery::Ignored
        );

        let mut same = ChainMessage::deselect_all_styles(NodeId(9), Channel::FIRST);
        same.land();
        assert_eq!(
            ctrl.on_chain_message(&mut graph, &mut same, &mut fx),
            Delivery::Deselected(1)
        );
        assert_eq!(ctrl.selection().selected(&graph, NodeId(1)), None);
    }

    #[test]
    fn test_force_no_repeat_claims_then_conflicts() {
        let (mut graph, mut ctrl) = setup("custom_1");
        let mut fx = Effects::default();
        graph.set_widget_value(NodeId(1), "style_3", true.into()).unwrap();

        let mut msg = ChainMessage::force_no_repeat_channels(NodeId(1));
        msg.land();
        assert_eq!(
            ctrl.on_chain_message(&mut graph, &mut msg, &mut fx),
            Delivery::Claimed(Channel::FIRST)
        );
        assert_eq!(ctrl.selection().selected(&graph, NodeId(1)), Some(2));

        // a second visit in the same pass finds the channel taken
        assert_eq!(
            ctrl.on_chain_message(&mut graph, &mut msg, &mut fx),
            Delivery::Deselected(1)
        );
        match &msg.kind {
            MessageKind::ForceNoRepeatChannels { channels } => {
                assert_eq!(*channels, BTreeSet::from([Channel::FIRST]));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_channel_change_launches_force_no_repeat() {
        let (mut graph, mut ctrl) = setup("custom_1");
        let config = SyncConfig::default();
        let mut fx = Effects::default();

        ctrl.on_widget_changed(&mut graph, &config, "output_to", &"custom_4".into(), Origin::User, &mut fx);
        assert_eq!(ctrl.channel().number(), 4);
        assert_eq!(fx.messages.len(), 1);
        assert_eq!(fx.messages[0].type_name(), "launch:forceNoRepeatChannels");

        let mut fx = Effects::default();
        ctrl.on_widget_changed(&mut graph, &config, "output_to", &"custom_9".into(), Origin::User, &mut fx);
        assert_eq!(ctrl.channel().number(), 4);
        assert!(fx.is_empty());
    }

    #[test]
    fn test_receive_and_active_style() {
        let (mut graph, mut ctrl) = setup("custom_1");
        let config = SyncConfig::default();
        let mut fx = Effects::default();
        let list = TopStylesList::new(["\"Anime\"", "none"]);
        assert!(ctrl.receive_top_styles(&mut graph, &config, &list, &mut fx));
        assert_eq!(ctrl.received(), &list);

        assert_eq!(graph.widget(NodeId(1), "style_1").unwrap().display_label(), "1 - \"Anime\"");
        assert_eq!(graph.widget(NodeId(1), "style_2").unwrap().display_label(), "-");
        assert_eq!(graph.widget(NodeId(1), "style_4").unwrap().display_label(), "-");

        graph.set_widget_value(NodeId(1), "style_1", true.into()).unwrap();
        assert_eq!(ctrl.active_style(&graph), Some((0, "Anime".to_string())));

        graph.set_widget_value(NodeId(1), "style_1", false.into()).unwrap();
        graph.set_widget_value(NodeId(1), "style_2", true.into()).unwrap();
        assert_eq!(ctrl.active_style(&graph), None);
    }
}
