//! The `StyleSync` coordinator.
//!
//! Owns the host graph, the controller registry, the poll scheduler and the
//! observer lists. Every entry point runs to completion: controller callbacks
//! record follow-up work in [`Effects`], which is drained here until nothing
//! is left before the call returns.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use style_chain_core::{HostGraph, NodeId, WidgetValue};
use tracing::{debug, info, warn};

use crate::broadcast::{self, TopStylesList};
use crate::config::SyncConfig;
use crate::controller::{
    CategoryController, Controller, ControllerKind, EditorController, Effects, NodeController,
    SelectorController, StylesController,
};
use crate::detector::ConnectionChange;
use crate::error::{SyncError, SyncResult};
use crate::message::ChainMessage;
use crate::observer::{ConnectionEvent, ObserverId, ObserverList, Origin, WidgetEvent};
use crate::registry::ControllerRegistry;
use crate::router::{ChainRouter, RouteReport};
use crate::scheduler::PollScheduler;

/// Result of one poll round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Round number, starting at 1.
    pub round: u64,
    /// Controllers polled.
    pub polled: Vec<NodeId>,
    /// Connection changes observed, in poll order.
    pub events: Vec<ConnectionEvent>,
    /// Registrations dropped because their node is gone.
    pub stale: Vec<NodeId>,
}

impl TickReport {
    /// True when any watched connection changed.
    pub fn had_changes(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Coordinator for all style controllers on one host graph.
pub struct StyleSync<G: HostGraph> {
    graph: G,
    config: SyncConfig,
    registry: ControllerRegistry,
    scheduler: PollScheduler,
    widget_observers: ObserverList<WidgetEvent>,
    connection_observers: ObserverList<ConnectionEvent>,
}

impl<G: HostGraph> StyleSync<G> {
    /// Create a coordinator with the default configuration.
    pub fn new(graph: G) -> Self {
        Self::with_config(graph, SyncConfig::default())
    }

    /// Create a coordinator with a custom configuration.
    pub fn with_config(graph: G, config: SyncConfig) -> Self {
        Self {
            scheduler: PollScheduler::new(config.poll_period()),
            graph,
            config,
            registry: ControllerRegistry::new(),
            widget_observers: ObserverList::new(),
            connection_observers: ObserverList::new(),
        }
    }

    /// Get the host graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Get the host graph mutably, for topology edits.
    ///
    /// Edits are picked up by the next poll round.
    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    /// Give the host graph back.
    pub fn into_graph(self) -> G {
        self.graph
    }

    /// Get the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Replace the configuration and apply its poll period.
    ///
    /// Attached controllers keep the widgets they resolved when attached.
    pub fn set_config(&mut self, config: SyncConfig) -> SyncResult<()> {
        config.validate()?;
        self.scheduler.set_period(config.poll_period());
        debug!(poll_period_ms = config.poll_period_ms, "config_updated");
        self.config = config;
        Ok(())
    }

    /// Get the controller registry.
    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    /// Get the poll scheduler.
    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Get the controller attached to `node`.
    pub fn controller(&self, node: NodeId) -> Option<&Controller> {
        self.registry.get(node)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Attach a controller to `node` based on its class.
    ///
    /// Setup failures are logged and leave the node uncontrolled.
    pub fn attach(&mut self, node: NodeId) -> Option<ControllerKind> {
        match self.try_attach(node) {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!(node = node.0, error = %e, "controller_attach_failed");
                None
            }
        }
    }

    /// Attach a controller to `node`, returning why it failed.
    ///
    /// An existing controller is kept as is and its kind returned.
    /// Category nodes need their data and go through [`Self::attach_category`].
    pub fn try_attach(&mut self, node: NodeId) -> SyncResult<ControllerKind> {
        if let Some(kind) = self.registry.kind_of(node) {
            debug!(node = node.0, kind = %kind, "controller_already_attached");
            return Ok(kind);
        }
        let class = self
            .graph
            .node(node)
            .ok_or(SyncError::NodeNotFound { node_id: node })?
            .class
            .clone();
        let kind = self
            .config
            .kind_for_class(&class)
            .ok_or(SyncError::UnsupportedNode {
                node_id: node,
                class,
            })?;

        let controller = match kind {
            ControllerKind::Styles => {
                Controller::Styles(StylesController::attach(&self.graph, node, &self.config)?)
            }
            ControllerKind::Selector => Controller::Selector(SelectorController::attach(
                &mut self.graph,
                node,
                &self.config,
            )?),
            ControllerKind::Editor => {
                Controller::Editor(EditorController::attach(&self.graph, node, &self.config)?)
            }
            ControllerKind::Category => {
                return Err(SyncError::MissingCategoryData { node_id: node });
            }
        };
        self.install(controller);
        Ok(kind)
    }

    /// Attach a category controller with its category to styles map.
    ///
    /// A node that already has a controller is left untouched.
    pub fn attach_category(
        &mut self,
        node: NodeId,
        styles_by_category: BTreeMap<String, Vec<String>>,
    ) -> SyncResult<()> {
        if let Some(kind) = self.registry.kind_of(node) {
            debug!(node = node.0, kind = %kind, "controller_already_attached");
            return Ok(());
        }
        let controller =
            CategoryController::attach(&self.graph, node, &self.config, styles_by_category)?;
        self.install(Controller::Category(controller));
        Ok(())
    }

    /// Attach every node whose class maps to a non-category controller kind.
    ///
    /// Nodes that already have a controller are skipped, so this can be
    /// called again to pick up nodes added since. Returns the new ones.
    pub fn attach_all(&mut self) -> Vec<(NodeId, ControllerKind)> {
        let mut attached = Vec::new();
        for node in self.graph.node_ids() {
            if self.registry.contains(node) {
                continue;
            }
            let kind = self
                .graph
                .node(node)
                .and_then(|n| self.config.kind_for_class(&n.class));
            match kind {
                None | Some(ControllerKind::Category) => continue,
                Some(_) => {}
            }
            if let Some(kind) = self.attach(node) {
                attached.push((node, kind));
            }
        }
        attached
    }

    /// Detach the controller of `node` and drop its poll registration.
    ///
    /// Call this when the host removes the node. Controllers whose node is
    /// gone are also dropped by the next poll round.
    pub fn detach(&mut self, node: NodeId) -> bool {
        self.scheduler.deregister(node);
        let removed = self.registry.deregister(node).is_some();
        if removed {
            info!(node = node.0, "controller_detached");
        }
        removed
    }

    fn install(&mut self, controller: Controller) {
        let node = controller.node();
        let kind = controller.kind();
        if matches!(kind, ControllerKind::Styles | ControllerKind::Selector) {
            self.scheduler.register(node);
        }
        self.registry.register(controller);
        info!(node = node.0, kind = %kind, "controller_attached");
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Apply a user edit of a widget and react to it.
    ///
    /// User edits always notify, even when the value is unchanged.
    pub fn user_input(
        &mut self,
        node: NodeId,
        widget: &str,
        value: impl Into<WidgetValue>,
    ) -> SyncResult<()> {
        let value = value.into();
        let w = self
            .graph
            .node_mut(node)
            .ok_or(SyncError::NodeNotFound { node_id: node })?
            .widget_mut(widget)
            .ok_or_else(|| SyncError::MissingWidget {
                node_id: node,
                widget: widget.to_string(),
            })?;
        w.value = value.clone();

        let mut fx = Effects::default();
        fx.widget_events.push(WidgetEvent {
            node,
            widget: widget.to_string(),
            value: value.clone(),
            origin: Origin::User,
        });
        if let Some(controller) = self.registry.get_mut(node) {
            controller.on_widget_changed(
                &mut self.graph,
                &self.config,
                widget,
                &value,
                Origin::User,
                &mut fx,
            );
        }
        self.apply_effects(fx);
        Ok(())
    }

    /// Select style slot `index` of `node` as the user would.
    pub fn select_style(&mut self, node: NodeId, index: usize) -> SyncResult<()> {
        let widget = self
            .registry
            .get(node)
            .ok_or(SyncError::ControllerNotFound { node_id: node })?
            .style_widgets()
            .get(index)
            .cloned()
            .ok_or(SyncError::StyleIndexOutOfRange {
                node_id: node,
                index,
            })?;
        self.user_input(node, &widget, true)
    }

    /// Route a chain message starting at controller `start`.
    pub fn route_message(
        &mut self,
        start: NodeId,
        mut message: ChainMessage,
    ) -> SyncResult<RouteReport> {
        if !self.registry.contains(start) {
            return Err(SyncError::ControllerNotFound { node_id: start });
        }
        let mut fx = Effects::default();
        let report = ChainRouter::new(&mut self.registry, &mut self.graph, &self.config, &mut fx)
            .route(start, &mut message);
        self.apply_effects(fx);
        Ok(report)
    }

    /// Push `list` from `producer` to every connected consumer.
    pub fn publish_top_styles(
        &mut self,
        producer: NodeId,
        list: &TopStylesList,
    ) -> SyncResult<Vec<NodeId>> {
        if !self.graph.contains(producer) {
            return Err(SyncError::NodeNotFound { node_id: producer });
        }
        let mut fx = Effects::default();
        let reached = broadcast::publish_top_styles(
            &mut self.registry,
            &mut self.graph,
            &self.config,
            producer,
            list,
            &mut fx,
        );
        self.apply_effects(fx);
        Ok(reached)
    }

    /// Deliver `list` to a single consumer.
    pub fn receive_top_styles(&mut self, consumer: NodeId, list: &TopStylesList) -> SyncResult<bool> {
        let controller = self
            .registry
            .get_mut(consumer)
            .ok_or(SyncError::ControllerNotFound { node_id: consumer })?;
        let mut fx = Effects::default();
        let accepted = controller.receive_top_styles(&mut self.graph, &self.config, list, &mut fx);
        self.apply_effects(fx);
        Ok(accepted)
    }

    /// Poll one controller outside of a scheduled round.
    pub fn poll_tick(&mut self, node: NodeId) -> SyncResult<Vec<ConnectionChange>> {
        let controller = self
            .registry
            .get_mut(node)
            .ok_or(SyncError::ControllerNotFound { node_id: node })?;
        let mut fx = Effects::default();
        let changes = controller.on_poll_tick(&self.graph, &self.config, &mut fx);
        for change in &changes {
            self.connection_observers.notify(&ConnectionEvent {
                node,
                slot: change.slot.clone(),
                previous: change.previous,
                origin: change.origin,
            });
        }
        self.apply_effects(fx);
        Ok(changes)
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Run a poll round if the period has elapsed since the last one.
    pub fn tick(&mut self, now: Instant) -> Option<TickReport> {
        let nodes = self.scheduler.begin_round(now)?;
        Some(self.run_round(nodes))
    }

    /// Run a poll round now, ignoring the period.
    pub fn run_periodic_tasks(&mut self) -> TickReport {
        let nodes = self.scheduler.force_round(Instant::now());
        self.run_round(nodes)
    }

    fn run_round(&mut self, nodes: Vec<NodeId>) -> TickReport {
        let mut report = TickReport {
            round: self.scheduler.rounds(),
            ..Default::default()
        };

        // Controllers that are never polled still go when their node does.
        for node in self.registry.ids() {
            if !self.graph.contains(node) && !nodes.contains(&node) {
                warn!(node = node.0, "stale_controller");
                self.detach(node);
                report.stale.push(node);
            }
        }

        for node in nodes {
            if !self.graph.contains(node) || !self.registry.contains(node) {
                warn!(node = node.0, "stale_poll_registration");
                self.detach(node);
                report.stale.push(node);
                continue;
            }
            report.polled.push(node);
            match self.poll_tick(node) {
                Ok(changes) => report.events.extend(changes.into_iter().map(|c| ConnectionEvent {
                    node,
                    slot: c.slot,
                    previous: c.previous,
                    origin: c.origin,
                })),
                Err(e) => warn!(node = node.0, error = %e, "poll_failed"),
            }
        }

        debug!(
            round = report.round,
            polled = report.polled.len(),
            changes = report.events.len(),
            stale = report.stale.len(),
            "poll_round"
        );
        report
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Observe widget changes made through this coordinator.
    pub fn observe_widgets(&mut self, observer: impl FnMut(&WidgetEvent) + 'static) -> ObserverId {
        self.widget_observers.subscribe(observer)
    }

    /// Observe connection changes found by polling.
    pub fn observe_connections(
        &mut self,
        observer: impl FnMut(&ConnectionEvent) + 'static,
    ) -> ObserverId {
        self.connection_observers.subscribe(observer)
    }

    /// Remove a widget observer.
    pub fn unobserve_widgets(&mut self, id: ObserverId) -> bool {
        self.widget_observers.unsubscribe(id)
    }

    /// Remove a connection observer.
    pub fn unobserve_connections(&mut self, id: ObserverId) -> bool {
        self.connection_observers.unsubscribe(id)
    }

    // =========================================================================
    // Effects
    // =========================================================================

    fn apply_effects(&mut self, fx: Effects) {
        let mut pending = fx;
        loop {
            for event in pending.widget_events.drain(..) {
                self.widget_observers.notify(&event);
            }
            if pending.is_settled() {
                break;
            }

            let mut next = Effects::default();
            for mut message in pending.messages.drain(..) {
                let start = message.sender_id;
                ChainRouter::new(&mut self.registry, &mut self.graph, &self.config, &mut next)
                    .route(start, &mut message);
            }
            for (producer, list) in pending.publications.drain(..) {
                broadcast::publish_top_styles(
                    &mut self.registry,
                    &mut self.graph,
                    &self.config,
                    producer,
                    &list,
                    &mut next,
                );
            }
            for (consumer, producer) in pending.pulls.drain(..) {
                self.pull(consumer, producer, &mut next);
            }
            pending = next;
        }
    }

    fn pull(&mut self, consumer: NodeId, producer: NodeId, fx: &mut Effects) {
        let Some(list) = self
            .registry
            .get(producer)
            .and_then(|p| p.top_styles(&self.graph))
        else {
            return;
        };
        if let Some(controller) = self.registry.get_mut(consumer) {
            controller.receive_top_styles(&mut self.graph, &self.config, &list, fx);
            debug!(
                consumer = consumer.0,
                producer = producer.0,
                names = list.len(),
                "top_styles_pulled"
            );
        }
    }
}

impl<G: HostGraph> fmt::Debug for StyleSync<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleSync")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("scheduler", &self.scheduler)
            .field("widget_observers", &self.widget_observers)
            .field("connection_observers", &self.connection_observers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;
    use style_chain_core::{InputSocket, Node, OutputSocket, StyleGraph, Widget};

    fn styles_node(id: u64) -> Node {
        Node::new(NodeId(id), "MyTop10Styles //ZImage")
            .with_input(InputSocket::new("input", "STRING"))
            .with_input(InputSocket::new("top_styles", "TOP_STYLES"))
            .with_output(OutputSocket::new("output", "STRING"))
            .with_widget(Widget::combo("output_to", "custom_1", vec![]))
            .with_widget(Widget::toggle("style_1", false))
            .with_widget(Widget::toggle("style_2", false))
    }

    #[test]
    fn test_attach_unsupported_and_missing() {
        let mut graph = StyleGraph::new();
        graph.add_node(Node::new(NodeId(1), "KSampler")).unwrap();
        graph.add_node(Node::new(NodeId(2), "MyTop10Styles")).unwrap();
        let mut sync = StyleSync::new(graph);

        assert!(matches!(
            sync.try_attach(NodeId(1)),
            Err(SyncError::UnsupportedNode { .. })
        ));
        assert_eq!(sync.attach(NodeId(2)), None);
        assert_eq!(sync.attach(NodeId(3)), None);
        assert!(sync.registry().is_empty());
        assert!(sync.scheduler().registered().is_empty());
    }

    #[test]
    fn test_attach_registers_poller() {
        let mut graph = StyleGraph::new();
        graph.add_node(styles_node(1)).unwrap();
        let mut sync = StyleSync::new(graph);

        assert_eq!(sync.attach(NodeId(1)), Some(ControllerKind::Styles));
        assert!(sync.scheduler().is_registered(NodeId(1)));
        assert!(sync.detach(NodeId(1)));
        assert!(!sync.scheduler().is_registered(NodeId(1)));
    }

    #[test]
    fn test_user_input_notifies_observers() {
        let mut graph = StyleGraph::new();
        graph.add_node(styles_node(1)).unwrap();
        let mut sync = StyleSync::new(graph);
        sync.attach(NodeId(1));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sync.observe_widgets(move |e| sink.borrow_mut().push((e.widget.clone(), e.origin)));

        sync.select_style(NodeId(1), 0).unwrap();
        sync.select_style(NodeId(1), 1).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                ("style_1".to_string(), Origin::User),
                ("style_2".to_string(), Origin::User),
                ("style_1".to_string(), Origin::Programmatic),
            ]
        );
    }

    #[test]
    fn test_select_style_out_of_range() {
        let mut graph = StyleGraph::new();
        graph.add_node(styles_node(1)).unwrap();
        let mut sync = StyleSync::new(graph);
        sync.attach(NodeId(1));

        assert!(matches!(
            sync.select_style(NodeId(1), 5),
            Err(SyncError::StyleIndexOutOfRange { index: 5, .. })
        ));
        assert!(matches!(
            sync.select_style(NodeId(9), 0),
            Err(SyncError::ControllerNotFound { .. })
        ));
    }

    #[test]
    fn test_tick_respects_period() {
        let mut graph = StyleGraph::new();
        graph.add_node(styles_node(1)).unwrap();
        let mut sync = StyleSync::with_config(graph, SyncConfig::fast());
        sync.attach(NodeId(1));

        let start = Instant::now();
        assert_eq!(sync.tick(start).map(|r| r.round), Some(1));
        assert!(sync.tick(start + Duration::from_millis(10)).is_none());
        assert_eq!(
            sync.tick(start + Duration::from_millis(100)).map(|r| r.polled),
            Some(vec![NodeId(1)])
        );
    }

    #[test]
    fn test_set_config_reaches_scheduler() {
        let mut graph = StyleGraph::new();
        graph.add_node(styles_node(1)).unwrap();
        let mut sync = StyleSync::new(graph);
        sync.attach(NodeId(1));

        let start = Instant::now();
        assert!(sync.tick(start).is_some());
        assert!(sync.tick(start + Duration::from_millis(100)).is_none());

        sync.set_config(SyncConfig::fast()).unwrap();
        assert_eq!(sync.scheduler().period(), SyncConfig::fast().poll_period());
        assert!(sync.tick(start + Duration::from_millis(100)).is_some());

        let invalid = SyncConfig {
            channel_count: 0,
            ..SyncConfig::default()
        };
        assert!(matches!(
            sync.set_config(invalid),
            Err(SyncError::InvalidConfig { .. })
        ));
        assert_eq!(sync.config().channel_count, SyncConfig::fast().channel_count);
    }

    #[test]
    fn test_into_graph_keeps_edits() {
        let mut graph = StyleGraph::new();
        graph.add_node(styles_node(1)).unwrap();
        let mut sync = StyleSync::new(graph);
        sync.attach(NodeId(1));
        sync.select_style(NodeId(1), 1).unwrap();

        let graph = sync.into_graph();
        assert!(graph.widget(NodeId(1), "style_2").unwrap().value.is_selected());
    }

    #[test]
    fn test_unobserve() {
        let mut sync = StyleSync::new(StyleGraph::new());
        let id = sync.observe_connections(|_| {});
        assert!(!sync.unobserve_widgets(id));
        assert!(sync.unobserve_connections(id));
        assert!(!sync.unobserve_connections(id));
    }
}
