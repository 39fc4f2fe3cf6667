//! Style selection state machine.
//!
//! Invariant: at most one style widget of a controller holds `true` at any
//! observable instant. Enforcing it writes the other widgets, and each write
//! notifies that widget's handler again; the reentrancy guard turns those
//! nested notifications into no-ops.

use style_chain_core::{HostGraph, NodeId};
use tracing::trace;

use crate::controller::{write_widget, Effects};
use crate::observer::Origin;

/// Result of handling a style widget notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The slot is now the only selected one.
    Selected(usize),
    /// The slot was turned off; nothing to enforce.
    Cleared(usize),
    /// Ignored because an enforcement pass is running.
    Suppressed,
    /// The index does not name a style slot.
    Unknown,
}

/// Exclusive selection over a fixed, ordered set of style widgets.
#[derive(Debug, Clone)]
pub struct StyleSelection {
    widgets: Vec<String>,
    guard_active: bool,
}

impl StyleSelection {
    /// Create a selection over the given widget names.
    pub fn new(widgets: Vec<String>) -> Self {
        Self {
            widgets,
            guard_active: false,
        }
    }

    /// Style widget names in slot order.
    pub fn widgets(&self) -> &[String] {
        &self.widgets
    }

    /// Number of style slots.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// True when there are no style slots.
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Slot index of a widget.
    pub fn index_of(&self, widget: &str) -> Option<usize> {
        self.widgets.iter().position(|w| w == widget)
    }

    /// True while an enforcement pass is running.
    pub fn is_guarded(&self) -> bool {
        self.guard_active
    }

    /// First selected slot, if any.
    pub fn selected(&self, graph: &dyn HostGraph, node: NodeId) -> Option<usize> {
        let n = graph.node(node)?;
        self.widgets
            .iter()
            .position(|name| n.widget(name).is_some_and(|w| w.value.is_selected()))
    }

    /// Number of selected slots.
    pub fn selected_count(&self, graph: &dyn HostGraph, node: NodeId) -> usize {
        let Some(n) = graph.node(node) else {
            return 0;
        };
        self.widgets
            .iter()
            .filter(|name| n.widget(name).is_some_and(|w| w.value.is_selected()))
            .count()
    }

    /// Handle a change notification for slot `index`.
    ///
    /// Turning a slot on selects it and deselects every other slot with a
    /// programmatic origin. Selecting the already selected slot still
    /// reports [`ToggleOutcome::Selected`].
    pub fn on_toggle(
        &mut self,
        graph: &mut dyn HostGraph,
        node: NodeId,
        index: usize,
        value: bool,
        origin: Origin,
        fx: &mut Effects,
    ) -> ToggleOutcome {
        if self.guard_active {
            trace!(node = node.0, index, "selection_guarded");
            return ToggleOutcome::Suppressed;
        }
        if index >= self.widgets.len() {
            return ToggleOutcome::Unknown;
        }
        if !value {
            return ToggleOutcome::Cleared(index);
        }

        self.guard_active = true;
        let chosen = self.widgets[index].clone();
        write_widget(graph, node, &chosen, true.into(), origin, fx);

        for other in 0..self.widgets.len() {
            if other == index {
                continue;
            }
            let name = self.widgets[other].clone();
            if write_widget(graph, node, &name, false.into(), Origin::Programmatic, fx) {
                // the write notifies the widget's own handler
                self.on_toggle(graph, node, other, false, Origin::Programmatic, fx);
            }
        }
        self.guard_active = false;

        ToggleOutcome::Selected(index)
    }

    /// Deselect every slot. Returns how many slots changed.
    pub fn deselect_all(&mut self, graph: &mut dyn HostGraph, node: NodeId, fx: &mut Effects) -> usize {
        let was_guarded = self.guard_active;
        self.guard_active = true;

        let mut changed = 0;
        for index in 0..self.widgets.len() {
            let name = self.widgets[index].clone();
            if write_widget(graph, node, &name, false.into(), Origin::Programmatic, fx) {
                self.on_toggle(graph, node, index, false, Origin::Programmatic, fx);
                changed += 1;
            }
        }

        self.guard_active = was_guarded;
        changed
    }
}
