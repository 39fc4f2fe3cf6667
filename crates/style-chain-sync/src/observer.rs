//! Ordered observer lists for widget and connection events.

use std::fmt;

use style_chain_core::{NodeId, WidgetValue};

/// Who caused a widget change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Direct user interaction.
    User,
    /// Enforcement by a controller. Listeners must not treat it as user input.
    Programmatic,
}

/// A widget value change.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetEvent {
    /// Node owning the widget.
    pub node: NodeId,
    /// Widget name.
    pub widget: String,
    /// New value.
    pub value: WidgetValue,
    /// Cause of the change.
    pub origin: Origin,
}

/// A change of the node connected to a watched input slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    /// Node owning the input slot.
    pub node: NodeId,
    /// Input slot name.
    pub slot: String,
    /// Previously observed origin node.
    pub previous: Option<NodeId>,
    /// Newly observed origin node, `None` when disconnected.
    pub origin: Option<NodeId>,
}

/// Handle returned by [`ObserverList::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Observers called in registration order.
pub struct ObserverList<E> {
    observers: Vec<(ObserverId, Box<dyn FnMut(&E)>)>,
    next_id: u64,
}

impl<E> Default for ObserverList<E> {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E> ObserverList<E> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer after all existing ones.
    pub fn subscribe(&mut self, observer: impl FnMut(&E) + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Call every observer with `event`.
    pub fn notify(&mut self, event: &E) {
        for (_, observer) in &mut self.observers {
            observer(event);
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<E> fmt::Debug for ObserverList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_registration_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut list: ObserverList<u32> = ObserverList::new();

        let first = Rc::clone(&calls);
        list.subscribe(move |e| first.borrow_mut().push(("first", *e)));
        let second = Rc::clone(&calls);
        list.subscribe(move |e| second.borrow_mut().push(("second", *e)));

        list.notify(&7);
        assert_eq!(*calls.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut list: ObserverList<()> = ObserverList::new();

        let c = Rc::clone(&count);
        let id = list.subscribe(move |_| *c.borrow_mut() += 1);
        list.notify(&());
        assert!(list.unsubscribe(id));
        assert!(!list.unsubscribe(id));
        list.notify(&());

        assert_eq!(*count.borrow(), 1);
        assert!(list.is_empty());
    }
}
