//! Listener registry for synchronous change notification
//!
//! Key principles:
//! - Listeners run synchronously, in registration order
//! - Registration returns an id used for later removal
//! - Removing an unknown id reports `false` and changes nothing

use std::fmt;

/// Identifier returned by [`ListenerRegistry::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

/// Ordered set of callbacks notified with an event value
pub struct ListenerRegistry<E> {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener<E>)>,
}

impl<E> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ListenerRegistry<E> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a listener. Ids are never reused within one registry.
    pub fn add<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&E) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener, returning whether it was registered
    pub fn remove(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|(existing, _)| *existing == id) {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Invoke every listener with `event`
    pub fn notify(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E> fmt::Debug for ListenerRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_notifies_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ListenerRegistry::<u32>::new();

        let first = Rc::clone(&seen);
        registry.add(move |value| first.borrow_mut().push(("first", *value)));
        let second = Rc::clone(&seen);
        registry.add(move |value| second.borrow_mut().push(("second", *value)));

        registry.notify(&7);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_remove_stops_notifications() {
        let count = Rc::new(RefCell::new(0));
        let mut registry = ListenerRegistry::<()>::new();
        let counter = Rc::clone(&count);
        let id = registry.add(move |_| *counter.borrow_mut() += 1);

        registry.notify(&());
        assert!(registry.remove(id));
        registry.notify(&());

        assert_eq!(*count.borrow(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_id_is_harmless() {
        let mut registry = ListenerRegistry::<()>::new();
        let id = registry.add(|_| {});
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(!registry.remove(ListenerId(42)));
    }
}
