//! Ordered listener lists with identity-based de-duplication.

use std::rc::Rc;

use crate::ActionState;

/// Listener notified when a node completes successfully.
pub type Listener = Rc<dyn Fn()>;

/// Listener notified on every published state transition, as `(new, old)`.
pub type StateListener = Rc<dyn Fn(ActionState, ActionState)>;

struct Entry<F: ?Sized> {
    listener: Rc<F>,
    once: bool,
}

/// Ordered multicast list.
///
/// A listener is identified by its `Rc` allocation: subscribing the same
/// `Rc` twice keeps a single entry, and unsubscribing removes it regardless
/// of how it was registered.
pub struct ObserverList<F: ?Sized> {
    entries: Vec<Entry<F>>,
}

impl<F: ?Sized> ObserverList<F> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a persistent listener. Returns `false` if it was already present.
    pub fn subscribe(&mut self, listener: Rc<F>) -> bool {
        self.insert(listener, false)
    }

    /// Adds a listener that is dropped after its first notification.
    ///
    /// Returns `false` if the listener was already present; an existing
    /// persistent entry stays persistent.
    pub fn subscribe_once(&mut self, listener: Rc<F>) -> bool {
        self.insert(listener, true)
    }

    /// Removes a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, listener: &Rc<F>) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !Rc::ptr_eq(&entry.listener, listener));
        self.entries.len() != before
    }

    pub fn contains(&self, listener: &Rc<F>) -> bool {
        self.entries
            .iter()
            .any(|entry| Rc::ptr_eq(&entry.listener, listener))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of the listeners to notify, in subscription order.
    ///
    /// One-shot entries are removed from the list. Callers invoke the
    /// snapshot after releasing their borrow so listeners may re-enter.
    pub fn take_dispatch(&mut self) -> Vec<Rc<F>> {
        let listeners = self
            .entries
            .iter()
            .map(|entry| Rc::clone(&entry.listener))
            .collect();
        self.entries.retain(|entry| !entry.once);
        listeners
    }

    fn insert(&mut self, listener: Rc<F>, once: bool) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.entries.push(Entry { listener, once });
        true
    }
}

impl<F: ?Sized> Default for ObserverList<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Listener {
        let log = Rc::clone(log);
        Rc::new(move || log.borrow_mut().push(tag))
    }

    fn notify(list: &mut ObserverList<dyn Fn()>) {
        for listener in list.take_dispatch() {
            listener();
        }
    }

    #[test]
    fn duplicate_subscription_is_ignored() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = recorder(&log, "a");

        let mut list: ObserverList<dyn Fn()> = ObserverList::new();
        assert!(list.subscribe(Rc::clone(&a)));
        assert!(!list.subscribe(Rc::clone(&a)));
        assert!(!list.subscribe_once(Rc::clone(&a)));
        assert_eq!(list.len(), 1);

        notify(&mut list);
        notify(&mut list);
        assert_eq!(*log.borrow(), vec!["a", "a"]);
    }

    #[test]
    fn once_listeners_fire_a_single_time_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut list: ObserverList<dyn Fn()> = ObserverList::new();
        list.subscribe(recorder(&log, "persistent"));
        list.subscribe_once(recorder(&log, "once"));

        notify(&mut list);
        notify(&mut list);

        assert_eq!(*log.borrow(), vec!["persistent", "once", "persistent"]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn unsubscribe_by_identity() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = recorder(&log, "a");
        let b = recorder(&log, "b");

        let mut list: ObserverList<dyn Fn()> = ObserverList::new();
        list.subscribe(Rc::clone(&a));
        list.subscribe(Rc::clone(&b));

        assert!(list.unsubscribe(&a));
        assert!(!list.unsubscribe(&a));

        notify(&mut list);
        assert_eq!(*log.borrow(), vec!["b"]);
    }
}
