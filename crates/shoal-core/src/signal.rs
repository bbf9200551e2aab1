use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Identifies one listener slot inside a [`Signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

pub(crate) type Listener<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Slot<T> {
    id: SlotId,
    once: bool,
    listener: Listener<T>,
}

/// A typed multi-listener channel.
///
/// Listeners run in registration order. A listener added with
/// [`add_once`](Signal::add_once) is removed before its first delivery.
pub struct Signal<T> {
    slots: Vec<Slot<T>>,
    next_id: u64,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }

    pub fn add(&mut self, listener: impl FnMut(&T) + 'static) -> SlotId {
        self.insert(Rc::new(RefCell::new(listener)), false)
    }

    pub fn add_once(&mut self, listener: impl FnMut(&T) + 'static) -> SlotId {
        self.insert(Rc::new(RefCell::new(listener)), true)
    }

    /// Remove a listener. Returns `false` if the slot was already gone.
    pub fn remove(&mut self, id: SlotId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        self.slots.len() != before
    }

    pub fn remove_all(&mut self) {
        self.slots.clear();
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Deliver `value` to every listener.
    pub fn dispatch(&mut self, value: &T) {
        for (_, listener) in self.take_listeners() {
            (&mut *listener.borrow_mut())(value);
        }
    }

    /// Every listener in delivery order, with whether it is a once-slot.
    /// The table is left untouched.
    pub(crate) fn snapshot(&self) -> Vec<(SlotId, bool, Listener<T>)> {
        self.slots
            .iter()
            .map(|slot| (slot.id, slot.once, Rc::clone(&slot.listener)))
            .collect()
    }

    /// Snapshot the listeners for one delivery, dropping once-slots from the
    /// table first so they cannot fire twice.
    fn take_listeners(&mut self) -> Vec<(SlotId, Listener<T>)> {
        let snapshot = self
            .slots
            .iter()
            .map(|slot| (slot.id, Rc::clone(&slot.listener)))
            .collect();
        self.slots.retain(|slot| !slot.once);
        snapshot
    }

    fn insert(&mut self, listener: Listener<T>, once: bool) -> SlotId {
        let id = SlotId(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot { id, once, listener });
        id
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Register a listener that buffers every dispatched value for polling.
    ///
    /// Useful when the consumer runs on its own schedule (once per frame)
    /// rather than inside the dispatch.
    pub fn mailbox(&mut self) -> (SlotId, Mailbox<T>) {
        let mailbox = Mailbox::default();
        let inbox = mailbox.clone();
        let id = self.add(move |value: &T| inbox.push(value.clone()));
        (id, mailbox)
    }
}

/// Receiving end created by [`Signal::mailbox`].
pub struct Mailbox<T> {
    queue: Rc<RefCell<VecDeque<T>>>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }
}

impl<T> Mailbox<T> {
    fn push(&self, value: T) {
        self.queue.borrow_mut().push_back(value);
    }

    /// Take every buffered value, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn dispatch_reaches_listeners_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut signal = Signal::new();
        for tag in ["a", "b"] {
            let seen = Rc::clone(&seen);
            signal.add(move |v: &i32| seen.borrow_mut().push(format!("{tag}{v}")));
        }
        signal.dispatch(&1);
        assert_eq!(*seen.borrow(), vec!["a1", "b1"]);
    }

    #[test]
    fn add_once_fires_a_single_time() {
        let hits = Rc::new(Cell::new(0));
        let mut signal = Signal::new();
        let counter = Rc::clone(&hits);
        signal.add_once(move |_: &()| counter.set(counter.get() + 1));
        signal.dispatch(&());
        signal.dispatch(&());
        assert_eq!(hits.get(), 1);
        assert!(signal.is_empty());
    }

    #[test]
    fn remove_detaches_listener() {
        let hits = Rc::new(Cell::new(0));
        let mut signal = Signal::new();
        let counter = Rc::clone(&hits);
        let id = signal.add(move |_: &()| counter.set(counter.get() + 1));
        assert!(signal.contains(id));
        assert!(signal.remove(id));
        assert!(!signal.remove(id));
        signal.dispatch(&());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn remove_all_empties() {
        let mut signal: Signal<u8> = Signal::new();
        signal.add(|_| {});
        signal.add_once(|_| {});
        assert_eq!(signal.len(), 2);
        signal.remove_all();
        assert!(signal.is_empty());
    }

    #[test]
    fn mailbox_buffers_until_drained() {
        let mut signal = Signal::new();
        let (_, mailbox) = signal.mailbox();
        signal.dispatch(&"left");
        signal.dispatch(&"right");
        assert_eq!(mailbox.drain(), vec!["left", "right"]);
        assert!(mailbox.is_empty());
    }
}
