use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use crate::event::{Event, EventKind};
use crate::signal::{Signal, SlotId};

#[derive(Default)]
struct BusInner {
    queue: VecDeque<Event>,
    listeners: HashMap<EventKind, Signal<Event>>,
}

// A kind's signal stays in the table once created so its slot ids are
// never reissued to a later listener.
impl BusInner {
    fn remove(&mut self, kind: EventKind, slot: SlotId) -> bool {
        self.listeners
            .get_mut(&kind)
            .is_some_and(|signal| signal.remove(slot))
    }

    fn is_subscribed(&self, kind: EventKind, slot: SlotId) -> bool {
        self.listeners
            .get(&kind)
            .is_some_and(|signal| signal.contains(slot))
    }
}

/// A FIFO event queue with typed subscriptions.
///
/// The frame loop uses the bus in a three-phase cycle:
/// 1. **Publish**: input handlers, views and commands push events.
/// 2. **Dispatch**: pending events are delivered, in order, to the
///    listeners subscribed to their [`EventKind`].
/// 3. **React**: [`dispatch`](EventBus::dispatch) hands the same events back
///    so the shell can act on quit and resize.
///
/// The handle is cheap to clone; clones share one queue and one listener
/// table. Everything runs on a single thread.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event for the next dispatch.
    pub fn publish(&self, event: Event) {
        tracing::trace!(?event, "publish");
        self.inner.borrow_mut().queue.push_back(event);
    }

    /// Listen for every event of `kind` until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe(&self, kind: EventKind, listener: impl FnMut(&Event) + 'static) -> Subscription {
        let slot = self
            .inner
            .borrow_mut()
            .listeners
            .entry(kind)
            .or_default()
            .add(listener);
        self.subscription(kind, slot)
    }

    /// Like [`subscribe`](Self::subscribe) but the listener is removed
    /// before its first delivery.
    pub fn subscribe_once(
        &self,
        kind: EventKind,
        listener: impl FnMut(&Event) + 'static,
    ) -> Subscription {
        let slot = self
            .inner
            .borrow_mut()
            .listeners
            .entry(kind)
            .or_default()
            .add_once(listener);
        self.subscription(kind, slot)
    }

    /// Deliver all pending events and return them in publish order.
    ///
    /// Events published while listeners run stay queued for the next call.
    pub fn dispatch(&self) -> Vec<Event> {
        let events: Vec<Event> = self.inner.borrow_mut().queue.drain(..).collect();
        for event in &events {
            let kind = event.kind();
            let deliveries = match self.inner.borrow().listeners.get(&kind) {
                Some(signal) => signal.snapshot(),
                None => continue,
            };
            for (slot, once, listener) in deliveries {
                // an earlier listener may have unsubscribed this one
                let live = {
                    let mut inner = self.inner.borrow_mut();
                    if once {
                        inner.remove(kind, slot)
                    } else {
                        inner.is_subscribed(kind, slot)
                    }
                };
                if live {
                    (&mut *listener.borrow_mut())(event);
                }
            }
        }
        events
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().queue.is_empty()
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(&kind)
            .map_or(0, Signal::len)
    }

    fn subscription(&self, kind: EventKind, slot: SlotId) -> Subscription {
        Subscription {
            bus: Rc::downgrade(&self.inner),
            kind,
            slot,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    kind: EventKind,
    slot: SlotId,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        match bus.try_borrow_mut() {
            Ok(mut inner) => {
                inner.remove(self.kind, self.slot);
            }
            Err(_) => tracing::warn!(kind = ?self.kind, "event bus busy; listener left attached"),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter(bus: &EventBus, kind: EventKind) -> (Rc<Cell<usize>>, Subscription) {
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let sub = bus.subscribe(kind, move |_| seen.set(seen.get() + 1));
        (hits, sub)
    }

    #[test]
    fn publish_enqueues_events() {
        let bus = EventBus::new();
        bus.publish(Event::FishPoke { fish_id: 1 });
        bus.publish(Event::Quit);
        assert!(bus.has_pending());
    }

    #[test]
    fn dispatch_returns_all_and_empties() {
        let bus = EventBus::new();
        bus.publish(Event::Resize { cols: 80, rows: 24 });
        bus.publish(Event::Quit);
        let events = bus.dispatch();
        assert_eq!(events.len(), 2);
        assert!(!bus.has_pending());
        assert!(bus.dispatch().is_empty());
    }

    #[test]
    fn preserves_order() {
        let bus = EventBus::new();
        bus.publish(Event::FishPoke { fish_id: 3 });
        bus.publish(Event::Resize { cols: 10, rows: 5 });
        bus.publish(Event::Quit);
        let events = bus.dispatch();
        assert!(matches!(events[0], Event::FishPoke { fish_id: 3 }));
        assert!(matches!(events[1], Event::Resize { cols: 10, rows: 5 }));
        assert!(matches!(events[2], Event::Quit));
    }

    #[test]
    fn listeners_only_see_their_kind() {
        let bus = EventBus::new();
        let (pokes, _poke_sub) = counter(&bus, EventKind::FishPoke);
        let (quits, _quit_sub) = counter(&bus, EventKind::Quit);
        bus.publish(Event::FishPoke { fish_id: 0 });
        bus.publish(Event::FishPoke { fish_id: 1 });
        bus.dispatch();
        assert_eq!(pokes.get(), 2);
        assert_eq!(quits.get(), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let (hits, sub) = counter(&bus, EventKind::FishPoke);
        assert_eq!(bus.subscriber_count(EventKind::FishPoke), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(EventKind::FishPoke), 0);
        bus.publish(Event::FishPoke { fish_id: 0 });
        bus.dispatch();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn explicit_unsubscribe() {
        let bus = EventBus::new();
        let (hits, sub) = counter(&bus, EventKind::Quit);
        sub.unsubscribe();
        bus.publish(Event::Quit);
        bus.dispatch();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn subscribe_once_fires_once() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let _sub = bus.subscribe_once(EventKind::Quit, move |_| seen.set(seen.get() + 1));
        bus.publish(Event::Quit);
        bus.publish(Event::Quit);
        bus.dispatch();
        assert_eq!(hits.get(), 1);
        assert_eq!(bus.subscriber_count(EventKind::Quit), 0);
    }

    #[test]
    fn publishing_from_a_listener_defers_to_next_dispatch() {
        let bus = EventBus::new();
        let relay = bus.clone();
        let _sub = bus.subscribe(EventKind::Resize, move |_| relay.publish(Event::Quit));
        bus.publish(Event::Resize { cols: 1, rows: 1 });
        let first = bus.dispatch();
        assert_eq!(first.len(), 1);
        assert!(bus.has_pending());
        assert_eq!(bus.dispatch(), vec![Event::Quit]);
    }

    #[test]
    fn listener_can_unsubscribe_a_later_listener() {
        let bus = EventBus::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&victim);
        let _killer = bus.subscribe(EventKind::FishPoke, move |_| {
            slot.borrow_mut().take();
        });
        let (hits, sub) = counter(&bus, EventKind::FishPoke);
        *victim.borrow_mut() = Some(sub);

        bus.publish(Event::FishPoke { fish_id: 0 });
        bus.dispatch();
        assert_eq!(hits.get(), 0);
        assert_eq!(bus.subscriber_count(EventKind::FishPoke), 1);
    }

    #[test]
    fn spent_once_handle_leaves_later_listeners_alone() {
        let bus = EventBus::new();
        let once = bus.subscribe_once(EventKind::FishPoke, |_| {});
        bus.publish(Event::FishPoke { fish_id: 0 });
        bus.dispatch();
        assert_eq!(bus.subscriber_count(EventKind::FishPoke), 0);

        let (hits, _sub) = counter(&bus, EventKind::FishPoke);
        drop(once);
        assert_eq!(bus.subscriber_count(EventKind::FishPoke), 1);
        bus.publish(Event::FishPoke { fish_id: 0 });
        bus.dispatch();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn once_listener_unsubscribed_mid_dispatch_stays_silent() {
        let bus = EventBus::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&victim);
        let _killer = bus.subscribe(EventKind::Quit, move |_| {
            slot.borrow_mut().take();
        });
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        *victim.borrow_mut() = Some(bus.subscribe_once(EventKind::Quit, move |_| seen.set(seen.get() + 1)));

        bus.publish(Event::Quit);
        bus.dispatch();
        assert_eq!(hits.get(), 0);
        assert_eq!(bus.subscriber_count(EventKind::Quit), 1);
    }
}
