/// Messages carried by the [`EventBus`](crate::bus::EventBus).
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Interrupt the named fish. Every poke listener sees every poke and
    /// filters by id itself.
    FishPoke { fish_id: usize },
    /// A fish's behavior machine entered a new state.
    FishStateChanged { fish_id: usize, state: &'static str },
    Resize { cols: u16, rows: u16 },
    Quit,
}

/// Discriminant used to key subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FishPoke,
    FishStateChanged,
    Resize,
    Quit,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::FishPoke { .. } => EventKind::FishPoke,
            Event::FishStateChanged { .. } => EventKind::FishStateChanged,
            Event::Resize { .. } => EventKind::Resize,
            Event::Quit => EventKind::Quit,
        }
    }
}
