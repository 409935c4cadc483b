use foundation::time::Millis;

use crate::frame::Tick;

/// A published event, stamped with the tick it happened on.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    pub tick_index: u64,
    pub at: Millis,
    pub payload: E,
}

/// Ordered outbox of events for any listener that cares.
///
/// Producers emit; consumers either peek with [`EventBus::events`] or take
/// ownership with [`EventBus::drain`].
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<Event<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, tick: Tick, at: Millis, payload: E) {
        self.events.push(Event {
            tick_index: tick.index,
            at,
            payload,
        });
    }

    pub fn events(&self) -> &[Event<E>] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event<E>> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use crate::frame::Tick;
    use foundation::time::Millis;

    #[test]
    fn records_events_with_tick_index() {
        let mut bus = EventBus::new();
        bus.emit(Tick::new(2, Millis(32)), Millis(30), "hello");
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].tick_index, 2);
        assert_eq!(bus.events()[0].at, Millis(30));
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(Tick::new(0, Millis(0)), Millis(0), 1);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
    }
}
