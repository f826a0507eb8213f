//! Explicit subscribe/unsubscribe for host event sources.
//!
//! The host owns the scroll container and the media element. A session asks for
//! the topics its machine consumes when it mounts and must hand every
//! subscription back when it is torn down.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    Scroll,
    MediaTime,
    MediaEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A host-side source of DOM/media style events.
pub trait EventSource {
    fn subscribe(&mut self, topic: EventTopic) -> ListenerId;
    fn unsubscribe(&mut self, id: ListenerId);
}

/// Subscriptions held by one session.
#[derive(Debug, Default)]
pub struct Subscriptions {
    held: Vec<(EventTopic, ListenerId)>,
}

impl Subscriptions {
    pub fn attach(source: &mut dyn EventSource, topics: &[EventTopic]) -> Self {
        let held = topics
            .iter()
            .map(|&topic| (topic, source.subscribe(topic)))
            .collect();
        Self { held }
    }

    /// Unsubscribe everything. Returns how many listeners were released.
    pub fn release(&mut self, source: &mut dyn EventSource) -> usize {
        let released = self.held.len();
        for (_, id) in self.held.drain(..) {
            source.unsubscribe(id);
        }
        released
    }

    #[must_use]
    pub fn topics(&self) -> Vec<EventTopic> {
        self.held.iter().map(|(topic, _)| *topic).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

/// In-process event source bookkeeping.
///
/// Used by the terminal host, which routes its own events, and by tests that
/// assert no listener outlives its session.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    live: HashMap<ListenerId, EventTopic>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_subscribed(&self, topic: EventTopic) -> bool {
        self.live.values().any(|t| *t == topic)
    }
}

impl EventSource for ListenerRegistry {
    fn subscribe(&mut self, topic: EventTopic) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.live.insert(id, topic);
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        if self.live.remove(&id).is_none() {
            tracing::debug!(listener = id.value(), "unsubscribe for unknown listener");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_and_release_balance() {
        let mut registry = ListenerRegistry::new();
        let mut subs = Subscriptions::attach(
            &mut registry,
            &[EventTopic::MediaTime, EventTopic::MediaEnded],
        );
        assert_eq!(registry.live_count(), 2);
        assert!(registry.is_subscribed(EventTopic::MediaEnded));
        assert!(!registry.is_subscribed(EventTopic::Scroll));

        assert_eq!(subs.release(&mut registry), 2);
        assert_eq!(registry.live_count(), 0);
        assert!(subs.is_empty());
        assert_eq!(subs.release(&mut registry), 0);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut registry = ListenerRegistry::new();
        let a = registry.subscribe(EventTopic::Scroll);
        registry.unsubscribe(a);
        let b = registry.subscribe(EventTopic::Scroll);
        assert_ne!(a, b);
    }
}
