//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use combat_core::{CombatLogEntry, CombatOutcome};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{ReactionEvent, TurnEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Turn starts, plans, executed phases, completed turns
    Turn,
    /// Combat log entries in append order
    Log,
    /// Reaction windows awaiting players and their resolutions
    Reaction,
    /// Final outcome of the encounter
    Outcome,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Turn, Topic::Log, Topic::Reaction, Topic::Outcome];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Turn(TurnEvent),
    Log(CombatLogEntry),
    Reaction(ReactionEvent),
    Outcome(CombatOutcome),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Turn(_) => Topic::Turn,
            Event::Log(_) => Topic::Log,
            Event::Reaction(_) => Topic::Reaction,
            Event::Outcome(_) => Topic::Outcome,
        }
    }
}

/// Topic-based event bus
///
/// Every topic gets its own broadcast channel at construction.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity.max(1)).0))
            .collect();
        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Every topic is created up front; a detached receiver just closes.
            None => broadcast::channel(1).1,
        }
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{Faction, OutcomeReason, TurnPhase};

    fn entry(message: &str) -> CombatLogEntry {
        CombatLogEntry {
            round: 1,
            phase: TurnPhase::Action,
            message: message.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut log = bus.subscribe(Topic::Log);
        let mut outcome = bus.subscribe(Topic::Outcome);

        bus.publish(Event::Log(entry("Navy-1 fires railgun")));
        bus.publish(Event::Outcome(CombatOutcome {
            winner: Some(Faction::new("Navy")),
            reason: OutcomeReason::Victory,
            round: 3,
        }));

        let Event::Log(received) = log.recv().await.unwrap() else {
            panic!("log topic delivered a foreign event");
        };
        assert_eq!(received.message, "Navy-1 fires railgun");
        assert!(log.try_recv().is_err());
        assert!(matches!(outcome.recv().await.unwrap(), Event::Outcome(_)));
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(Event::Log(entry("nobody listens")));
        let receivers = bus.subscribe_multiple(&Topic::ALL);
        assert_eq!(receivers.len(), 4);
    }
}
