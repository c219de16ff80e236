//! Cloneable façade for issuing commands to the runtime.
//!
//! [`CombatHandle`] hides channel plumbing and offers async helpers for
//! driving turns, answering reaction windows, or streaming events from
//! specific topics.
use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};

use combat_core::{
    AbilityAvailability, ActionKind, CombatSnapshot, CombatView, CombatantId,
};

use super::errors::{Result, RuntimeError};
use crate::ai::DecisionPlan;
use crate::events::{Event, EventBus, Topic};
use crate::workers::{AdvanceReport, Command};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct CombatHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl CombatHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Drives the current turn according to the execution mode.
    pub async fn advance(&self) -> Result<AdvanceReport> {
        self.request(|reply| Command::Advance { reply }).await?
    }

    /// Starts the waiting player's turn with `plan`.
    pub async fn submit_player_plan(&self, plan: DecisionPlan) -> Result<AdvanceReport> {
        self.request(|reply| Command::SubmitPlayerPlan { plan, reply })
            .await?
    }

    /// Answers a paused reaction window for `reactor`. `None` declines.
    pub async fn submit_reaction(
        &self,
        reactor: CombatantId,
        reaction: Option<ActionKind>,
    ) -> Result<()> {
        self.request(|reply| Command::SubmitReaction {
            reactor,
            reaction,
            reply,
        })
        .await?
    }

    pub async fn query_view(&self) -> Result<CombatView> {
        self.request(|reply| Command::QueryView { reply }).await
    }

    pub async fn available_actions(&self, id: CombatantId) -> Result<Vec<ActionKind>> {
        self.request(|reply| Command::AvailableActions { id, reply })
            .await
    }

    pub async fn ability_availability(
        &self,
        id: CombatantId,
        kind: ActionKind,
    ) -> Result<AbilityAvailability> {
        self.request(|reply| Command::Availability { id, kind, reply })
            .await
    }

    pub async fn export_snapshot(&self) -> Result<CombatSnapshot> {
        self.request(|reply| Command::ExportSnapshot { reply })
            .await?
    }

    /// Plan the AI would follow for `actor` in the current state.
    pub async fn suggest_plan(&self, actor: CombatantId) -> Result<DecisionPlan> {
        self.request(|reply| Command::SuggestPlan { actor, reply })
            .await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Turn` - Turn starts, plans, executed phases, completed turns
    /// - `Topic::Log` - Combat log entries
    /// - `Topic::Reaction` - Reaction windows awaiting players and resolutions
    /// - `Topic::Outcome` - Final outcome
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut log_rx = handle.subscribe(Topic::Log);
    /// while let Ok(event) = log_rx.recv().await {
    ///     // Render log entries
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }
}
