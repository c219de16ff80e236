//! Append-only combat log.
//!
//! The log is the durable record of an encounter: every state mutation that
//! matters to a reader (spends, damage, reactions, phase changes) appends an
//! entry here and mirrors it to `tracing`.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::state::TurnPhase;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatLogEntry {
    pub round: u32,
    pub phase: TurnPhase,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatLog {
    entries: VecDeque<CombatLogEntry>,
    capacity: Option<usize>,
    /// Entries ever appended, including dropped ones.
    total: u64,
}

impl CombatLog {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            total: 0,
        }
    }

    pub fn push(&mut self, round: u32, phase: TurnPhase, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(target: "combat_log", round, %phase, "{message}");
        self.entries.push_back(CombatLogEntry {
            round,
            phase,
            message,
            timestamp: Utc::now(),
        });
        self.total += 1;
        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_front();
            }
        }
    }

    /// Last `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<CombatLogEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CombatLogEntry> {
        self.entries.iter()
    }

    /// Entries appended after the first `since` (by total count).
    pub fn since(&self, since: u64) -> Vec<CombatLogEntry> {
        let dropped = self.total - self.entries.len() as u64;
        let start = since.saturating_sub(dropped) as usize;
        self.entries.iter().skip(start).cloned().collect()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any retained entry contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_drops_oldest() {
        let mut log = CombatLog::new(Some(2));
        log.push(1, TurnPhase::Movement, "a");
        log.push(1, TurnPhase::Action, "b");
        log.push(1, TurnPhase::Action, "c");
        assert_eq!(log.len(), 2);
        assert_eq!(log.total(), 3);
        assert_eq!(log.tail(5)[0].message, "b");
        assert_eq!(log.since(2).len(), 1);
    }

    #[test]
    fn timestamps_are_monotonic() {
        let mut log = CombatLog::new(None);
        for i in 0..5 {
            log.push(1, TurnPhase::Movement, format!("entry {i}"));
        }
        let stamps: Vec<_> = log.entries().map(|e| e.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        assert!(log.contains("entry 3"));
    }
}
