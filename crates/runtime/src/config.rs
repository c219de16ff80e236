//! Runtime configuration: AI tuning, execution mode, profile tables.
//!
//! Everything here has a working `Default`; RON files only need to name the
//! fields they override.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use combat_core::{CombatConfig, ExperienceTier, PersonalityKind, PersonalityProfile, TierProfile};
use serde::{Deserialize, Serialize};

use crate::api::{Result, RuntimeError};

/// Strategy adopted when negotiation keeps failing past the recursion cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommsFallback {
    #[default]
    Attack,
    DefensiveStand,
}

/// AI decision engine tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Hard deadline for planning one turn, in milliseconds.
    pub planning_budget_ms: u64,
    /// Turns projected when valuing a weapon/target pair.
    pub projection_horizon: u32,
    /// Negotiation re-entries before the fallback strategy is forced.
    pub comms_recursion_cap: u32,
    pub comms_fallback: CommsFallback,
    /// Shield fraction below which a defensive posture boosts shields.
    pub shield_boost_threshold: f32,
    /// Projected hull fraction below which the next posture is DEFENSIVE.
    pub defensive_posture_hp: f32,
    /// Projected hull fraction at or above which the next posture is OFFENSIVE.
    pub offensive_posture_hp: f32,
    /// Hull fraction at or below which fleeing is considered.
    pub flee_hull: f32,
    /// Hull fraction at or below which surrender is considered.
    pub surrender_hull: f32,
    /// Hit rate counted as poor performance.
    pub poor_hit_rate: f32,
    /// Enemy/ally strength ratio counted as heavily outnumbered.
    pub outnumbered_ratio: f32,
    /// Own/enemy strength ratio counted as dominant.
    pub dominance_ratio: f32,
    /// Seed for mistakes and random target picks.
    pub seed: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            planning_budget_ms: 250,
            projection_horizon: 3,
            comms_recursion_cap: 3,
            comms_fallback: CommsFallback::Attack,
            shield_boost_threshold: 0.5,
            defensive_posture_hp: 0.35,
            offensive_posture_hp: 0.7,
            flee_hull: 0.3,
            surrender_hull: 0.12,
            poor_hit_rate: 0.35,
            outnumbered_ratio: 2.5,
            dominance_ratio: 2.5,
            seed: 0x5eed,
        }
    }
}

impl AiConfig {
    pub fn planning_budget(&self) -> Duration {
        Duration::from_millis(self.planning_budget_ms)
    }
}

/// How an `advance()` call drives the current turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// One `advance()` executes a whole turn.
    #[default]
    RunToCompletion,
    /// One `advance()` executes one phase record.
    PhaseStepped,
}

/// Personality presets and experience tables, with per-entry overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileCatalog {
    pub personalities: BTreeMap<PersonalityKind, PersonalityProfile>,
    pub tiers: BTreeMap<ExperienceTier, TierProfile>,
}

impl ProfileCatalog {
    pub fn personality(&self, kind: PersonalityKind) -> PersonalityProfile {
        self.personalities
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.profile())
    }

    pub fn tier(&self, tier: ExperienceTier) -> TierProfile {
        self.tiers.get(&tier).cloned().unwrap_or_else(|| tier.profile())
    }

    /// Loads a catalogue of overrides from a RON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = read_file(path)?;
        ron::from_str(&content).map_err(|e| RuntimeError::InvalidConfig {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    pub ai: AiConfig,
    pub profiles: ProfileCatalog,
    pub mode: ExecutionMode,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// Log entries included in views returned by the handle.
    pub view_log_tail: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            ai: AiConfig::default(),
            profiles: ProfileCatalog::default(),
            mode: ExecutionMode::RunToCompletion,
            command_buffer_size: 32,
            event_buffer_size: 256,
            view_log_tail: 20,
        }
    }
}

impl RuntimeConfig {
    /// Loads a configuration from a RON file. Missing fields keep defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = read_file(path)?;
        let config: RuntimeConfig = ron::from_str(&content).map_err(|e| RuntimeError::InvalidConfig {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.combat.validate().map_err(|e| RuntimeError::InvalidConfig {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), mode = ?config.mode, "runtime config loaded");
        Ok(config)
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| RuntimeError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults() {
        let config: RuntimeConfig =
            ron::from_str("(mode: PhaseStepped, ai: (planning_budget_ms: 50))").unwrap();
        assert_eq!(config.mode, ExecutionMode::PhaseStepped);
        assert_eq!(config.ai.planning_budget_ms, 50);
        assert_eq!(config.ai.comms_recursion_cap, 3);
        assert_eq!(config.combat, CombatConfig::default());
    }

    #[test]
    fn catalog_falls_back_to_presets() {
        let mut catalog = ProfileCatalog::default();
        let mut tuned = PersonalityKind::Cautious.profile();
        tuned.retreat_hp_pct = 0.9;
        catalog.personalities.insert(PersonalityKind::Cautious, tuned);

        assert_eq!(catalog.personality(PersonalityKind::Cautious).retreat_hp_pct, 0.9);
        assert_eq!(
            catalog.personality(PersonalityKind::Aggressive),
            PersonalityKind::Aggressive.profile()
        );
        assert_eq!(catalog.tier(ExperienceTier::Elite), ExperienceTier::Elite.profile());
    }
}
