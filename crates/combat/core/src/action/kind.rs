//! Action keys and their resource classes.

use crate::state::{CombatantId, ResourceKind, TriggeringAction};

/// Every action and reaction in the catalogue.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum ActionKind {
    // Main actions
    FireWeapon,
    Scan,
    Evade,

    // Bonus actions
    BoostShields,
    TargetLock,
    JamSensors,

    // Movement
    MoveCloser,
    MoveFarther,
    Hold,

    // Reactions
    EvasiveManeuvers,
    PointDefense,
    EmergencyShields,
    Counterfire,
}

impl ActionKind {
    pub const REACTIONS: [ActionKind; 4] = [
        Self::EvasiveManeuvers,
        Self::PointDefense,
        Self::EmergencyShields,
        Self::Counterfire,
    ];

    pub const fn cost_class(self) -> ResourceKind {
        match self {
            Self::FireWeapon | Self::Scan | Self::Evade => ResourceKind::Action,
            Self::BoostShields | Self::TargetLock | Self::JamSensors => ResourceKind::BonusAction,
            Self::MoveCloser | Self::MoveFarther | Self::Hold => ResourceKind::Movement,
            Self::EvasiveManeuvers | Self::PointDefense | Self::EmergencyShields | Self::Counterfire => {
                ResourceKind::Reaction
            }
        }
    }

    pub const fn is_reaction(self) -> bool {
        matches!(self.cost_class(), ResourceKind::Reaction)
    }

    pub const fn is_movement(self) -> bool {
        matches!(self.cost_class(), ResourceKind::Movement)
    }
}

/// Input to an action's effect.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionRequest {
    pub actor: CombatantId,
    pub kind: ActionKind,
    pub target: Option<CombatantId>,
    /// Weapon index into the actor's stat snapshot.
    pub weapon: Option<usize>,
    /// Set for reactions: the action being reacted to.
    pub trigger: Option<TriggeringAction>,
}

impl ActionRequest {
    pub fn new(actor: CombatantId, kind: ActionKind) -> Self {
        Self {
            actor,
            kind,
            target: None,
            weapon: None,
            trigger: None,
        }
    }

    pub fn with_target(mut self, target: CombatantId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_weapon(mut self, weapon: usize) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_trigger(mut self, trigger: TriggeringAction) -> Self {
        self.trigger = Some(trigger);
        self
    }
}
