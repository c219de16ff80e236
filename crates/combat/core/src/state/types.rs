//! Identity types shared by every combat module.

use core::fmt;

/// Stable identifier of a combatant for the duration of an encounter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl CombatantId {
    /// Numeric value, used as a dice stream discriminator.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allegiance of a combatant. Two combatants are enemies when their factions differ.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Faction(pub String);

impl Faction {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Faction {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Faction {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Who decides this combatant's turns and reactions.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Controller {
    /// A human decides through the host UI.
    Player,
    /// The AI decision engine plans every turn.
    #[default]
    Ai,
}

impl Controller {
    pub const fn is_player(self) -> bool {
        matches!(self, Self::Player)
    }
}

/// Phase of the current combatant's turn, in fixed order.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    #[default]
    Movement,
    Action,
    BonusAction,
    EndTurn,
}

impl TurnPhase {
    /// Next phase within the same turn, or `None` after END_TURN.
    pub const fn next(self) -> Option<TurnPhase> {
        match self {
            Self::Movement => Some(Self::Action),
            Self::Action => Some(Self::BonusAction),
            Self::BonusAction => Some(Self::EndTurn),
            Self::EndTurn => None,
        }
    }
}

/// Participation state of a combatant.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CombatantStatus {
    #[default]
    Active,
    /// Hull reduced to zero.
    Disabled,
    Surrendered,
    /// Left the engagement (fled or accepted a truce).
    Withdrawn,
}

impl CombatantStatus {
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}
