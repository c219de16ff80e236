//! Behavioural profiles that modulate AI scoring and ship stats.
//!
//! - [`PersonalityProfile`]: weighted biases and thresholds, adjusted per
//!   decision by [`SituationalFactors`].
//! - [`TierProfile`]: experience-tier stat multipliers and AI-quality knobs.

mod experience;
mod personality;

pub use experience::{ExperienceTier, TargetStrategy, TierProfile};
pub use personality::{
    PersonalityKind, PersonalityProfile, SituationalFactors, SituationalModifier,
};
