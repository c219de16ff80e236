//! Common error infrastructure for combat-core.
//!
//! Domain-specific errors (`StateError`, `ActionRejection`) are defined next to
//! the operations that produce them. This module provides the shared severity
//! classification and the [`CombatError`] trait every error type implements.
//!
//! # Failure classes
//!
//! - **Invalid input** (missing weapon, missing target, unknown action) never
//!   surfaces as an `Err` from action execution; it is reported as an
//!   unsuccessful [`crate::action::ActionOutcome`] so turn processing continues.
//! - **Invariant violations** (phase-stepped execution out of order) are
//!   [`ErrorSeverity::Fatal`].
//! - **Resource insufficiency** (no reactions left, ability on cooldown) is an
//!   ordinary negative result with a reason string.

use crate::state::CombatantId;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - retry later or pick an alternative action.
    ///
    /// Examples: ability on cooldown, no reactions left
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: unknown combatant, target required but missing
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: a window resolved twice, budget missing for a combatant
    Internal,

    /// Fatal error - execution cannot continue from this point.
    ///
    /// Examples: phase-stepped executor invoked out of order
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for debugging and diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Combatant that triggered the error (if applicable).
    pub actor: Option<CombatantId>,

    /// Combat round at the time of error.
    pub round: u32,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    /// Creates a new error context for the given round.
    #[must_use]
    pub const fn new(round: u32) -> Self {
        Self {
            actor: None,
            round,
            message: None,
        }
    }

    /// Attaches an actor to this context (builder pattern).
    #[must_use]
    pub const fn with_actor(mut self, actor: CombatantId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
