//! Unified error type for the ledger core and the Discord surface.
//!
//! Validation failures are raised before any write, storage faults wrap the
//! underlying `SeaORM` error, and everything else is plumbing.

use poise::serenity_prelude as serenity;
use sea_orm::DbErr;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any write took place.
    #[error("Validation failed: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// Amount is not finite or not positive where a positive amount is required.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// The requested row does not exist or is not owned by the caller.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of row that was looked up (e.g. `"savings goal"`)
        entity: &'static str,
        /// Identifier the caller supplied
        id: String,
    },

    /// A savings goal was finished before reaching its target.
    #[error("Savings goal '{name}' is not complete: {current:.2} of {target:.2}")]
    GoalNotCompleted {
        /// Goal name
        name: String,
        /// Current saved amount
        current: f64,
        /// Target amount
        target: f64,
    },

    /// An optimistic version check kept failing under concurrent writers.
    #[error("Concurrent update conflict on {aggregate}, please retry")]
    Conflict {
        /// Aggregate that could not be updated
        aggregate: String,
    },

    /// An exchange rate provider could not produce a rate.
    #[error("Exchange rate unavailable for {currency}: {reason}")]
    RateUnavailable {
        /// Source currency code
        currency: String,
        /// Why the lookup failed
        reason: String,
    },

    /// Settings could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Storage fault. Nothing was committed.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Event payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing a formatted reply failed.
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// A required environment variable is missing.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error.
    #[error("Discord framework error: {0}")]
    Framework(Box<serenity::Error>),
}

impl From<serenity::Error> for Error {
    fn from(value: serenity::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the failure was a rejected input, with no state change.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::InvalidAmount { .. } | Self::GoalNotCompleted { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
