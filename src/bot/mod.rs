//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for `FinSight`, including all
//! slash commands, autocomplete handlers, and the shared bot context. Commands
//! only parse input, resolve the caller's [`UserScope`] and format replies; the
//! ledger itself lives in [`crate::core`].

/// Discord command implementations (general, profile, transaction, dashboard, budget, savings, subscription)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::AppConfig,
    core::{money::MonetaryNormalizer, tenant::UserScope, user},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
/// Holds the database connection, the currency normalizer and the loaded settings.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Converts submitted amounts into the reporting currency
    pub normalizer: MonetaryNormalizer,
    /// Settings from config.toml
    pub config: AppConfig,
}

impl BotData {
    /// Creates the shared context from a connection and loaded settings.
    #[must_use]
    pub fn new(database: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            database,
            normalizer: MonetaryNormalizer::from_config(&config),
            config,
        }
    }

    /// Currency every stored amount is expressed in.
    #[must_use]
    pub fn reporting_currency(&self) -> &str {
        self.normalizer.reporting_currency()
    }
}

/// Resolves the command author to a registered user.
///
/// Fails with [`Error::NotFound`] when the author never ran `/register`.
pub async fn caller_scope(ctx: poise::Context<'_, BotData, Error>) -> Result<UserScope> {
    user::authenticate(&ctx.data().database, &ctx.author().id.to_string()).await
}

/// Reply shown to the user for a failed command.
fn user_facing_message(error: &Error) -> String {
    match error {
        Error::NotFound { entity: "user", .. } => {
            "👋 You are not registered yet. Run `/register` first.".to_string()
        }
        Error::Database(_) | Error::Serialization(_) | Error::Framework(_) => {
            "❌ Something went wrong on our side. Nothing was saved, please try again.".to_string()
        }
        other => format!("❌ {other}"),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_validation() || matches!(error, Error::NotFound { .. }) {
                info!("Command `{}` rejected: {error}", ctx.command().name);
            } else {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
            }
            if let Err(e) = ctx.say(user_facing_message(&error)).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the poise framework and runs the Discord client until it stops.
#[instrument(skip_all)]
pub async fn run_bot(token: String, database: DatabaseConnection, config: AppConfig) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::register(),
                commands::profile(),
                commands::salary(),
                commands::spend(),
                commands::dashboard(),
                commands::budget(),
                commands::savings(),
                commands::subscription(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered commands globally");
                Ok(BotData::new(database, config))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_message() {
        let unregistered = Error::not_found("user", "123");
        assert!(user_facing_message(&unregistered).contains("/register"));

        let storage = Error::Database(sea_orm::DbErr::Custom("disk full".to_string()));
        let message = user_facing_message(&storage);
        assert!(message.contains("Nothing was saved"));
        assert!(!message.contains("disk full"));

        let invalid = Error::InvalidAmount { amount: -3.0 };
        assert_eq!(user_facing_message(&invalid), "❌ Invalid amount: -3");
    }
}
