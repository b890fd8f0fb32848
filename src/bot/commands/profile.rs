//! Profile Discord commands - `register`, `profile` and `salary`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, caller_scope},
        core::user,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Creates your ledger, or confirms it already exists.
    #[poise::command(slash_command, prefix_command)]
    pub async fn register(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Name to show in reports (defaults to your Discord name)"]
        display_name: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let external_id = ctx.author().id.to_string();
        let name = display_name.unwrap_or_else(|| ctx.author().name.clone());

        let registration = user::register(db, &external_id, &name).await?;
        if registration.created {
            ctx.say(format!(
                "✅ Welcome, **{name}**! Set your monthly salary with `/salary`."
            ))
            .await?;
        } else {
            ctx.say("ℹ️ You are already registered.").await?;
        }
        Ok(())
    }

    /// Shows your profile.
    #[poise::command(slash_command, prefix_command)]
    pub async fn profile(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();
        let profile = user::get_profile(&data.database, &scope).await?;

        let mut response = format!("👤 **{}**\n", profile.display_name);
        writeln!(
            &mut response,
            "💼 Monthly salary: {:.2} {}",
            profile.salary,
            data.reporting_currency()
        )?;
        writeln!(
            &mut response,
            "📅 Member since: {}",
            profile.created_at.format("%Y-%m-%d")
        )?;

        ctx.say(response).await?;
        Ok(())
    }

    /// Sets your monthly salary in the reporting currency.
    #[poise::command(slash_command, prefix_command)]
    pub async fn salary(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Monthly salary"] amount: f64,
    ) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();
        let profile = user::update_salary(&data.database, &scope, amount).await?;

        ctx.say(format!(
            "✅ Monthly salary set to **{:.2} {}**",
            profile.salary,
            data.reporting_currency()
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
