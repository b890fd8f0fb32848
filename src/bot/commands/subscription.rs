//! Subscription Discord commands - `subscription add`, `list` and `delete`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, caller_scope},
        core::{report, subscription as subscriptions},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Parent command for recurring monthly charges.
    #[poise::command(
        slash_command,
        subcommands("subscription_add", "subscription_list", "subscription_delete")
    )]
    pub async fn subscription(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Subscription command. Available subcommands:\n\
            `/subscription add` - Add a monthly charge\n\
            `/subscription list` - Show your subscriptions\n\
            `/subscription delete` - Remove a subscription by id";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds a recurring monthly charge.
    #[poise::command(slash_command, rename = "add")]
    pub async fn subscription_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Service name (e.g., 'Netflix')"] name: String,
        #[description = "Monthly amount in the reporting currency"] amount: f64,
        #[description = "Day of month it renews on (1-31, default 1)"] renewal_day: Option<i32>,
    ) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();

        let created = subscriptions::create_subscription(
            &data.database,
            &scope,
            &name,
            amount,
            renewal_day.unwrap_or(1),
        )
        .await?;

        ctx.say(format!(
            "🔁 Subscription **{}** added: {} renewing on day {} (id {})",
            created.name,
            report::format_amount(created.amount, data.reporting_currency()),
            created.renewal_day,
            created.id
        ))
        .await?;
        Ok(())
    }

    /// Lists your subscriptions.
    #[poise::command(slash_command, rename = "list")]
    pub async fn subscription_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();
        let currency = data.reporting_currency();

        let subs = subscriptions::list_subscriptions(&data.database, &scope).await?;
        if subs.is_empty() {
            ctx.say("No subscriptions yet. Use `/subscription add` to add one!")
                .await?;
            return Ok(());
        }

        let total: f64 = subs.iter().map(|s| s.amount).sum();
        let mut response = String::from("🔁 **Subscriptions**\n\n");
        for sub in &subs {
            writeln!(
                &mut response,
                "`#{}` **{}** - {} on day {}",
                sub.id,
                sub.name,
                report::format_amount(sub.amount, currency),
                sub.renewal_day
            )?;
        }
        writeln!(
            &mut response,
            "\nMonthly total: {}",
            report::format_amount(total, currency)
        )?;

        ctx.say(response).await?;
        Ok(())
    }

    /// Removes a subscription.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn subscription_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Subscription id from `/subscription list`"] id: i64,
    ) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        subscriptions::delete_subscription(&ctx.data().database, &scope, id).await?;

        ctx.say(format!("🗑️ Subscription #{id} deleted.")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
