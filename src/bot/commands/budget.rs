//! Budget Discord commands - `budget add`, `budget list` and `budget reproject`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, caller_scope},
        core::{budget as categories, report},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Parent command for budget categories.
    #[poise::command(
        slash_command,
        subcommands("budget_add", "budget_list", "budget_reproject")
    )]
    pub async fn budget(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Budget command. Available subcommands:\n\
            `/budget add` - Create a category (past matching spend is counted)\n\
            `/budget list` - Show usage per category\n\
            `/budget reproject` - Recompute every category from the ledger";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Creates a budget category. Existing expenses with the same category count immediately.
    #[poise::command(slash_command, rename = "add")]
    pub async fn budget_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category name, matched exactly against expense categories"] name: String,
        #[description = "Spending limit"] limit: f64,
    ) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();

        let category = categories::create_category(&data.database, &scope, &name, limit).await?;
        let usage = report::BudgetUsage::of(&category);

        ctx.say(format!(
            "✅ Budget **{}** created with limit {}. Already spent: {}",
            usage.name,
            report::format_amount(usage.limit, data.reporting_currency()),
            report::format_amount(usage.spent, data.reporting_currency())
        ))
        .await?;
        Ok(())
    }

    /// Shows usage per budget category.
    #[poise::command(slash_command, rename = "list")]
    pub async fn budget_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();
        let currency = data.reporting_currency();

        let overview = report::budget_overview(&data.database, &scope).await?;
        if overview.is_empty() {
            ctx.say("No budgets yet. Use `/budget add` to create one!")
                .await?;
            return Ok(());
        }

        let fields: Vec<(String, String, bool)> = overview
            .iter()
            .map(|usage| {
                let status = if usage.is_over_budget() { "🔴" } else { "🟢" };
                (
                    format!("{status} {}", usage.name),
                    format!(
                        "{}\n{} of {} • {} left",
                        report::format_progress_bar(usage.used_percent, Some(12)),
                        report::format_amount(usage.spent, currency),
                        report::format_amount(usage.limit, currency),
                        report::format_amount(usage.remaining, currency)
                    ),
                    false,
                )
            })
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title("**Budgets**")
            .color(0x0058_65F2)
            .fields(fields);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Recomputes every category's spend from the ledger.
    #[poise::command(slash_command, rename = "reproject")]
    pub async fn budget_reproject(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let repaired = categories::reproject_categories(&ctx.data().database, &scope).await?;

        ctx.say(format!(
            "🔄 Recomputed {} budget categor{} from the ledger.",
            repaired.len(),
            if repaired.len() == 1 { "y" } else { "ies" }
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
