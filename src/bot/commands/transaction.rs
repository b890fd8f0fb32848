//! Transaction Discord commands - `spend`.
//!
//! The Discord interaction id doubles as the idempotency token, so a
//! redelivered interaction records the expense once.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, caller_scope, handlers::autocomplete},
        core::{
            report,
            transaction::{self, DATE_FORMAT, NewTransaction},
        },
        errors::{Error, Result},
    };

    /// Records an expense.
    ///
    /// Foreign currencies are converted once, at write time, into the reporting
    /// currency. Every budget category with the same name counts the expense.
    #[poise::command(slash_command, prefix_command)]
    pub async fn spend(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "What the money was spent on"] title: String,
        #[description = "Amount spent"] amount: f64,
        #[description = "Budget category"]
        #[autocomplete = "autocomplete::autocomplete_category_name"]
        category: String,
        #[description = "Currency code (defaults to the reporting currency)"] currency: Option<
            String,
        >,
        #[description = "Date as YYYY-MM-DD (defaults to today)"] date: Option<String>,
    ) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();

        let currency = currency.unwrap_or_else(|| data.reporting_currency().to_string());
        let date = date.unwrap_or_else(|| chrono::Utc::now().format(DATE_FORMAT).to_string());
        let request = NewTransaction::new(title, amount, currency, category, date)
            .idempotency_key(ctx.id().to_string());

        let record =
            transaction::create_transaction(&data.database, &data.normalizer, &scope, request)
                .await?;

        ctx.say(format!(
            "✅ Recorded **{}** ({})",
            report::format_entry_summary(&record),
            data.reporting_currency()
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
