//! Dashboard Discord command.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, caller_scope},
        core::{dashboard, event_store::EntryStatus, report},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Shows your balance, this month's expenses and recent activity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn dashboard(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();
        let currency = data.reporting_currency();
        let today = chrono::Utc::now().date_naive();

        let view = dashboard::get_dashboard(
            &data.database,
            &scope,
            today,
            currency,
            data.config.recent_activity_limit,
        )
        .await?;

        let mut activity = String::new();
        if view.recent_transactions.is_empty() {
            activity.push_str("_No activity yet_");
        } else {
            for record in &view.recent_transactions {
                let marker = match record.status {
                    EntryStatus::Confirmed => "•",
                    EntryStatus::Subscription => "🔁",
                };
                writeln!(
                    &mut activity,
                    "{marker} {}",
                    report::format_entry_summary(record)
                )?;
            }
        }

        let color = if view.total_balance < 0.0 {
            0x00ED_4245 // red
        } else {
            0x0057_F287 // green
        };

        let embed = serenity::CreateEmbed::default()
            .title("📊 Dashboard")
            .color(color)
            .field(
                "Balance",
                report::format_amount(view.total_balance, currency),
                true,
            )
            .field(
                "Expenses",
                report::format_amount(view.monthly_expenses, currency),
                true,
            )
            .field(
                "Subscriptions",
                report::format_amount(view.subscriptions_total, currency),
                true,
            )
            .field("Recent activity", activity, false)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Salary {} • {}",
                report::format_amount(view.salary, currency),
                today.format("%B %Y")
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
