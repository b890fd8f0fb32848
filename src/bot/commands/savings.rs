//! Savings Discord commands - goals, deposits, finishing and cancelling.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, caller_scope, handlers::autocomplete},
        core::{
            report,
            savings::{self as ledger, GoalState},
        },
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Parent command for savings goals.
    #[poise::command(
        slash_command,
        subcommands(
            "savings_add",
            "savings_list",
            "savings_deposit",
            "savings_finish",
            "savings_cancel"
        )
    )]
    pub async fn savings(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Savings command. Available subcommands:\n\
            `/savings add` - Create a goal\n\
            `/savings list` - Show your goals\n\
            `/savings deposit` - Move money into a goal\n\
            `/savings finish` - Close a completed goal\n\
            `/savings cancel` - Close a goal, optionally refunding it";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Creates a savings goal.
    #[poise::command(slash_command, rename = "add")]
    pub async fn savings_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Goal name (e.g., 'Trip')"] name: String,
        #[description = "Target amount"] target: f64,
        #[description = "Amount already saved, recorded as a first deposit"] opening_balance: Option<
            f64,
        >,
    ) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();
        let currency = data.reporting_currency();

        let goal = ledger::create_goal(
            &data.database,
            &scope,
            &name,
            target,
            opening_balance.unwrap_or(0.0),
            currency,
        )
        .await?;

        ctx.say(format!(
            "🎯 Goal **{}** created: {} of {}",
            goal.name,
            report::format_amount(goal.current_amount, currency),
            report::format_amount(goal.target_amount, currency)
        ))
        .await?;
        Ok(())
    }

    /// Lists your savings goals.
    #[poise::command(slash_command, rename = "list")]
    pub async fn savings_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();
        let currency = data.reporting_currency();

        let goals = ledger::list_goals(&data.database, &scope).await?;
        if goals.is_empty() {
            ctx.say("No savings goals yet. Use `/savings add` to start one!")
                .await?;
            return Ok(());
        }

        let mut response = String::from("🎯 **Savings Goals**\n\n");
        for goal in &goals {
            let state = match GoalState::of(goal) {
                GoalState::Active => "⏳",
                GoalState::Completed => "✅",
            };
            let progress = report::used_percent(goal.current_amount, goal.target_amount);
            writeln!(
                &mut response,
                "{state} **{}** {} ({} of {})",
                goal.name,
                report::format_progress_bar(progress, Some(10)),
                report::format_amount(goal.current_amount, currency),
                report::format_amount(goal.target_amount, currency)
            )?;
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Moves money into a savings goal.
    #[poise::command(slash_command, rename = "deposit")]
    pub async fn savings_deposit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Goal to deposit into"]
        #[autocomplete = "autocomplete::autocomplete_goal_name"]
        goal: String,
        #[description = "Amount to deposit"] amount: f64,
    ) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();
        let currency = data.reporting_currency();

        let target = ledger::find_goal_by_name(&data.database, &scope, &goal).await?;
        let key = ctx.id().to_string();
        let receipt =
            ledger::deposit(&data.database, &scope, target.id, amount, currency, Some(&key))
                .await?;

        let mut response = format!(
            "💰 Deposited {} into **{}**. Saved: {} of {}",
            report::format_amount(amount, currency),
            receipt.goal.name,
            report::format_amount(receipt.current_amount(), currency),
            report::format_amount(receipt.goal.target_amount, currency)
        );
        if receipt.state() == GoalState::Completed {
            response.push_str("\n🎉 Goal reached! Close it with `/savings finish`.");
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Closes a completed goal. The saved money counts as spent.
    #[poise::command(slash_command, rename = "finish")]
    pub async fn savings_finish(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Goal to finish"]
        #[autocomplete = "autocomplete::autocomplete_goal_name"]
        goal: String,
    ) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();

        let target = ledger::find_goal_by_name(&data.database, &scope, &goal).await?;
        let finished = ledger::finish(&data.database, &scope, target.id).await?;

        ctx.say(format!(
            "🏁 Goal **{}** finished with {} saved.",
            finished.name,
            report::format_amount(finished.current_amount, data.reporting_currency())
        ))
        .await?;
        Ok(())
    }

    /// Closes a goal. With `refund`, the saved money returns to your balance.
    #[poise::command(slash_command, rename = "cancel")]
    pub async fn savings_cancel(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Goal to cancel"]
        #[autocomplete = "autocomplete::autocomplete_goal_name"]
        goal: String,
        #[description = "Return the saved money to your balance (default: yes)"] refund: Option<
            bool,
        >,
    ) -> Result<()> {
        let scope = caller_scope(ctx).await?;
        let data = ctx.data();
        let currency = data.reporting_currency();

        let target = ledger::find_goal_by_name(&data.database, &scope, &goal).await?;
        let outcome = ledger::cancel(
            &data.database,
            &scope,
            target.id,
            refund.unwrap_or(true),
            currency,
        )
        .await?;

        let message = outcome.refund.map_or_else(
            || format!("🗑️ Goal **{}** cancelled.", outcome.goal.name),
            |entry| {
                format!(
                    "↩️ Goal **{}** cancelled. Refunded {}.",
                    outcome.goal.name,
                    report::format_amount(-entry.amount_in_reporting, currency)
                )
            },
        );

        ctx.say(message).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
