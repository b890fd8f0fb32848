//! General Discord commands - ping and help.
//! These commands don't touch the ledger.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**FinSight Help**\n\
        Every amount is stored in your reporting currency.\n\n\
        **Getting Started**\n\
        • `/register [name]` - Creates your ledger.\n\
        • `/salary <amount>` - Sets your monthly salary.\n\
        • `/profile` - Shows your profile.\n\n\
        **Spending**\n\
        • `/spend <title> <amount> <category> [currency] [date]` - Records an expense.\n\
        • `/dashboard` - Balance, expenses and recent activity.\n\n\
        **Budgets**\n\
        • `/budget add <name> <limit>` - Creates a category, counting past spend.\n\
        • `/budget list` - Shows usage per category.\n\
        • `/budget reproject` - Recomputes every category from the ledger.\n\n\
        **Savings**\n\
        • `/savings add <name> <target> [opening]` - Creates a goal.\n\
        • `/savings deposit <goal> <amount>` - Moves money into a goal.\n\
        • `/savings finish <goal>` - Closes a completed goal.\n\
        • `/savings cancel <goal> [refund]` - Closes a goal, optionally refunding it.\n\
        • `/savings list` - Shows your goals.\n\n\
        **Subscriptions**\n\
        • `/subscription add <name> <amount> [renewal_day]`\n\
        • `/subscription list`\n\
        • `/subscription delete <id>`\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
