//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions come only from the caller's own data. Unregistered callers and
//! storage failures simply get no suggestions.

use crate::{
    bot::{BotData, caller_scope},
    core::{budget, savings},
    errors::Error,
};

/// Discord accepts at most 25 autocomplete choices.
const MAX_CHOICES: usize = 25;

/// Names containing `partial` (case-insensitive), deduplicated and sorted.
#[must_use]
pub fn matching_names(names: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.trim().to_lowercase();

    let mut matching: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .collect();

    matching.sort();
    matching.dedup();
    matching.truncate(MAX_CHOICES);
    matching
}

/// Suggests the caller's budget category names.
///
/// Categories are matched exactly when an expense is recorded, so offering the
/// existing spelling keeps expenses and budgets aligned.
pub async fn autocomplete_category_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(scope) = caller_scope(ctx).await else {
        return Vec::new();
    };
    let Ok(categories) = budget::list_categories(&ctx.data().database, &scope).await else {
        return Vec::new();
    };

    matching_names(categories.into_iter().map(|c| c.name), partial)
}

/// Suggests the caller's savings goal names.
pub async fn autocomplete_goal_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(scope) = caller_scope(ctx).await else {
        return Vec::new();
    };
    let Ok(goals) = savings::list_goals(&ctx.data().database, &scope).await else {
        return Vec::new();
    };

    matching_names(goals.into_iter().map(|g| g.name), partial)
}
