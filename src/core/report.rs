//! Budget usage reporting.
//!
//! Turns the cached `spent_amount` of each category into structured usage data
//! and text helpers the bot layer can format directly.

use crate::{
    core::{budget::list_categories, event_store::TransactionRecord, tenant::UserScope},
    entities::budget_category,
    errors::Result,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;

/// Usage of one budget category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUsage {
    /// Category id
    pub category_id: i64,
    /// Category name
    pub name: String,
    /// Amount spent so far (reporting currency)
    pub spent: f64,
    /// Spending limit
    pub limit: f64,
    /// Share of the limit already spent, as a percentage
    pub used_percent: f64,
    /// Limit minus spent; negative when over budget
    pub remaining: f64,
}

impl BudgetUsage {
    /// Usage derived from a stored category.
    #[must_use]
    pub fn of(category: &budget_category::Model) -> Self {
        Self {
            category_id: category.id,
            name: category.name.clone(),
            spent: category.spent_amount,
            limit: category.limit_amount,
            used_percent: used_percent(category.spent_amount, category.limit_amount),
            remaining: category.limit_amount - category.spent_amount,
        }
    }

    /// Whether spending exceeded the limit.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.remaining < 0.0
    }
}

/// Usage of every one of the caller's categories, ordered by name.
pub async fn budget_overview<C>(db: &C, scope: &UserScope) -> Result<Vec<BudgetUsage>>
where
    C: ConnectionTrait,
{
    Ok(list_categories(db, scope)
        .await?
        .iter()
        .map(BudgetUsage::of)
        .collect())
}

/// Percentage of `limit` consumed by `spent`.
///
/// - 0% = nothing spent
/// - 100% = limit reached
/// - above 100% = overspent
///
/// A zero limit reports 0% with no spend and 100% otherwise.
#[must_use]
pub fn used_percent(spent: f64, limit: f64) -> f64 {
    if limit.abs() < f64::EPSILON {
        return if spent > 0.0 { 100.0 } else { 0.0 };
    }

    (spent / limit) * 100.0
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based bar like: `[████████░░] 80.0%`. The bar is clamped to
/// 0..=100 but the printed percentage is not.
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // clamped_progress is in [0, 100] and length is small, so the result fits in [0, length]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!(
        "[{}{}] {progress_percent:.1}%",
        "█".repeat(filled),
        "░".repeat(empty)
    )
}

/// Formats an amount with its currency code, e.g. `20.00 ILS` or `-1100.00 ILS`.
#[must_use]
pub fn format_amount(amount: f64, currency: &str) -> String {
    format!("{amount:.2} {currency}")
}

/// One-line summary of a ledger entry for activity feeds.
#[must_use]
pub fn format_entry_summary(record: &TransactionRecord) -> String {
    let converted = if (record.amount - record.amount_in_reporting).abs() > f64::EPSILON {
        format!(" ({})", format_amount(record.amount, &record.currency))
    } else {
        String::new()
    };
    format!(
        "{} | {} | {} | {:.2}{converted}",
        record.date, record.category, record.title, record.amount_in_reporting
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::budget::create_category;
    use crate::test_utils::*;

    #[test]
    fn test_used_percent() {
        assert_eq!(used_percent(0.0, 100.0), 0.0);
        assert_eq!(used_percent(50.0, 100.0), 50.0);
        assert_eq!(used_percent(125.0, 100.0), 125.0);
        assert_eq!(used_percent(0.0, 0.0), 0.0);
        assert_eq!(used_percent(5.0, 0.0), 100.0);
    }

    #[test]
    fn test_format_progress_bar() {
        assert_eq!(format_progress_bar(100.0, Some(10)), "[██████████] 100.0%");
        assert_eq!(format_progress_bar(50.0, Some(10)), "[█████░░░░░] 50.0%");
        assert_eq!(format_progress_bar(0.0, None), "[░░░░░░░░░░] 0.0%");
        // Overspending fills the bar but keeps the real percentage
        assert_eq!(format_progress_bar(150.0, Some(4)), "[████] 150.0%");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(20.0, "ILS"), "20.00 ILS");
        assert_eq!(format_amount(-1100.0, "ILS"), "-1100.00 ILS");
    }

    #[test]
    fn test_format_entry_summary_shows_original_currency() {
        let scope = crate::core::tenant::UserScope::new(1);
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
        let mut record =
            crate::core::transaction::reporting_entry(&scope, "Coffee", 20.0, "Food", date, "ILS");
        assert_eq!(format_entry_summary(&record), "2024-03-01 | Food | Coffee | 20.00");

        record.amount = 10.0;
        record.amount_in_reporting = 37.0;
        record.currency = "USD".to_string();
        assert_eq!(
            format_entry_summary(&record),
            "2024-03-01 | Food | Coffee | 37.00 (10.00 USD)"
        );
    }

    #[tokio::test]
    async fn test_budget_overview() -> Result<()> {
        let (db, scope) = setup_with_user("alice").await?;
        create_category(&db, &scope, "Food", 100.0).await?;
        create_category(&db, &scope, "Fun", 50.0).await?;
        create_test_transaction(&db, &scope, "Groceries", 80.0, "Food").await?;
        create_test_transaction(&db, &scope, "Concert", 75.0, "Fun").await?;

        let overview = budget_overview(&db, &scope).await?;
        assert_eq!(overview.len(), 2);

        let food = &overview[0];
        assert_eq!(food.name, "Food");
        assert_eq!(food.spent, 80.0);
        assert_eq!(food.used_percent, 80.0);
        assert_eq!(food.remaining, 20.0);
        assert!(!food.is_over_budget());

        let fun = &overview[1];
        assert_eq!(fun.remaining, -25.0);
        assert_eq!(fun.used_percent, 150.0);
        assert!(fun.is_over_budget());
        Ok(())
    }
}
