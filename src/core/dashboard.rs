//! Dashboard aggregation.
//!
//! Every read re-scans the caller's log. Subscriptions are turned into one
//! virtual charge each for the current calendar month; those rows are returned
//! but never persisted. [`summarize`] is pure, so the same inputs and `as_of`
//! date always give the same dashboard.

use crate::{
    core::{
        event_store::{self, EntryStatus, TransactionRecord},
        subscription::list_subscriptions,
        tenant::UserScope,
        user::get_profile,
    },
    entities::subscription,
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::instrument;

/// Default length of the recent-activity feed.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Category label of virtual subscription charges.
pub const SUBSCRIPTIONS_CATEGORY: &str = "subscriptions";

/// Aggregated view of a user's finances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Monthly salary the balance is computed from
    pub salary: f64,
    /// Salary minus real spend minus this month's subscription charges
    pub total_balance: f64,
    /// Sum of the normalized amounts of real ledger entries only
    pub monthly_expenses: f64,
    /// Sum of this month's virtual subscription charges
    pub subscriptions_total: f64,
    /// Most recent entries, real and virtual, newest first
    pub recent_transactions: Vec<TransactionRecord>,
}

/// Virtual charge of `subscription` for the month containing `as_of`.
#[must_use]
pub fn virtual_subscription_charge(
    subscription: &subscription::Model,
    as_of: NaiveDate,
    reporting_currency: &str,
) -> TransactionRecord {
    let first_of_month = as_of.with_day(1).unwrap_or(as_of);
    TransactionRecord {
        id: format!(
            "sub-{}-{}",
            subscription.id,
            first_of_month.format("%Y-%m")
        ),
        user_id: subscription.user_id,
        title: subscription.name.clone(),
        amount: subscription.amount,
        amount_in_reporting: subscription.amount,
        currency: reporting_currency.to_string(),
        category: SUBSCRIPTIONS_CATEGORY.to_string(),
        date: first_of_month,
        status: EntryStatus::Subscription,
        idempotency_key: None,
    }
}

/// Builds the dashboard from already-loaded inputs.
///
/// `records` must be in creation order. The merged feed is sorted stably by
/// date, newest first, so entries sharing a date keep creation order with real
/// entries ahead of virtual ones.
#[must_use]
pub fn summarize(
    salary: f64,
    records: Vec<TransactionRecord>,
    subscriptions: &[subscription::Model],
    as_of: NaiveDate,
    reporting_currency: &str,
    limit: usize,
) -> Dashboard {
    let monthly_expenses: f64 = records.iter().map(|r| r.amount_in_reporting).sum();

    let charges: Vec<TransactionRecord> = subscriptions
        .iter()
        .map(|s| virtual_subscription_charge(s, as_of, reporting_currency))
        .collect();
    let subscriptions_total: f64 = charges.iter().map(|c| c.amount_in_reporting).sum();

    let mut feed = records;
    feed.extend(charges);
    feed.sort_by(|a, b| b.date.cmp(&a.date));
    feed.truncate(limit);

    Dashboard {
        salary,
        total_balance: salary - (monthly_expenses + subscriptions_total),
        monthly_expenses,
        subscriptions_total,
        recent_transactions: feed,
    }
}

/// Loads the caller's profile, log and subscriptions and summarizes them.
#[instrument(skip(db))]
pub async fn get_dashboard(
    db: &DatabaseConnection,
    scope: &UserScope,
    as_of: NaiveDate,
    reporting_currency: &str,
    limit: usize,
) -> Result<Dashboard> {
    let profile = get_profile(db, scope).await?;
    let records = event_store::transaction_records(db, scope).await?;
    let subscriptions = list_subscriptions(db, scope).await?;

    Ok(summarize(
        profile.salary,
        records,
        &subscriptions,
        as_of,
        reporting_currency,
        limit,
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{
        savings,
        subscription::create_subscription,
        transaction::{NewTransaction, create_transaction, reporting_entry},
    };
    use crate::test_utils::*;

    fn march_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn test_coffee_dashboard() -> Result<()> {
        let db = setup_test_db().await?;
        let scope = create_user_with_salary(&db, "alice", 10000.0).await?;
        create_test_transaction(&db, &scope, "Coffee", 20.0, "Food").await?;

        let dashboard = get_dashboard(&db, &scope, march_15(), "ILS", 5).await?;
        assert_eq!(dashboard.monthly_expenses, 20.0);
        assert_eq!(dashboard.subscriptions_total, 0.0);
        assert_eq!(dashboard.total_balance, 9980.0);
        assert_eq!(dashboard.recent_transactions.len(), 1);
        assert_eq!(dashboard.recent_transactions[0].title, "Coffee");
        Ok(())
    }

    #[tokio::test]
    async fn test_subscriptions_reduce_balance_but_not_expenses() -> Result<()> {
        let db = setup_test_db().await?;
        let scope = create_user_with_salary(&db, "alice", 10000.0).await?;
        create_test_transaction(&db, &scope, "Coffee", 20.0, "Food").await?;
        let netflix = create_subscription(&db, &scope, "Netflix", 40.0, 12).await?;

        let dashboard = get_dashboard(&db, &scope, march_15(), "ILS", 5).await?;
        assert_eq!(dashboard.monthly_expenses, 20.0);
        assert_eq!(dashboard.subscriptions_total, 40.0);
        assert_eq!(dashboard.total_balance, 9940.0);

        let charge = dashboard
            .recent_transactions
            .iter()
            .find(|r| r.status == EntryStatus::Subscription)
            .unwrap();
        assert_eq!(charge.id, format!("sub-{}-2024-03", netflix.id));
        assert_eq!(charge.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(charge.category, SUBSCRIPTIONS_CATEGORY);

        // Virtual charges are never written to the log
        assert_eq!(event_store::transaction_records(&db, &scope).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_dashboard_is_deterministic() -> Result<()> {
        let db = setup_test_db().await?;
        let scope = create_user_with_salary(&db, "alice", 5000.0).await?;
        create_test_transaction(&db, &scope, "Coffee", 20.0, "Food").await?;
        create_subscription(&db, &scope, "Netflix", 40.0, 1).await?;
        create_subscription(&db, &scope, "Gym", 150.0, 1).await?;

        let first = get_dashboard(&db, &scope, march_15(), "ILS", 5).await?;
        let second = get_dashboard(&db, &scope, march_15(), "ILS", 5).await?;
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_recent_feed_is_bounded_and_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let normalizer = test_normalizer();
        let scope = create_user_with_salary(&db, "alice", 1000.0).await?;
        for day in 1..=7 {
            let request = NewTransaction::new(
                format!("Day {day}"),
                1.0,
                "ILS",
                "Food",
                format!("2024-02-{day:02}"),
            );
            create_transaction(&db, &normalizer, &scope, request).await?;
        }

        let dashboard =
            get_dashboard(&db, &scope, march_15(), "ILS", RECENT_ACTIVITY_LIMIT).await?;
        assert_eq!(dashboard.monthly_expenses, 7.0);
        let titles: Vec<&str> = dashboard
            .recent_transactions
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Day 7", "Day 6", "Day 5", "Day 4", "Day 3"]);
        Ok(())
    }

    #[test]
    fn test_summarize_ties_keep_creation_order() {
        let scope = UserScope::new(1);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let first = reporting_entry(&scope, "First", 1.0, "Food", date, "ILS");
        let second = reporting_entry(&scope, "Second", 2.0, "Food", date, "ILS");
        let sub = subscription::Model {
            id: 9,
            user_id: 1,
            name: "Netflix".to_string(),
            amount: 40.0,
            renewal_day: 20,
            created_at: chrono::Utc::now(),
        };

        let dashboard = summarize(100.0, vec![first, second], &[sub], march_15(), "ILS", 5);
        let titles: Vec<&str> = dashboard
            .recent_transactions
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["First", "Second", "Netflix"]);
        assert_eq!(dashboard.total_balance, 100.0 - 3.0 - 40.0);
    }

    #[tokio::test]
    async fn test_refund_cancel_reduces_spend() -> Result<()> {
        let db = setup_test_db().await?;
        let scope = create_user_with_salary(&db, "alice", 10000.0).await?;
        let goal = savings::create_goal(&db, &scope, "Trip", 1000.0, 0.0, "ILS").await?;
        savings::deposit(&db, &scope, goal.id, 300.0, "ILS", None).await?;
        savings::deposit(&db, &scope, goal.id, 800.0, "ILS", None).await?;

        let before = get_dashboard(&db, &scope, march_15(), "ILS", 5).await?;
        assert_eq!(before.monthly_expenses, 1100.0);

        savings::cancel(&db, &scope, goal.id, true, "ILS").await?;

        let after = get_dashboard(&db, &scope, march_15(), "ILS", 5).await?;
        assert_eq!(after.monthly_expenses, before.monthly_expenses - 1100.0);
        assert_eq!(after.total_balance, 10000.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_dashboard_is_tenant_scoped() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_user_with_salary(&db, "alice", 100.0).await?;
        let bob = create_user_with_salary(&db, "bob", 200.0).await?;
        create_test_transaction(&db, &alice, "Coffee", 20.0, "Food").await?;
        create_subscription(&db, &alice, "Netflix", 40.0, 1).await?;

        let dashboard = get_dashboard(&db, &bob, march_15(), "ILS", 5).await?;
        assert_eq!(dashboard.total_balance, 200.0);
        assert!(dashboard.recent_transactions.is_empty());
        Ok(())
    }
}
