//! Read-only financial snapshot for advisory consumers.
//!
//! Bundles the same reads the dashboard and budget views use into one
//! serializable value. Nothing in the core reads anything back from consumers
//! of the snapshot.

use crate::{
    core::{
        budget::list_categories, event_store, savings::list_goals,
        subscription::list_subscriptions, tenant::UserScope, user::get_profile,
    },
    entities::{budget_category, savings_goal, subscription, user},
    errors::Result,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;

/// Everything known about one user's finances at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    /// Profile row
    pub profile: user::Model,
    /// Full ledger in creation order
    pub transactions: Vec<event_store::TransactionRecord>,
    /// Budget categories with cached spend
    pub budgets: Vec<budget_category::Model>,
    /// Recurring charges
    pub subscriptions: Vec<subscription::Model>,
    /// Open savings goals
    pub goals: Vec<savings_goal::Model>,
}

impl FinancialSnapshot {
    /// JSON rendering of the snapshot.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Collects the caller's profile, ledger, budgets, subscriptions and goals.
pub async fn build_snapshot<C>(db: &C, scope: &UserScope) -> Result<FinancialSnapshot>
where
    C: ConnectionTrait,
{
    Ok(FinancialSnapshot {
        profile: get_profile(db, scope).await?,
        transactions: event_store::transaction_records(db, scope).await?,
        budgets: list_categories(db, scope).await?,
        subscriptions: list_subscriptions(db, scope).await?,
        goals: list_goals(db, scope).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{budget::create_category, savings, subscription::create_subscription};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_snapshot_collects_scoped_state() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_user_with_salary(&db, "alice", 10000.0).await?;
        let bob = create_test_user(&db, "bob").await?;

        create_test_transaction(&db, &alice, "Coffee", 20.0, "Food").await?;
        create_category(&db, &alice, "Food", 500.0).await?;
        create_subscription(&db, &alice, "Netflix", 40.0, 1).await?;
        savings::create_goal(&db, &alice, "Trip", 1000.0, 0.0, "ILS").await?;
        create_test_transaction(&db, &bob, "Pizza", 60.0, "Food").await?;

        let snapshot = build_snapshot(&db, &alice).await?;
        assert_eq!(snapshot.profile.display_name, "alice");
        assert_eq!(snapshot.transactions.len(), 1);
        assert_eq!(snapshot.budgets.len(), 1);
        assert_eq!(snapshot.subscriptions.len(), 1);
        assert_eq!(snapshot.goals.len(), 1);

        let json = snapshot.to_json()?;
        assert!(json.contains("\"Coffee\""));
        assert!(!json.contains("\"Pizza\""));
        Ok(())
    }
}
