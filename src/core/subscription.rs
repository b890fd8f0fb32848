//! Subscription management business logic.
//!
//! Subscriptions are plain rows; nothing here touches the event log. Their
//! monthly charges only exist as virtual entries built by the dashboard.

use crate::{
    core::tenant::UserScope,
    entities::{Subscription, subscription},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Adds a recurring monthly charge.
///
/// # Errors
/// * [`Error::Validation`] for an empty name or a renewal day outside 1..=31
/// * [`Error::InvalidAmount`] unless `amount` is finite and positive
#[instrument(skip(db))]
pub async fn create_subscription(
    db: &DatabaseConnection,
    scope: &UserScope,
    name: &str,
    amount: f64,
    renewal_day: i32,
) -> Result<subscription::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("subscription name cannot be empty"));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    if !(1..=31).contains(&renewal_day) {
        return Err(Error::validation(format!(
            "renewal day must be between 1 and 31, got {renewal_day}"
        )));
    }

    let created = subscription::ActiveModel {
        user_id: Set(scope.user_id()),
        name: Set(name.to_string()),
        amount: Set(amount),
        renewal_day: Set(renewal_day),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(subscription_id = created.id, "Created subscription");
    Ok(created)
}

/// All of the caller's subscriptions, by renewal day then name.
pub async fn list_subscriptions<C>(db: &C, scope: &UserScope) -> Result<Vec<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .filter(subscription::Column::UserId.eq(scope.user_id()))
        .order_by_asc(subscription::Column::RenewalDay)
        .order_by_asc(subscription::Column::Name)
        .order_by_asc(subscription::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Removes one of the caller's subscriptions.
#[instrument(skip(db))]
pub async fn delete_subscription(
    db: &DatabaseConnection,
    scope: &UserScope,
    subscription_id: i64,
) -> Result<()> {
    let result = Subscription::delete_many()
        .filter(subscription::Column::Id.eq(subscription_id))
        .filter(subscription::Column::UserId.eq(scope.user_id()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("subscription", subscription_id));
    }
    info!(subscription_id, "Deleted subscription");
    Ok(())
}
