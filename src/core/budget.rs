//! Budget projector - keeps each category's `spent_amount` in step with the event log.
//!
//! Matching policy: a transaction's category label matches a budget category when
//! the two are exactly equal, case-sensitive, after trimming surrounding whitespace.
//! [`category_matches`] is the only implementation of that rule and is shared by
//! live projection, creation-time backfill and full reprojection, so the three can
//! never disagree.
//!
//! Spend increments are applied as a single SQL statement
//! (`spent_amount = spent_amount + delta`) so concurrent writers cannot lose updates.

use crate::{
    core::{
        event_store::{self, TransactionRecord},
        tenant::UserScope,
    },
    entities::{BudgetCategory, budget_category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

/// Whether a transaction labelled `label` counts towards the category `category_name`.
#[must_use]
pub fn category_matches(category_name: &str, label: &str) -> bool {
    let label = label.trim();
    !label.is_empty() && category_name.trim() == label
}

/// Sum of normalized amounts of the records that match `category_name`.
#[must_use]
pub fn backfill_amount<'a>(
    category_name: &str,
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> f64 {
    records
        .into_iter()
        .filter(|record| category_matches(category_name, &record.category))
        .map(|record| record.amount_in_reporting)
        .sum()
}

/// Adds a new transaction to every matching category of its owner.
///
/// Runs inside the caller's database transaction. Returns the number of
/// categories that were updated; zero, one or several may match.
pub async fn project_transaction<C>(
    db: &C,
    scope: &UserScope,
    record: &TransactionRecord,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let matching: Vec<i64> = list_categories(db, scope)
        .await?
        .into_iter()
        .filter(|category| category_matches(&category.name, &record.category))
        .map(|category| category.id)
        .collect();

    if matching.is_empty() {
        return Ok(0);
    }

    let result = BudgetCategory::update_many()
        .col_expr(
            budget_category::Column::SpentAmount,
            Expr::col(budget_category::Column::SpentAmount).add(record.amount_in_reporting),
        )
        .filter(budget_category::Column::UserId.eq(scope.user_id()))
        .filter(budget_category::Column::Id.is_in(matching))
        .exec(db)
        .await?;

    debug!(
        %scope,
        category = %record.category,
        amount = record.amount_in_reporting,
        updated = result.rows_affected,
        "Projected transaction into budget categories"
    );
    Ok(result.rows_affected)
}

/// Creates a budget category and back-fills its spend from the existing log.
///
/// The row is inserted before the log is scanned, all in one database
/// transaction, so an event committed concurrently is either included in the
/// backfill or projected live onto the new row, never both and never neither.
#[instrument(skip(db))]
pub async fn create_category(
    db: &DatabaseConnection,
    scope: &UserScope,
    name: &str,
    limit_amount: f64,
) -> Result<budget_category::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("category name cannot be empty"));
    }
    if !limit_amount.is_finite() || limit_amount < 0.0 {
        return Err(Error::InvalidAmount {
            amount: limit_amount,
        });
    }

    let txn = db.begin().await?;

    let inserted = budget_category::ActiveModel {
        user_id: Set(scope.user_id()),
        name: Set(name.to_string()),
        limit_amount: Set(limit_amount),
        spent_amount: Set(0.0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let records = event_store::transaction_records(&txn, scope).await?;
    let past_spent = backfill_amount(name, &records);

    let mut active: budget_category::ActiveModel = inserted.into();
    active.spent_amount = Set(past_spent);
    let category = active.update(&txn).await?;

    txn.commit().await?;

    info!(
        category_id = category.id,
        past_spent, "Created budget category with historical spend"
    );
    Ok(category)
}

/// All of the caller's budget categories, ordered by name.
pub async fn list_categories<C>(db: &C, scope: &UserScope) -> Result<Vec<budget_category::Model>>
where
    C: ConnectionTrait,
{
    BudgetCategory::find()
        .filter(budget_category::Column::UserId.eq(scope.user_id()))
        .order_by_asc(budget_category::Column::Name)
        .order_by_asc(budget_category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// One of the caller's categories by id.
pub async fn get_category<C>(
    db: &C,
    scope: &UserScope,
    category_id: i64,
) -> Result<budget_category::Model>
where
    C: ConnectionTrait,
{
    BudgetCategory::find_by_id(category_id)
        .filter(budget_category::Column::UserId.eq(scope.user_id()))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("budget category", category_id))
}

/// Recomputes every category's spend from the event log and overwrites the cache.
///
/// This is the recovery path when a projection is suspected to have drifted.
#[instrument(skip(db))]
pub async fn reproject_categories(
    db: &DatabaseConnection,
    scope: &UserScope,
) -> Result<Vec<budget_category::Model>> {
    let txn = db.begin().await?;

    let records = event_store::transaction_records(&txn, scope).await?;
    let categories = list_categories(&txn, scope).await?;

    let mut reprojected = Vec::with_capacity(categories.len());
    for category in categories {
        let spent = backfill_amount(&category.name, &records);
        if (spent - category.spent_amount).abs() > f64::EPSILON {
            info!(
                category_id = category.id,
                cached = category.spent_amount,
                recomputed = spent,
                "Correcting drifted budget projection"
            );
        }
        let mut active: budget_category::ActiveModel = category.into();
        active.spent_amount = Set(spent);
        reprojected.push(active.update(&txn).await?);
    }

    txn.commit().await?;
    Ok(reprojected)
}
