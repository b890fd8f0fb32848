//! Savings ledger - goals whose every money movement is paired with a ledger entry.
//!
//! A goal is *Active* while `current_amount < target_amount` and *Completed*
//! once it reaches the target. Deposits append a positive `"savings"` entry;
//! cancelling with a refund appends a negative `"refund"` entry for the whole
//! balance; finishing appends nothing because the money is considered spent.
//! Replaying the log therefore always agrees with the goals that remain.
//!
//! Deposits are a single atomic increment that also bumps `version`. Finish and
//! cancel delete the row only if `version` is unchanged since it was read, and
//! retry a few times before giving up with [`Error::Conflict`].

use crate::{
    core::{
        event_store::{self, TransactionRecord},
        tenant::UserScope,
        transaction::{append_entry, reporting_entry},
    },
    entities::{SavingsGoal, savings_goal},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Category label of deposit entries.
pub const SAVINGS_CATEGORY: &str = "savings";
/// Category label of refund entries.
pub const REFUND_CATEGORY: &str = "refund";

const MAX_CAS_ATTEMPTS: usize = 3;

/// Lifecycle state of a savings goal, derived from its amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GoalState {
    /// Still saving towards the target
    Active,
    /// Target reached, waiting to be finished or cancelled
    Completed,
}

impl GoalState {
    /// State of the given goal.
    #[must_use]
    pub fn of(goal: &savings_goal::Model) -> Self {
        if goal.current_amount >= goal.target_amount {
            Self::Completed
        } else {
            Self::Active
        }
    }
}

/// Result of a deposit.
#[derive(Debug, Clone)]
pub struct DepositReceipt {
    /// Goal after the deposit
    pub goal: savings_goal::Model,
    /// Ledger entry that records the deposit
    pub entry: TransactionRecord,
}

impl DepositReceipt {
    /// Saved amount after the deposit.
    #[must_use]
    pub const fn current_amount(&self) -> f64 {
        self.goal.current_amount
    }

    /// State after the deposit.
    #[must_use]
    pub fn state(&self) -> GoalState {
        GoalState::of(&self.goal)
    }
}

/// Result of cancelling a goal.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    /// The goal as it was when removed
    pub goal: savings_goal::Model,
    /// Compensating refund entry, when one was appended
    pub refund: Option<TransactionRecord>,
}

fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

fn require_positive(amount: f64) -> Result<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

/// Creates a goal. A positive `opening_balance` is recorded as a first deposit.
#[instrument(skip(db))]
pub async fn create_goal(
    db: &DatabaseConnection,
    scope: &UserScope,
    name: &str,
    target_amount: f64,
    opening_balance: f64,
    reporting_currency: &str,
) -> Result<savings_goal::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("savings goal name cannot be empty"));
    }
    require_positive(target_amount)?;
    if !opening_balance.is_finite() || opening_balance < 0.0 {
        return Err(Error::InvalidAmount {
            amount: opening_balance,
        });
    }

    let txn = db.begin().await?;

    let goal = savings_goal::ActiveModel {
        user_id: Set(scope.user_id()),
        name: Set(name.to_string()),
        target_amount: Set(target_amount),
        current_amount: Set(0.0),
        version: Set(0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let goal = if opening_balance > 0.0 {
        apply_deposit(&txn, scope, &goal, opening_balance, reporting_currency, None)
            .await?
            .goal
    } else {
        goal
    };

    txn.commit().await?;
    info!(goal_id = goal.id, "Created savings goal");
    Ok(goal)
}

async fn apply_deposit<C>(
    db: &C,
    scope: &UserScope,
    goal: &savings_goal::Model,
    amount: f64,
    reporting_currency: &str,
    idempotency_key: Option<&str>,
) -> Result<DepositReceipt>
where
    C: ConnectionTrait,
{
    let result = SavingsGoal::update_many()
        .col_expr(
            savings_goal::Column::CurrentAmount,
            Expr::col(savings_goal::Column::CurrentAmount).add(amount),
        )
        .col_expr(
            savings_goal::Column::Version,
            Expr::col(savings_goal::Column::Version).add(1),
        )
        .filter(savings_goal::Column::Id.eq(goal.id))
        .filter(savings_goal::Column::UserId.eq(scope.user_id()))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("savings goal", goal.id));
    }

    let mut entry = reporting_entry(
        scope,
        &goal.name,
        amount,
        SAVINGS_CATEGORY,
        today(),
        reporting_currency,
    );
    entry.idempotency_key = idempotency_key.map(str::to_string);
    append_entry(db, scope, &entry).await?;

    let goal = get_goal(db, scope, goal.id).await?;
    Ok(DepositReceipt { goal, entry })
}

/// Receipt of the deposit previously made with `key`, if any.
async fn prior_deposit(
    db: &DatabaseConnection,
    scope: &UserScope,
    goal_id: i64,
    key: &str,
) -> Result<Option<DepositReceipt>> {
    let Some(event) = event_store::find_by_idempotency_key(db, scope, key).await? else {
        return Ok(None);
    };
    let entry = event_store::decode_transaction(&event)?;
    let goal = get_goal(db, scope, goal_id).await?;
    Ok(Some(DepositReceipt { goal, entry }))
}

/// Adds `amount` to a goal and records the matching ledger entry.
///
/// With an `idempotency_key`, a resubmitted deposit returns the first one's
/// receipt and changes nothing.
#[instrument(skip(db))]
pub async fn deposit(
    db: &DatabaseConnection,
    scope: &UserScope,
    goal_id: i64,
    amount: f64,
    reporting_currency: &str,
    idempotency_key: Option<&str>,
) -> Result<DepositReceipt> {
    require_positive(amount)?;
    let idempotency_key = match idempotency_key.map(str::trim) {
        Some("") => return Err(Error::validation("idempotency key cannot be blank")),
        key => key,
    };

    if let Some(key) = idempotency_key {
        if let Some(prior) = prior_deposit(db, scope, goal_id, key).await? {
            info!(goal_id, key, "Duplicate deposit, returning the stored receipt");
            return Ok(prior);
        }
    }

    let txn = db.begin().await?;
    let goal = get_goal(&txn, scope, goal_id).await?;
    let receipt =
        match apply_deposit(&txn, scope, &goal, amount, reporting_currency, idempotency_key).await
        {
            Ok(receipt) => receipt,
            Err(Error::Database(e))
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                txn.rollback().await?;
                let Some(key) = idempotency_key else {
                    return Err(Error::Database(e));
                };
                // A concurrent deposit with the same token committed first
                return prior_deposit(db, scope, goal_id, key).await?.ok_or(Error::Database(e));
            }
            Err(e) => return Err(e),
        };
    txn.commit().await?;

    info!(
        goal_id,
        amount,
        current = receipt.goal.current_amount,
        "Deposited into savings goal"
    );
    Ok(receipt)
}

/// Deletes the goal only if nobody changed it since `goal` was read.
async fn delete_if_unchanged<C>(
    db: &C,
    scope: &UserScope,
    goal: &savings_goal::Model,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = SavingsGoal::delete_many()
        .filter(savings_goal::Column::Id.eq(goal.id))
        .filter(savings_goal::Column::UserId.eq(scope.user_id()))
        .filter(savings_goal::Column::Version.eq(goal.version))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Removes a completed goal. No ledger entry is appended: the money is spent.
///
/// # Errors
/// [`Error::GoalNotCompleted`] while `current_amount < target_amount`; the goal
/// and the log are left untouched.
#[instrument(skip(db))]
pub async fn finish(
    db: &DatabaseConnection,
    scope: &UserScope,
    goal_id: i64,
) -> Result<savings_goal::Model> {
    finish_with_attempts(db, scope, goal_id, MAX_CAS_ATTEMPTS).await
}

async fn finish_with_attempts(
    db: &DatabaseConnection,
    scope: &UserScope,
    goal_id: i64,
    max_attempts: usize,
) -> Result<savings_goal::Model> {
    for attempt in 1..=max_attempts {
        let txn = db.begin().await?;
        let goal = get_goal(&txn, scope, goal_id).await?;

        if GoalState::of(&goal) != GoalState::Completed {
            return Err(Error::GoalNotCompleted {
                name: goal.name,
                current: goal.current_amount,
                target: goal.target_amount,
            });
        }

        if delete_if_unchanged(&txn, scope, &goal).await? {
            txn.commit().await?;
            info!(goal_id, saved = goal.current_amount, "Finished savings goal");
            return Ok(goal);
        }

        txn.rollback().await?;
        debug!(goal_id, attempt, "Savings goal changed while finishing, retrying");
    }

    Err(Error::Conflict {
        aggregate: format!("savings goal {goal_id}"),
    })
}

/// Removes a goal, optionally returning its balance through a refund entry.
///
/// With `refund` set and a positive balance, an entry of `-current_amount` is
/// appended under [`REFUND_CATEGORY`]. Without it the money is treated as spent.
#[instrument(skip(db))]
pub async fn cancel(
    db: &DatabaseConnection,
    scope: &UserScope,
    goal_id: i64,
    refund: bool,
    reporting_currency: &str,
) -> Result<CancelOutcome> {
    cancel_with_attempts(db, scope, goal_id, refund, reporting_currency, MAX_CAS_ATTEMPTS).await
}

async fn cancel_with_attempts(
    db: &DatabaseConnection,
    scope: &UserScope,
    goal_id: i64,
    refund: bool,
    reporting_currency: &str,
    max_attempts: usize,
) -> Result<CancelOutcome> {
    for attempt in 1..=max_attempts {
        let txn = db.begin().await?;
        let goal = get_goal(&txn, scope, goal_id).await?;

        if !delete_if_unchanged(&txn, scope, &goal).await? {
            txn.rollback().await?;
            debug!(goal_id, attempt, "Savings goal changed while cancelling, retrying");
            continue;
        }

        let refund_entry = if refund && goal.current_amount > 0.0 {
            let entry = reporting_entry(
                scope,
                &goal.name,
                -goal.current_amount,
                REFUND_CATEGORY,
                today(),
                reporting_currency,
            );
            append_entry(&txn, scope, &entry).await?;
            Some(entry)
        } else {
            None
        };

        txn.commit().await?;
        info!(
            goal_id,
            refunded = refund_entry.is_some(),
            "Cancelled savings goal"
        );
        return Ok(CancelOutcome {
            goal,
            refund: refund_entry,
        });
    }

    Err(Error::Conflict {
        aggregate: format!("savings goal {goal_id}"),
    })
}

/// One of the caller's goals by id.
pub async fn get_goal<C>(db: &C, scope: &UserScope, goal_id: i64) -> Result<savings_goal::Model>
where
    C: ConnectionTrait,
{
    SavingsGoal::find_by_id(goal_id)
        .filter(savings_goal::Column::UserId.eq(scope.user_id()))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("savings goal", goal_id))
}

/// The caller's oldest goal with the given name.
pub async fn find_goal_by_name(
    db: &DatabaseConnection,
    scope: &UserScope,
    name: &str,
) -> Result<savings_goal::Model> {
    SavingsGoal::find()
        .filter(savings_goal::Column::UserId.eq(scope.user_id()))
        .filter(savings_goal::Column::Name.eq(name.trim()))
        .order_by_asc(savings_goal::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("savings goal", name))
}

/// All of the caller's goals in creation order.
pub async fn list_goals<C>(db: &C, scope: &UserScope) -> Result<Vec<savings_goal::Model>>
where
    C: ConnectionTrait,
{
    SavingsGoal::find()
        .filter(savings_goal::Column::UserId.eq(scope.user_id()))
        .order_by_asc(savings_goal::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
