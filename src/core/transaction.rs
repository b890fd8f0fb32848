//! Transaction pipeline - validates, normalizes, appends and projects a transaction.
//!
//! Order of work for [`create_transaction`]:
//! 1. validate the request (nothing is written for a rejected request),
//! 2. look up the exchange rate (time-bounded, falls back to 1.0),
//! 3. assign a fresh transaction id,
//! 4. append a `TransactionCreated` event,
//! 5. project it into the user's budget categories,
//! 6. commit steps 4 and 5 as one database transaction.
//!
//! A caller-supplied idempotency token makes resubmission safe: the second
//! submission returns the first one's stored record and appends nothing.

use crate::{
    core::{
        budget,
        event_store::{self, EntryStatus, EventId, EventType, TransactionRecord},
        money::{MonetaryNormalizer, parse_currency_code},
        tenant::UserScope,
    },
    entities::{Event, event},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{SqlErr, TransactionTrait, prelude::*};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Date format accepted for occurrence dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A transaction as submitted by a client (or produced by receipt OCR).
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Free-text title
    pub title: String,
    /// Amount in `currency`; must be positive
    pub amount: f64,
    /// Currency code of `amount`
    pub currency: String,
    /// Category label
    pub category: String,
    /// Occurrence date as `YYYY-MM-DD`
    pub date: String,
    /// Token that makes resubmission idempotent
    pub idempotency_key: Option<String>,
}

impl NewTransaction {
    /// Builds a request without an idempotency token.
    pub fn new(
        title: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
        category: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            amount,
            currency: currency.into(),
            category: category.into(),
            date: date.into(),
            idempotency_key: None,
        }
    }

    /// Attaches an idempotency token.
    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

struct ValidatedTransaction {
    title: String,
    amount: f64,
    currency: String,
    category: String,
    date: NaiveDate,
    idempotency_key: Option<String>,
}

fn validate(request: NewTransaction) -> Result<ValidatedTransaction> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(Error::validation("transaction title cannot be empty"));
    }

    let category = request.category.trim();
    if category.is_empty() {
        return Err(Error::validation("transaction category cannot be empty"));
    }

    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: request.amount,
        });
    }

    let currency = parse_currency_code(&request.currency)?;

    let date = NaiveDate::parse_from_str(request.date.trim(), DATE_FORMAT).map_err(|e| {
        Error::validation(format!(
            "malformed date '{}', expected YYYY-MM-DD: {e}",
            request.date
        ))
    })?;

    let idempotency_key = match request.idempotency_key {
        Some(key) if key.trim().is_empty() => {
            return Err(Error::validation("idempotency key cannot be blank"));
        }
        Some(key) => Some(key.trim().to_string()),
        None => None,
    };

    Ok(ValidatedTransaction {
        title: title.to_string(),
        amount: request.amount,
        currency,
        category: category.to_string(),
        date,
        idempotency_key,
    })
}

/// Records a transaction for the caller and returns it as stored.
///
/// # Errors
/// * validation errors for an empty title or category, a non-positive amount,
///   a malformed currency code or date; nothing is written,
/// * [`Error::Database`] when the append or the projection cannot be committed;
///   neither is then visible.
///
/// An unavailable exchange rate is not an error: the fallback rate is applied
/// and a warning is logged.
#[instrument(skip(db, normalizer, request), fields(category = %request.category))]
pub async fn create_transaction(
    db: &DatabaseConnection,
    normalizer: &MonetaryNormalizer,
    scope: &UserScope,
    request: NewTransaction,
) -> Result<TransactionRecord> {
    let request = validate(request)?;

    if let Some(key) = request.idempotency_key.as_deref() {
        if let Some(prior) = event_store::find_by_idempotency_key(db, scope, key).await? {
            info!(%scope, key, "Duplicate submission, returning the stored transaction");
            return event_store::decode_transaction(&prior);
        }
    }

    let conversion = normalizer.convert(request.amount, &request.currency).await;
    if conversion.degraded {
        warn!(
            %scope,
            currency = %request.currency,
            "Recording transaction with fallback exchange rate"
        );
    }

    let record = TransactionRecord {
        id: Uuid::new_v4().to_string(),
        user_id: scope.user_id(),
        title: request.title,
        amount: request.amount,
        amount_in_reporting: conversion.amount_in_reporting,
        currency: request.currency,
        category: request.category,
        date: request.date,
        status: EntryStatus::Confirmed,
        idempotency_key: request.idempotency_key,
    };

    let txn = db.begin().await?;
    match append_entry(&txn, scope, &record).await {
        Ok(event_id) => {
            txn.commit().await?;
            info!(%scope, event_id, transaction_id = %record.id, "Transaction recorded");
            Ok(record)
        }
        Err(Error::Database(e))
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
        {
            txn.rollback().await?;
            let Some(key) = record.idempotency_key.as_deref() else {
                return Err(Error::Database(e));
            };
            // A concurrent submission with the same token committed first
            let prior = event_store::find_by_idempotency_key(db, scope, key)
                .await?
                .ok_or(Error::Database(e))?;
            info!(%scope, key, "Concurrent duplicate submission resolved to the stored transaction");
            event_store::decode_transaction(&prior)
        }
        Err(e) => Err(e),
    }
}

/// Appends a ledger entry and projects it, inside the caller's database transaction.
///
/// Every money movement, whether submitted by a client or produced by the
/// savings ledger, goes through here so the budget projection sees all of them.
pub(crate) async fn append_entry<C>(
    db: &C,
    scope: &UserScope,
    record: &TransactionRecord,
) -> Result<EventId>
where
    C: ConnectionTrait,
{
    let event_id = event_store::append(
        db,
        scope,
        &record.id,
        EventType::TransactionCreated,
        serde_json::to_value(record)?,
        record.idempotency_key.as_deref(),
    )
    .await?;
    budget::project_transaction(db, scope, record).await?;
    Ok(event_id)
}

/// Builds a confirmed ledger entry whose amount is already in the reporting currency.
pub(crate) fn reporting_entry(
    scope: &UserScope,
    title: &str,
    amount: f64,
    category: &str,
    date: NaiveDate,
    reporting_currency: &str,
) -> TransactionRecord {
    TransactionRecord {
        id: Uuid::new_v4().to_string(),
        user_id: scope.user_id(),
        title: title.to_string(),
        amount,
        amount_in_reporting: amount,
        currency: reporting_currency.to_string(),
        category: category.to_string(),
        date,
        status: EntryStatus::Confirmed,
        idempotency_key: None,
    }
}

/// Looks up one of the caller's transactions by its id.
pub async fn get_transaction(
    db: &DatabaseConnection,
    scope: &UserScope,
    transaction_id: &str,
) -> Result<TransactionRecord> {
    let event = Event::find()
        .filter(event::Column::UserId.eq(scope.user_id()))
        .filter(event::Column::AggregateId.eq(transaction_id))
        .filter(event::Column::EventType.eq(EventType::TransactionCreated.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("transaction", transaction_id))?;
    event_store::decode_transaction(&event)
}

/// All of the caller's transactions in creation order.
pub async fn list_transactions(
    db: &DatabaseConnection,
    scope: &UserScope,
) -> Result<Vec<TransactionRecord>> {
    event_store::transaction_records(db, scope).await
}
