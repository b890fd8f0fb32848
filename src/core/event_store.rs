//! Event store - the append-only record of every money movement.
//!
//! Events are inserted and read; there is deliberately no update or delete
//! function in this module. Reads always re-scan the caller's full event set in
//! creation order.

use crate::{
    core::tenant::UserScope,
    entities::{Event, event},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Identifier assigned to an appended event.
pub type EventId = i64;

/// Closed set of event kinds. Only `TransactionCreated` is produced today.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// Money moved: a purchase, a savings deposit, or a refund
    TransactionCreated,
}

impl EventType {
    /// Name stored in the `event_type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TransactionCreated => "TransactionCreated",
        }
    }
}

impl TryFrom<&str> for EventType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "TransactionCreated" => Ok(Self::TransactionCreated),
            other => Err(Error::validation(format!("unknown event type: {other}"))),
        }
    }
}

/// Status tag carried by a transaction record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Persisted ledger entry
    Confirmed,
    /// Virtual monthly subscription charge, synthesized at read time
    Subscription,
}

/// Payload of a `TransactionCreated` event, and the pipeline's output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Opaque transaction id (also the event's aggregate id)
    pub id: String,
    /// Owning user
    pub user_id: i64,
    /// Free-text title
    pub title: String,
    /// Amount as submitted, in `currency`
    pub amount: f64,
    /// Amount normalized into the reporting currency
    pub amount_in_reporting: f64,
    /// ISO currency code of `amount`
    pub currency: String,
    /// Category label matched against budget categories
    pub category: String,
    /// Occurrence date
    pub date: NaiveDate,
    /// Status tag
    pub status: EntryStatus,
    /// Caller-supplied idempotency token, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Appends one event for the caller and returns its id.
///
/// Storage faults are propagated. A `dedupe_key` collision surfaces as a
/// database error carrying a unique-constraint violation.
pub async fn append<C>(
    db: &C,
    scope: &UserScope,
    aggregate_id: &str,
    event_type: EventType,
    payload: serde_json::Value,
    idempotency_key: Option<&str>,
) -> Result<EventId>
where
    C: ConnectionTrait,
{
    let model = event::ActiveModel {
        user_id: Set(scope.user_id()),
        aggregate_id: Set(aggregate_id.to_string()),
        event_type: Set(event_type.as_str().to_string()),
        payload: Set(payload),
        dedupe_key: Set(idempotency_key.map(|key| scope.dedupe_key(key))),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let inserted = model.insert(db).await?;
    Ok(inserted.id)
}

/// Returns the caller's events in creation order, optionally filtered by type.
pub async fn query<C>(
    db: &C,
    scope: &UserScope,
    event_type: Option<EventType>,
) -> Result<Vec<event::Model>>
where
    C: ConnectionTrait,
{
    let mut select = Event::find().filter(event::Column::UserId.eq(scope.user_id()));
    if let Some(event_type) = event_type {
        select = select.filter(event::Column::EventType.eq(event_type.as_str()));
    }

    select
        .order_by_asc(event::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds the event previously appended with the given idempotency token.
pub async fn find_by_idempotency_key<C>(
    db: &C,
    scope: &UserScope,
    token: &str,
) -> Result<Option<event::Model>>
where
    C: ConnectionTrait,
{
    Event::find()
        .filter(event::Column::UserId.eq(scope.user_id()))
        .filter(event::Column::DedupeKey.eq(scope.dedupe_key(token)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Decodes the payload of a `TransactionCreated` event.
pub fn decode_transaction(event: &event::Model) -> Result<TransactionRecord> {
    let event_type = EventType::try_from(event.event_type.as_str())?;
    if event_type != EventType::TransactionCreated {
        return Err(Error::validation(format!(
            "event {} is not a transaction",
            event.id
        )));
    }
    Ok(serde_json::from_value(event.payload.clone())?)
}

/// All of the caller's transaction records, in creation order.
pub async fn transaction_records<C>(db: &C, scope: &UserScope) -> Result<Vec<TransactionRecord>>
where
    C: ConnectionTrait,
{
    query(db, scope, Some(EventType::TransactionCreated))
        .await?
        .iter()
        .map(decode_transaction)
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    #[test]
    fn test_event_type_round_trips_through_column_value() {
        let stored = EventType::TransactionCreated.as_str();
        assert_eq!(EventType::try_from(stored).unwrap(), EventType::TransactionCreated);
        assert!(EventType::try_from("GoalDeleted").is_err());
    }

    #[tokio::test]
    async fn test_append_and_query_in_creation_order() -> Result<()> {
        let (db, scope) = setup_with_user("alice").await?;

        let first = append(
            &db,
            &scope,
            "agg-1",
            EventType::TransactionCreated,
            json!({"n": 1}),
            None,
        )
        .await?;
        let second = append(
            &db,
            &scope,
            "agg-2",
            EventType::TransactionCreated,
            json!({"n": 2}),
            None,
        )
        .await?;
        assert!(second > first);

        let events = query(&db, &scope, None).await?;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].aggregate_id, "agg-1");
        assert_eq!(events[1].aggregate_id, "agg-2");
        assert_eq!(events[1].payload, json!({"n": 2}));

        Ok(())
    }

    #[tokio::test]
    async fn test_query_is_scoped_to_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;

        append(&db, &alice, "a", EventType::TransactionCreated, json!({}), None).await?;
        append(&db, &bob, "b", EventType::TransactionCreated, json!({}), None).await?;

        let alice_events = query(&db, &alice, Some(EventType::TransactionCreated)).await?;
        assert_eq!(alice_events.len(), 1);
        assert_eq!(alice_events[0].aggregate_id, "a");
        assert!(alice_events.iter().all(|e| e.user_id == alice.user_id()));

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_key_is_rejected_by_storage() -> Result<()> {
        let (db, scope) = setup_with_user("alice").await?;

        append(&db, &scope, "a", EventType::TransactionCreated, json!({}), Some("k1")).await?;
        let duplicate = append(
            &db,
            &scope,
            "b",
            EventType::TransactionCreated,
            json!({}),
            Some("k1"),
        )
        .await;
        assert!(matches!(duplicate, Err(Error::Database(_))));

        let found = find_by_idempotency_key(&db, &scope, "k1").await?.unwrap();
        assert_eq!(found.aggregate_id, "a");
        assert_eq!(query(&db, &scope, None).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_same_token_is_independent_across_users() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;

        append(&db, &alice, "a", EventType::TransactionCreated, json!({}), Some("k")).await?;
        append(&db, &bob, "b", EventType::TransactionCreated, json!({}), Some("k")).await?;

        assert!(find_by_idempotency_key(&db, &alice, "k").await?.is_some());
        assert!(find_by_idempotency_key(&db, &bob, "k").await?.is_some());
        Ok(())
    }
}
