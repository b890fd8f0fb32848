//! Event entity - One immutable financial fact.
//!
//! Rows are only ever inserted. The auto-increment `id` defines creation order,
//! `payload` carries the JSON-encoded fact, and `dedupe_key` (when present) is
//! `"{user_id}:{idempotency_token}"` so a retried submission cannot be appended
//! twice.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Event database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Append sequence number
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Groups events about the same logical entity (one per transaction)
    pub aggregate_id: String,
    /// String form of `core::event_store::EventType`
    pub event_type: String,
    /// JSON-encoded fact
    pub payload: Json,
    /// Per-user idempotency key, unique across the table
    #[sea_orm(unique)]
    pub dedupe_key: Option<String>,
    /// When the event was appended
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Event and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each event belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
