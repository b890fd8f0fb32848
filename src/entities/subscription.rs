//! Subscription entity - A recurring monthly charge.
//!
//! Subscriptions are never written to the event log; the dashboard synthesizes
//! one virtual charge per subscription for the current month on every read.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    /// Unique identifier for the subscription
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Name of the service (e.g., "Netflix")
    pub name: String,
    /// Monthly amount in the reporting currency
    pub amount: f64,
    /// Day of month the charge renews on (1-31)
    pub renewal_day: i32,
    /// When the subscription was added
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Subscription and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each subscription belongs to one user
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
