//! Savings goal entity - Money ring-fenced towards a target.
//!
//! `version` is bumped on every mutation so finishing or cancelling a goal can
//! use a compare-and-swap delete against concurrent deposits.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Savings goal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "savings_goals")]
pub struct Model {
    /// Unique identifier for the goal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Goal name, used as the title of its ledger entries
    pub name: String,
    /// Amount to reach in the reporting currency
    pub target_amount: f64,
    /// Amount saved so far
    pub current_amount: f64,
    /// Optimistic concurrency counter
    pub version: i64,
    /// When the goal was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `SavingsGoal` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each goal belongs to one user
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
