//! User entity - The owner of every other row in the system.
//!
//! Users are keyed by an `external_id` supplied by the identity layer (the
//! Discord user id in the bundled bot). The monthly salary feeds the dashboard
//! balance.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Internal identifier, used as the tenant key everywhere else
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identity issued by the external session resolver
    #[sea_orm(unique)]
    pub external_id: String,
    /// Name shown in replies and reports
    pub display_name: String,
    /// Monthly salary in the reporting currency
    pub salary: f64,
    /// When the user first registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and the user-scoped tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many events
    #[sea_orm(has_many = "super::event::Entity")]
    Events,
    /// One user owns many budget categories
    #[sea_orm(has_many = "super::budget_category::Entity")]
    BudgetCategories,
    /// One user owns many subscriptions
    #[sea_orm(has_many = "super::subscription::Entity")]
    Subscriptions,
    /// One user owns many savings goals
    #[sea_orm(has_many = "super::savings_goal::Entity")]
    SavingsGoals,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl Related<super::budget_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetCategories.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl Related<super::savings_goal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavingsGoals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
