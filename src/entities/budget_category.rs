//! Budget category entity - A spending cap whose `spent_amount` is projected
//! from the event log.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Category name, also the key transactions are matched against
    pub name: String,
    /// Spending cap in the reporting currency
    pub limit_amount: f64,
    /// Sum of all matching transaction events in the reporting currency
    pub spent_amount: f64,
    /// When the category was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `BudgetCategory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each category belongs to one user
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
