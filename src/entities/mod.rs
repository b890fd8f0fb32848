//! Entity module - Contains all SeaORM entity definitions for the database.
//! The `events` table is the append-only source of truth; the other user-scoped
//! tables are materialized views kept in step with it by the core.

pub mod budget_category;
pub mod event;
pub mod savings_goal;
pub mod subscription;
pub mod user;

// Re-export specific types to avoid conflicts
pub use budget_category::{
    Column as BudgetCategoryColumn, Entity as BudgetCategory, Model as BudgetCategoryModel,
};
pub use event::{Column as EventColumn, Entity as Event, Model as EventModel};
pub use savings_goal::{
    Column as SavingsGoalColumn, Entity as SavingsGoal, Model as SavingsGoalModel,
};
pub use subscription::{
    Column as SubscriptionColumn, Entity as Subscription, Model as SubscriptionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
