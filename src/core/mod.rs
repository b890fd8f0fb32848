//! Core business logic - framework-agnostic ledger, projection and reporting operations.
//!
//! Every function that touches user data takes a [`tenant::UserScope`].

/// Budget categories and the spend projection
pub mod budget;
/// Dashboard aggregation
pub mod dashboard;
/// Append-only event log
pub mod event_store;
/// Currency normalization
pub mod money;
/// Budget usage reporting and formatting helpers
pub mod report;
/// Savings goals and their ledger entries
pub mod savings;
/// Read-only snapshot of a user's finances
pub mod snapshot;
/// Recurring monthly charges
pub mod subscription;
/// Per-user scope token
pub mod tenant;
/// Transaction pipeline
pub mod transaction;
/// User profiles and identity resolution
pub mod user;
