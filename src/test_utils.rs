//! Shared test utilities for `FinSight`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating users, transactions and goals with sensible defaults.

use crate::{
    core::{
        event_store::TransactionRecord,
        money::{MonetaryNormalizer, StaticRateTable},
        tenant::UserScope,
        transaction::{self, NewTransaction},
        user,
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database with all tables initialized.
///
/// Unlike the in-memory setup, its pool holds several connections, so
/// concurrent writers really contend for the database. Pair with
/// [`remove_file_db`].
pub async fn setup_file_db() -> Result<(DatabaseConnection, PathBuf)> {
    let path = std::env::temp_dir().join(format!("finsight-test-{}.db", uuid::Uuid::new_v4()));
    let db = sea_orm::Database::connect(format!("sqlite://{}?mode=rwc", path.display())).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((db, path))
}

/// Closes a database from [`setup_file_db`] and deletes its files.
pub async fn remove_file_db(db: DatabaseConnection, path: PathBuf) {
    let _ = db.close().await;
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

/// Registers a user whose external id and display name are both `name`.
pub async fn create_test_user(db: &DatabaseConnection, name: &str) -> Result<UserScope> {
    Ok(user::register(db, name, name).await?.scope)
}

/// Registers a user with the given monthly salary.
pub async fn create_user_with_salary(
    db: &DatabaseConnection,
    name: &str,
    salary: f64,
) -> Result<UserScope> {
    let scope = create_test_user(db, name).await?;
    user::update_salary(db, &scope, salary).await?;
    Ok(scope)
}

/// Sets up a database with one registered user.
/// Returns (db, scope) for common test scenarios.
pub async fn setup_with_user(name: &str) -> Result<(DatabaseConnection, UserScope)> {
    let db = setup_test_db().await?;
    let scope = create_test_user(&db, name).await?;
    Ok((db, scope))
}

/// Normalizer reporting in ILS with USD at 3.7 and EUR at 4.0.
#[must_use]
pub fn test_normalizer() -> MonetaryNormalizer {
    MonetaryNormalizer::new(
        Arc::new(StaticRateTable::new(HashMap::from([
            ("USD".to_string(), 3.7),
            ("EUR".to_string(), 4.0),
        ]))),
        "ILS",
        Duration::from_millis(100),
    )
}

/// Records an ILS transaction dated 2024-03-01 through the full pipeline.
///
/// # Defaults
/// * `currency`: "ILS"
/// * `date`: "2024-03-01"
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    scope: &UserScope,
    title: &str,
    amount: f64,
    category: &str,
) -> Result<TransactionRecord> {
    transaction::create_transaction(
        db,
        &test_normalizer(),
        scope,
        NewTransaction::new(title, amount, "ILS", category, "2024-03-01"),
    )
    .await
}
