//! User profiles and the identity resolver.
//!
//! The identity layer hands the core an external id (a Discord user id in the
//! bundled bot). [`authenticate`] turns it into a [`UserScope`]; nothing else in
//! the crate can mint one.

use crate::{
    core::tenant::UserScope,
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, SqlErr, prelude::*};
use tracing::info;

/// Outcome of [`register`].
#[derive(Debug, Clone)]
pub struct Registration {
    /// Scope for the registered user
    pub scope: UserScope,
    /// Whether a new user row was created
    pub created: bool,
}

/// Registers an external identity, or returns the existing registration.
pub async fn register(
    db: &DatabaseConnection,
    external_id: &str,
    display_name: &str,
) -> Result<Registration> {
    let external_id = external_id.trim();
    let display_name = display_name.trim();
    if external_id.is_empty() {
        return Err(Error::validation("external id cannot be empty"));
    }
    if display_name.is_empty() {
        return Err(Error::validation("display name cannot be empty"));
    }

    if let Some(existing) = find_by_external_id(db, external_id).await? {
        return Ok(Registration {
            scope: UserScope::new(existing.id),
            created: false,
        });
    }

    let model = user::ActiveModel {
        external_id: Set(external_id.to_string()),
        display_name: Set(display_name.to_string()),
        salary: Set(0.0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(inserted) => {
            info!(user_id = inserted.id, "Registered new user");
            Ok(Registration {
                scope: UserScope::new(inserted.id),
                created: true,
            })
        }
        // Lost a race with a concurrent registration of the same identity
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            let existing = find_by_external_id(db, external_id)
                .await?
                .ok_or_else(|| Error::not_found("user", external_id))?;
            Ok(Registration {
                scope: UserScope::new(existing.id),
                created: false,
            })
        }
        Err(e) => Err(e.into()),
    }
}

async fn find_by_external_id(db: &DatabaseConnection, external_id: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::ExternalId.eq(external_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Resolves an external identity to a scope, failing for unknown identities.
pub async fn authenticate(db: &DatabaseConnection, external_id: &str) -> Result<UserScope> {
    find_by_external_id(db, external_id.trim())
        .await?
        .map(|user| UserScope::new(user.id))
        .ok_or_else(|| Error::not_found("user", external_id))
}

/// Loads the caller's profile.
pub async fn get_profile<C>(db: &C, scope: &UserScope) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(scope.user_id())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("user", scope.user_id()))
}

/// Sets the caller's monthly salary in the reporting currency.
pub async fn update_salary(
    db: &DatabaseConnection,
    scope: &UserScope,
    salary: f64,
) -> Result<user::Model> {
    if !salary.is_finite() || salary < 0.0 {
        return Err(Error::InvalidAmount { amount: salary });
    }

    let mut active: user::ActiveModel = get_profile(db, scope).await?.into();
    active.salary = Set(salary);
    Ok(active.update(db).await?)
}

/// Renames the caller.
pub async fn update_display_name(
    db: &DatabaseConnection,
    scope: &UserScope,
    display_name: &str,
) -> Result<user::Model> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(Error::validation("display name cannot be empty"));
    }

    let mut active: user::ActiveModel = get_profile(db, scope).await?.into();
    active.display_name = Set(display_name.to_string());
    Ok(active.update(db).await?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_register_is_get_or_create() -> Result<()> {
        let db = setup_test_db().await?;

        let first = register(&db, "1234", "Dana").await?;
        assert!(first.created);

        let second = register(&db, "1234", "Someone Else").await?;
        assert!(!second.created);
        assert_eq!(first.scope, second.scope);

        let profile = get_profile(&db, &first.scope).await?;
        assert_eq!(profile.display_name, "Dana");
        assert_eq!(profile.salary, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_register_validation() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(register(&db, "  ", "Dana").await.unwrap_err().is_validation());
        assert!(register(&db, "1", " ").await.unwrap_err().is_validation());
        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate_unknown_identity() -> Result<()> {
        let db = setup_test_db().await?;
        let result = authenticate(&db, "nobody").await;
        assert!(matches!(result, Err(Error::NotFound { entity: "user", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate_resolves_registered_identity() -> Result<()> {
        let db = setup_test_db().await?;
        let registration = register(&db, "42", "Noa").await?;
        let scope = authenticate(&db, "42").await?;
        assert_eq!(scope, registration.scope);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_salary() -> Result<()> {
        let (db, scope) = setup_with_user("alice").await?;

        let updated = update_salary(&db, &scope, 10_000.0).await?;
        assert_eq!(updated.salary, 10_000.0);

        assert!(matches!(
            update_salary(&db, &scope, -1.0).await,
            Err(Error::InvalidAmount { .. })
        ));
        assert!(matches!(
            update_salary(&db, &scope, f64::NAN).await,
            Err(Error::InvalidAmount { .. })
        ));
        assert_eq!(get_profile(&db, &scope).await?.salary, 10_000.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_display_name() -> Result<()> {
        let (db, scope) = setup_with_user("alice").await?;
        let updated = update_display_name(&db, &scope, "  Alice Cohen ").await?;
        assert_eq!(updated.display_name, "Alice Cohen");
        Ok(())
    }
}
