use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{User, UserPermissions, UserRole},
};

/// A concurrent insert can slip past the `find_by_email` check; the unique
/// index on `LOWER(email)` still catches it.
fn email_conflict(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("User already exists with this email".to_string())
        }
        _ => AppError::from(err),
    }
}

pub async fn create_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
    role: UserRole,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password, first_name, last_name, role)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(first_name)
    .bind(last_name)
    .bind(role)
    .fetch_one(pool)
    .await
    .map_err(email_conflict)?;

    Ok(user)
}

/// Inserts an admin and its permission row in one transaction.
pub async fn create_admin(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
    permissions: &UserPermissions,
) -> Result<User> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password, first_name, last_name, role)
         VALUES ($1, $2, $3, $4, 'admin')
         RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(first_name)
    .bind(last_name)
    .fetch_one(&mut *tx)
    .await
    .map_err(email_conflict)?;

    sqlx::query(
        "INSERT INTO user_permissions
         (user_id, manage_orders, manage_products, manage_categories,
          manage_users, manage_admins, view_analytics)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(user.id)
    .bind(permissions.manage_orders)
    .bind(permissions.manage_products)
    .bind(permissions.manage_categories)
    .bind(permissions.manage_users)
    .bind(permissions.manage_admins)
    .bind(permissions.view_analytics)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn update_profile(
    pool: &PgPool,
    id: i32,
    first_name: Option<&str>,
    last_name: Option<&str>,
    password_hash: Option<&str>,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET
            first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            password = COALESCE($3, password),
            updated_at = NOW()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(password_hash)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Changes the role and keeps `user_permissions` consistent with it: promotion
/// grants role defaults unless a row already exists, demotion drops the row.
pub async fn update_role(pool: &PgPool, id: i32, role: UserRole) -> Result<Option<User>> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(role)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user) = user else {
        tx.rollback().await?;
        return Ok(None);
    };

    match role {
        UserRole::Admin => {
            let defaults = UserPermissions::defaults_for(UserRole::Admin);
            sqlx::query(
                "INSERT INTO user_permissions
                 (user_id, manage_orders, manage_products, manage_categories,
                  manage_users, manage_admins, view_analytics)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (user_id) DO NOTHING",
            )
            .bind(id)
            .bind(defaults.manage_orders)
            .bind(defaults.manage_products)
            .bind(defaults.manage_categories)
            .bind(defaults.manage_users)
            .bind(defaults.manage_admins)
            .bind(defaults.view_analytics)
            .execute(&mut *tx)
            .await?;
        }
        UserRole::Customer => {
            sqlx::query("DELETE FROM user_permissions WHERE user_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    Ok(Some(user))
}

pub async fn delete_user(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
