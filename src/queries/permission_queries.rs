use sqlx::PgPool;

use crate::{
    error::Result,
    models::{AdminWithPermissions, PermissionRecord, UserPermissions, UserRole},
};

pub async fn find_by_user_id(pool: &PgPool, user_id: i32) -> Result<Option<UserPermissions>> {
    let permissions = sqlx::query_as::<_, UserPermissions>(
        "SELECT manage_orders, manage_products, manage_categories,
                manage_users, manage_admins, view_analytics
         FROM user_permissions
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(permissions)
}

pub async fn upsert(
    pool: &PgPool,
    user_id: i32,
    flags: &UserPermissions,
) -> Result<PermissionRecord> {
    let record = sqlx::query_as::<_, PermissionRecord>(
        r#"
        INSERT INTO user_permissions
            (user_id, manage_orders, manage_products, manage_categories,
             manage_users, manage_admins, view_analytics)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id) DO UPDATE SET
            manage_orders = EXCLUDED.manage_orders,
            manage_products = EXCLUDED.manage_products,
            manage_categories = EXCLUDED.manage_categories,
            manage_users = EXCLUDED.manage_users,
            manage_admins = EXCLUDED.manage_admins,
            view_analytics = EXCLUDED.view_analytics,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(flags.manage_orders)
    .bind(flags.manage_products)
    .bind(flags.manage_categories)
    .bind(flags.manage_users)
    .bind(flags.manage_admins)
    .bind(flags.view_analytics)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Permission columns from a `LEFT JOIN user_permissions`; all NULL when no row joined.
#[derive(sqlx::FromRow)]
struct JoinedFlags {
    manage_orders: Option<bool>,
    manage_products: Option<bool>,
    manage_categories: Option<bool>,
    manage_users: Option<bool>,
    manage_admins: Option<bool>,
    view_analytics: Option<bool>,
}

impl JoinedFlags {
    fn into_stored(self) -> Option<UserPermissions> {
        self.manage_orders.map(|manage_orders| UserPermissions {
            manage_orders,
            manage_products: self.manage_products.unwrap_or(false),
            manage_categories: self.manage_categories.unwrap_or(false),
            manage_users: self.manage_users.unwrap_or(false),
            manage_admins: self.manage_admins.unwrap_or(false),
            view_analytics: self.view_analytics.unwrap_or(false),
        })
    }
}

/// Current role and stored flags of a user in one round-trip. `None` when the
/// user no longer exists.
pub async fn find_access(
    pool: &PgPool,
    user_id: i32,
) -> Result<Option<(UserRole, Option<UserPermissions>)>> {
    #[derive(sqlx::FromRow)]
    struct Row {
        role: UserRole,
        #[sqlx(flatten)]
        flags: JoinedFlags,
    }

    let row = sqlx::query_as::<_, Row>(
        "SELECT u.role,
                p.manage_orders, p.manage_products, p.manage_categories,
                p.manage_users, p.manage_admins, p.view_analytics
         FROM users u
         LEFT JOIN user_permissions p ON u.id = p.user_id
         WHERE u.id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| (row.role, row.flags.into_stored())))
}

/// Every admin with effective flags; admins without a row get role defaults.
pub async fn list_admins(pool: &PgPool) -> Result<Vec<AdminWithPermissions>> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i32,
        email: String,
        first_name: String,
        last_name: String,
        created_at: chrono::DateTime<chrono::Utc>,
        updated_at: chrono::DateTime<chrono::Utc>,
        #[sqlx(flatten)]
        flags: JoinedFlags,
    }

    let rows = sqlx::query_as::<_, Row>(
        "SELECT u.id, u.email, u.first_name, u.last_name, u.created_at, u.updated_at,
                p.manage_orders, p.manage_products, p.manage_categories,
                p.manage_users, p.manage_admins, p.view_analytics
         FROM users u
         LEFT JOIN user_permissions p ON u.id = p.user_id
         WHERE u.role = 'admin'
         ORDER BY u.id",
    )
    .fetch_all(pool)
    .await?;

    let admins = rows
        .into_iter()
        .map(|row| AdminWithPermissions {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            permissions: UserPermissions::effective(UserRole::Admin, row.flags.into_stored()),
        })
        .collect();

    Ok(admins)
}
