use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    config::{AdminSeed, DatabaseConfig},
    error::Result,
    models::{UserPermissions, UserRole},
    queries::{permission_queries, user_queries},
    utils::password,
};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    tracing::info!(
        "Database connection established with {} max connections",
        config.max_connections
    );

    Ok(pool)
}

pub async fn check_health(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

/// Makes sure the seed account exists, is an admin, and holds every permission.
/// An existing account keeps its password.
pub async fn bootstrap_admin(pool: &PgPool, seed: &AdminSeed, bcrypt_cost: u32) -> Result<()> {
    let user = match user_queries::find_by_email(pool, &seed.email).await? {
        Some(user) => {
            if user.role != UserRole::Admin {
                user_queries::update_role(pool, user.id, UserRole::Admin).await?;
            }
            user
        }
        None => {
            let hash = password::hash_password(&seed.password, bcrypt_cost).await?;
            let user = user_queries::create_user(
                pool,
                &seed.email,
                &hash,
                "Admin",
                "",
                UserRole::Admin,
            )
            .await?;
            tracing::info!("Created bootstrap admin {}", seed.email);
            user
        }
    };

    permission_queries::upsert(pool, user.id, &UserPermissions::all()).await?;

    Ok(())
}
