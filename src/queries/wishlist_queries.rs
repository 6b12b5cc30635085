use sqlx::PgPool;

use crate::{error::Result, models::WishlistEntry};

pub async fn get_for_user(pool: &PgPool, user_id: i32) -> Result<Vec<WishlistEntry>> {
    let entries = sqlx::query_as::<_, WishlistEntry>(
        "SELECT w.id, w.product_id, w.added_at,
                p.name, p.description, p.price, p.image_url, p.category_id,
                c.name AS category
         FROM wishlists w
         JOIN products p ON w.product_id = p.id
         LEFT JOIN categories c ON p.category_id = c.id
         WHERE w.user_id = $1
         ORDER BY w.added_at DESC, w.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Adding a product twice is a no-op.
pub async fn add(pool: &PgPool, user_id: i32, product_id: i32) -> Result<()> {
    sqlx::query(
        "INSERT INTO wishlists (user_id, product_id) VALUES ($1, $2)
         ON CONFLICT (user_id, product_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(product_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn remove(pool: &PgPool, user_id: i32, product_id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn clear(pool: &PgPool, user_id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM wishlists WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
