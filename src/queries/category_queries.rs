use sqlx::PgPool;

use crate::{
    error::Result,
    models::{CatalogStatus, Category, CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest},
};

const CATEGORY_WITH_COUNT: &str = "SELECT c.*, COUNT(p.id) AS product_count
     FROM categories c
     LEFT JOIN products p ON p.category_id = c.id";

/// Find category by ID
pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(category)
}

pub async fn find_with_count(pool: &PgPool, id: i32) -> Result<Option<CategoryResponse>> {
    let category = sqlx::query_as::<_, CategoryResponse>(&format!(
        "{} WHERE c.id = $1 GROUP BY c.id",
        CATEGORY_WITH_COUNT
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}

/// Get all categories (flat list)
pub async fn get_all(pool: &PgPool) -> Result<Vec<CategoryResponse>> {
    let categories = sqlx::query_as::<_, CategoryResponse>(&format!(
        "{} GROUP BY c.id ORDER BY c.name ASC",
        CATEGORY_WITH_COUNT
    ))
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

pub async fn create_category(pool: &PgPool, req: &CreateCategoryRequest) -> Result<Category> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, description, icon, status)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(&req.icon)
    .bind(req.status.unwrap_or(CatalogStatus::Active))
    .fetch_one(pool)
    .await?;

    Ok(category)
}

/// Update an existing category; absent fields keep their value.
pub async fn update_category(
    pool: &PgPool,
    id: i32,
    req: &UpdateCategoryRequest,
) -> Result<Option<Category>> {
    let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE categories SET ");
    let mut fields = query_builder.separated(", ");

    if let Some(name) = &req.name {
        fields.push("name = ");
        fields.push_bind_unseparated(name.trim().to_string());
    }

    if let Some(description) = &req.description {
        fields.push("description = ");
        fields.push_bind_unseparated(description.clone());
    }

    if let Some(icon) = &req.icon {
        fields.push("icon = ");
        fields.push_bind_unseparated(icon.clone());
    }

    if let Some(status) = req.status {
        fields.push("status = ");
        fields.push_bind_unseparated(status);
    }

    fields.push("updated_at = NOW()");

    query_builder.push(" WHERE id = ");
    query_builder.push_bind(id);
    query_builder.push(" RETURNING *");

    let category = query_builder
        .build_query_as::<Category>()
        .fetch_optional(pool)
        .await?;

    Ok(category)
}

pub async fn count_products(pool: &PgPool, id: i32) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn delete_category(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
