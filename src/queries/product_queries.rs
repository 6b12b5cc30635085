use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{CatalogStatus, Product, ProductQuery, ProductRequest, ProductResponse},
};

const PRODUCT_WITH_CATEGORY: &str = "SELECT p.*, c.name AS category_name
     FROM products p
     LEFT JOIN categories c ON c.id = p.category_id";

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn find_with_category(pool: &PgPool, id: i32) -> Result<Option<ProductResponse>> {
    let product = sqlx::query_as::<_, ProductResponse>(&format!(
        "{} WHERE p.id = $1",
        PRODUCT_WITH_CATEGORY
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn search_products(pool: &PgPool, params: &ProductQuery) -> Result<Vec<ProductResponse>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(PRODUCT_WITH_CATEGORY);
    query.push(" WHERE 1=1");

    // text search
    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", q);
        query.push(" AND (p.name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR p.description ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(category_id) = params.category_id {
        query.push(" AND p.category_id = ");
        query.push_bind(category_id);
    }

    if let Some(status) = params.status {
        query.push(" AND p.status = ");
        query.push_bind(status);
    }

    // price range
    if let Some(min_price) = params.min_price {
        query.push(" AND p.price >= ");
        query.push_bind(min_price);
    }

    if let Some(max_price) = params.max_price {
        query.push(" AND p.price <= ");
        query.push_bind(max_price);
    }

    match params.in_stock {
        Some(true) => {
            query.push(" AND p.stock_quantity > 0");
        }
        Some(false) => {
            query.push(" AND p.stock_quantity = 0");
        }
        None => {}
    }

    query.push(" ORDER BY p.created_at DESC, p.id DESC");

    let products = query
        .build_query_as::<ProductResponse>()
        .fetch_all(pool)
        .await?;

    Ok(products)
}

pub async fn create_product(pool: &PgPool, req: &ProductRequest) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            name, description, price, stock_quantity, category_id, image_url, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.stock_quantity.unwrap_or(0))
    .bind(req.category_id)
    .bind(&req.image_url)
    .bind(req.status.unwrap_or(CatalogStatus::Active))
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn update_product(pool: &PgPool, id: i32, req: &ProductRequest) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            price = COALESCE($3, price),
            stock_quantity = COALESCE($4, stock_quantity),
            category_id = COALESCE($5, category_id),
            image_url = COALESCE($6, image_url),
            status = COALESCE($7, status),
            updated_at = NOW()
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.stock_quantity)
    .bind(req.category_id)
    .bind(&req.image_url)
    .bind(req.status)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn delete_product(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn count_order_references(pool: &PgPool, id: i32) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
