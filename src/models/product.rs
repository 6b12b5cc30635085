use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Visibility flag shared by products and categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "catalog_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Option<i32>,
    pub image_url: Option<String>,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductResponse {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
}

/// Body of both create and update. Create requires `name` and `price`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub category_id: Option<i32>,
    pub image_url: Option<String>,
    pub status: Option<CatalogStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category_id: Option<i32>,
    pub status: Option<CatalogStatus>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
}
