use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CatalogStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CategoryResponse {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub category: Category,
    pub product_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub status: Option<CatalogStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub status: Option<CatalogStatus>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
    pub id: i32,
}
