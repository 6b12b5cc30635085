use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: i32,
    pub product_id: i32,
    pub added_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddWishlistRequest {
    pub product_id: i32,
}
