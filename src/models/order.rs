use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, dec};
use serde::{Deserialize, Serialize};

// DB models

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Statuses a customer may still cancel from.
    pub fn cancellable_by_customer(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Overnight,
}

impl ShippingMethod {
    pub fn price(&self) -> Decimal {
        match self {
            ShippingMethod::Standard => dec!(5.99),
            ShippingMethod::Express => dec!(14.99),
            ShippingMethod::Overnight => dec!(29.99),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "standard",
            ShippingMethod::Express => "express",
            ShippingMethod::Overnight => "overnight",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i32,
    pub reference: String,
    pub user_id: i32,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub shipping_method: String,
    pub shipping_address: serde_json::Value,
    pub billing_address: serde_json::Value,
    pub payment_method: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A priced line ready to be written to `order_items`.
#[derive(Debug, Clone)]
pub struct OrderItemData {
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

// Request types

#[derive(Debug, Deserialize)]
pub struct CartItem {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<CartItem>,
    pub shipping_address: serde_json::Value,
    pub billing_address: Option<serde_json::Value>,
    pub payment_method: serde_json::Value,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderQuery {
    pub id: Option<i32>,
    pub user_id: Option<i32>,
    pub status: Option<OrderStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderCustomer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct AdminOrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<OrderCustomer>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize)]
pub struct OrderSearchResponse {
    pub orders: Vec<AdminOrderResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
