use rust_decimal::Decimal;
use serde::Serialize;

use super::OrderStatus;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub total_users: i64,
    pub total_customers: i64,
    pub total_products: i64,
    pub out_of_stock_products: i64,
    pub total_orders: i64,
    pub orders_by_status: Vec<StatusCount>,
    /// Sum of order totals, cancelled orders excluded.
    pub revenue: Decimal,
}
