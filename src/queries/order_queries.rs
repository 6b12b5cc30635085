use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{CreateOrderRequest, Order, OrderItem, OrderResponse, OrderStatus, Product},
    services::checkout_service::{self, OrderTotals},
};

/// Locks the ordered products, checks and decrements stock, and writes the order
/// with its items. Any validation failure rolls the whole thing back.
pub async fn create_order(
    pool: &PgPool,
    user_id: i32,
    req: &CreateOrderRequest,
) -> Result<OrderResponse> {
    let mut tx = pool.begin().await?;

    let product_ids: Vec<i32> = checkout_service::demand(&req.items)?.into_keys().collect();

    let products: HashMap<i32, Product> = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(&product_ids)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

    let lines = checkout_service::price_items(&req.items, &products)?;
    let totals = OrderTotals::compute(&lines, req.shipping_method)?;

    for (product_id, quantity) in checkout_service::demand(&req.items)? {
        sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity - $1, updated_at = NOW()
             WHERE id = $2",
        )
        .bind(quantity)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;
    }

    let reference = format!("ECM-{}", Uuid::new_v4().simple()).to_uppercase();
    let billing_address = req
        .billing_address
        .as_ref()
        .unwrap_or(&req.shipping_address);

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (reference, user_id, subtotal, tax, shipping, total, shipping_method,
         shipping_address, billing_address, payment_method)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
    )
    .bind(&reference)
    .bind(user_id)
    .bind(totals.subtotal)
    .bind(totals.tax)
    .bind(totals.shipping)
    .bind(totals.total)
    .bind(req.shipping_method.as_str())
    .bind(&req.shipping_address)
    .bind(billing_address)
    .bind(&req.payment_method)
    .fetch_one(&mut *tx)
    .await?;

    let product_ids: Vec<i32> = lines.iter().map(|i| i.product_id).collect();
    let product_names: Vec<&str> = lines.iter().map(|i| i.product_name.as_str()).collect();
    let quantities: Vec<i32> = lines.iter().map(|i| i.quantity).collect();
    let prices: Vec<Decimal> = lines.iter().map(|i| i.price).collect();

    let items = sqlx::query_as::<_, OrderItem>(
        "INSERT INTO order_items (order_id, product_id, product_name, quantity, price_at_purchase)
         SELECT $1, unnest($2::int[]), unnest($3::varchar[]), unnest($4::int[]), unnest($5::decimal[])
         RETURNING *",
    )
    .bind(order.id)
    .bind(&product_ids)
    .bind(&product_names)
    .bind(&quantities)
    .bind(&prices)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "Order {} created for user {} ({} items, total {})",
        order.reference,
        user_id,
        items.len(),
        order.total
    );

    Ok(OrderResponse { order, items })
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(order)
}

/// Moves an order to `status` under a row lock. `check` sees the current row and
/// may veto the change. Entering `cancelled` puts the items back in stock.
pub async fn change_status<F>(
    pool: &PgPool,
    id: i32,
    status: OrderStatus,
    check: F,
) -> Result<Option<Order>>
where
    F: FnOnce(&Order) -> Result<()>,
{
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(current) = current else {
        tx.rollback().await?;
        return Ok(None);
    };

    check(&current)?;

    if current.status == OrderStatus::Cancelled && status != OrderStatus::Cancelled {
        return Err(AppError::BadRequest(
            "Cancelled orders cannot be reopened".to_string(),
        ));
    }

    if status == OrderStatus::Cancelled && current.status != OrderStatus::Cancelled {
        restock(&mut tx, id).await?;
    }

    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(status)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "Order {} moved from {:?} to {:?}",
        order.reference,
        current.status,
        order.status
    );

    Ok(Some(order))
}

async fn restock(tx: &mut Transaction<'_, Postgres>, order_id: i32) -> Result<()> {
    sqlx::query(
        "UPDATE products p
         SET stock_quantity = p.stock_quantity + oi.quantity, updated_at = NOW()
         FROM (
             SELECT product_id, SUM(quantity)::int AS quantity
             FROM order_items
             WHERE order_id = $1
             GROUP BY product_id
         ) oi
         WHERE p.id = oi.product_id",
    )
    .bind(order_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn get_user_orders(pool: &PgPool, user_id: i32) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn get_items_for_orders(pool: &PgPool, order_db_ids: &[i32]) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id",
    )
    .bind(order_db_ids)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Pairs each order with its items, preserving the order of `orders`.
pub async fn attach_items(pool: &PgPool, orders: Vec<Order>) -> Result<Vec<OrderResponse>> {
    let order_db_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let all_items = get_items_for_orders(pool, &order_db_ids).await?;

    let mut items_map: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in all_items {
        items_map.entry(item.order_id).or_default().push(item);
    }

    let response = orders
        .into_iter()
        .map(|order| {
            let items = items_map.remove(&order.id).unwrap_or_default();
            OrderResponse { order, items }
        })
        .collect();

    Ok(response)
}
