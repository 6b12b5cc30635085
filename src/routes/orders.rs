use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        CreateOrderRequest, Order, OrderQuery, OrderResponse, OrderSearchResponse, OrderStatus,
        Permission, UpdateOrderStatusRequest, UserRole,
    },
    queries::{admin_queries, order_queries},
    services::checkout_service,
    utils::{
        extractors::{JsonBody, current_access, extract_user_id, require_permission},
        jwt::Claims,
    },
};

pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(payload): JsonBody<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let user_id = extract_user_id(&claims)?;

    checkout_service::validate_cart(&payload.items)?;
    checkout_service::validate_details("shipping_address", &payload.shipping_address)?;
    if let Some(billing_address) = &payload.billing_address {
        checkout_service::validate_details("billing_address", billing_address)?;
    }
    checkout_service::validate_details("payment_method", &payload.payment_method)?;

    let order = order_queries::create_order(&state.db, user_id, &payload).await?;

    tracing::info!(
        "Order {} placed by user {} ({} items, total {})",
        order.order.reference,
        user_id,
        order.items.len(),
        order.order.total
    );

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_user_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<OrderResponse>>> {
    let user_id = extract_user_id(&claims)?;

    let orders = order_queries::get_user_orders(&state.db, user_id).await?;
    let orders = order_queries::attach_items(&state.db, orders).await?;

    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> Result<Json<OrderResponse>> {
    let user_id = extract_user_id(&claims)?;

    let order = order_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order with id {} not found", id)))?;

    if order.user_id != user_id {
        require_permission(&state.db, &claims, Permission::ManageOrders).await?;
    }

    Ok(Json(with_items(&state, order).await?))
}

pub async fn search_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<OrderQuery>,
) -> Result<Json<OrderSearchResponse>> {
    require_permission(&state.db, &claims, Permission::ManageOrders).await?;

    let orders = admin_queries::search_orders(&state.db, params).await?;
    Ok(Json(orders))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>> {
    require_permission(&state.db, &claims, Permission::ManageOrders).await?;

    let order = order_queries::change_status(&state.db, id, payload.status, |_| Ok(()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order with id {} not found", id)))?;

    Ok(Json(with_items(&state, order).await?))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> Result<Json<OrderResponse>> {
    let user_id = extract_user_id(&claims)?;
    let (role, _) = current_access(&state.db, &claims).await?;
    let is_admin = role == UserRole::Admin;

    let order = order_queries::change_status(&state.db, id, OrderStatus::Cancelled, |current| {
        check_cancellation(current, user_id, is_admin)
    })
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order with id {} not found", id)))?;

    tracing::info!("Order {} cancelled by user {}", order.reference, user_id);

    Ok(Json(with_items(&state, order).await?))
}

/// Owners and admins may cancel. Customers only before shipping; nobody once
/// the order is closed.
fn check_cancellation(order: &Order, user_id: i32, is_admin: bool) -> Result<()> {
    if order.user_id != user_id && !is_admin {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    match order.status {
        OrderStatus::Cancelled => Err(AppError::BadRequest(
            "Order is already cancelled".to_string(),
        )),
        OrderStatus::Delivered => Err(AppError::BadRequest(
            "Delivered orders cannot be cancelled".to_string(),
        )),
        status if !is_admin && !status.cancellable_by_customer() => Err(AppError::BadRequest(
            "Order can no longer be cancelled".to_string(),
        )),
        _ => Ok(()),
    }
}

async fn with_items(state: &AppState, order: Order) -> Result<OrderResponse> {
    order_queries::attach_items(&state.db, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::InternalError("Order vanished while loading items".to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn order(user_id: i32, status: OrderStatus) -> Order {
        Order {
            id: 1,
            reference: "ECM-TEST".to_string(),
            user_id,
            status,
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            shipping: Decimal::ZERO,
            total: Decimal::ZERO,
            shipping_method: "standard".to_string(),
            shipping_address: json!({"city": "Rabat"}),
            billing_address: json!({"city": "Rabat"}),
            payment_method: json!({"type": "card"}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_cancels_pending_order() {
        assert!(check_cancellation(&order(7, OrderStatus::Pending), 7, false).is_ok());
        assert!(check_cancellation(&order(7, OrderStatus::Processing), 7, false).is_ok());
    }

    #[test]
    fn strangers_cannot_cancel() {
        let err = check_cancellation(&order(7, OrderStatus::Pending), 8, false).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn customers_cannot_cancel_shipped_orders_but_admins_can() {
        let shipped = order(7, OrderStatus::Shipped);
        assert!(matches!(
            check_cancellation(&shipped, 7, false),
            Err(AppError::BadRequest(_))
        ));
        assert!(check_cancellation(&shipped, 1, true).is_ok());
    }

    #[test]
    fn closed_orders_stay_closed() {
        for status in [OrderStatus::Cancelled, OrderStatus::Delivered] {
            assert!(matches!(
                check_cancellation(&order(7, status), 1, true),
                Err(AppError::BadRequest(_))
            ));
        }
    }
}
