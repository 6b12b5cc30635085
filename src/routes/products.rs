use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{DeletedResponse, Permission, Product, ProductQuery, ProductRequest, ProductResponse},
    queries::{category_queries, product_queries},
    services::checkout_service::MAX_AMOUNT,
    utils::{
        extractors::{JsonBody, require_permission},
        jwt::Claims,
    },
};

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let products = product_queries::search_products(&state.db, &params).await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>> {
    let product = product_queries::find_with_category(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(mut payload): JsonBody<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    require_permission(&state.db, &claims, Permission::ManageProducts).await?;

    if payload.name.as_deref().is_none_or(|name| name.trim().is_empty()) {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    if payload.price.is_none() {
        return Err(AppError::BadRequest("price is required".to_string()));
    }

    validate_product(&payload)?;
    ensure_category_exists(&state, payload.category_id).await?;

    payload.name = payload.name.map(|name| name.trim().to_string());

    let product = product_queries::create_product(&state.db, &payload).await?;

    tracing::info!("Product {} created by user {}", product.id, claims.sub);

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    JsonBody(mut payload): JsonBody<ProductRequest>,
) -> Result<Json<Product>> {
    require_permission(&state.db, &claims, Permission::ManageProducts).await?;

    if payload.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    validate_product(&payload)?;
    ensure_category_exists(&state, payload.category_id).await?;

    payload.name = payload.name.map(|name| name.trim().to_string());

    let product = product_queries::update_product(&state.db, id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> Result<Json<DeletedResponse>> {
    require_permission(&state.db, &claims, Permission::ManageProducts).await?;

    if product_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!("Product with id {} not found", id)));
    }

    if product_queries::count_order_references(&state.db, id).await? > 0 {
        return Err(AppError::Conflict(
            "Product has been ordered and cannot be deleted; mark it inactive instead".to_string(),
        ));
    }

    product_queries::delete_product(&state.db, id).await?;

    tracing::info!("Product {} deleted by user {}", id, claims.sub);

    Ok(Json(DeletedResponse {
        message: "Product deleted successfully".to_string(),
        id,
    }))
}

fn validate_product(payload: &ProductRequest) -> Result<()> {
    if payload.price.is_some_and(|price| price < Decimal::ZERO) {
        return Err(AppError::BadRequest("price cannot be negative".to_string()));
    }

    if payload.price.is_some_and(|price| price.round_dp(2) > MAX_AMOUNT) {
        return Err(AppError::BadRequest(format!(
            "price cannot exceed {}",
            MAX_AMOUNT
        )));
    }

    if payload.stock_quantity.is_some_and(|stock| stock < 0) {
        return Err(AppError::BadRequest("stock_quantity cannot be negative".to_string()));
    }

    Ok(())
}

async fn ensure_category_exists(state: &AppState, category_id: Option<i32>) -> Result<()> {
    if let Some(category_id) = category_id {
        if category_queries::find_by_id(&state.db, category_id).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "Category with id {} does not exist",
                category_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn negative_price_or_stock_is_rejected() {
        let negative_price = ProductRequest {
            price: Some(dec!(-0.01)),
            ..Default::default()
        };
        assert!(validate_product(&negative_price).is_err());

        let negative_stock = ProductRequest {
            stock_quantity: Some(-1),
            ..Default::default()
        };
        assert!(validate_product(&negative_stock).is_err());
    }

    #[test]
    fn price_must_fit_the_money_column() {
        let too_expensive = ProductRequest {
            price: Some(dec!(100000000.00)),
            ..Default::default()
        };
        assert!(matches!(
            validate_product(&too_expensive),
            Err(AppError::BadRequest(_))
        ));

        let at_limit = ProductRequest {
            price: Some(MAX_AMOUNT),
            ..Default::default()
        };
        assert!(validate_product(&at_limit).is_ok());
    }

    #[test]
    fn free_products_are_allowed() {
        let free = ProductRequest {
            name: Some("Sticker".to_string()),
            price: Some(Decimal::ZERO),
            stock_quantity: Some(0),
            ..Default::default()
        };
        assert!(validate_product(&free).is_ok());
    }
}
