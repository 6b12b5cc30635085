use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AddWishlistRequest, WishlistEntry},
    queries::{product_queries, wishlist_queries},
    utils::{
        extractors::{JsonBody, extract_user_id},
        jwt::Claims,
    },
};

pub async fn get_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<WishlistEntry>>> {
    let user_id = extract_user_id(&claims)?;
    let entries = wishlist_queries::get_for_user(&state.db, user_id).await?;
    Ok(Json(entries))
}

pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(payload): JsonBody<AddWishlistRequest>,
) -> Result<Json<Vec<WishlistEntry>>> {
    let user_id = extract_user_id(&claims)?;

    if product_queries::find_by_id(&state.db, payload.product_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "Product with id {} not found",
            payload.product_id
        )));
    }

    wishlist_queries::add(&state.db, user_id, payload.product_id).await?;

    let entries = wishlist_queries::get_for_user(&state.db, user_id).await?;
    Ok(Json(entries))
}

pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(product_id): Path<i32>,
) -> Result<Json<Vec<WishlistEntry>>> {
    let user_id = extract_user_id(&claims)?;

    wishlist_queries::remove(&state.db, user_id, product_id).await?;

    let entries = wishlist_queries::get_for_user(&state.db, user_id).await?;
    Ok(Json(entries))
}

pub async fn clear_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>> {
    let user_id = extract_user_id(&claims)?;

    let removed = wishlist_queries::clear(&state.db, user_id).await?;
    tracing::info!("Cleared {} wishlist entries for user {}", removed, user_id);

    Ok(Json(json!({ "message": "Wishlist cleared" })))
}
