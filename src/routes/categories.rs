use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        Category, CategoryResponse, CreateCategoryRequest, DeletedResponse, Permission,
        UpdateCategoryRequest,
    },
    queries::category_queries,
    utils::{
        extractors::{JsonBody, require_permission},
        jwt::Claims,
    },
};

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryResponse>>> {
    let categories = category_queries::get_all(&state.db).await?;
    Ok(Json(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CategoryResponse>> {
    let category = category_queries::find_with_count(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))?;

    Ok(Json(category))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(mut payload): JsonBody<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    require_permission(&state.db, &claims, Permission::ManageCategories).await?;

    payload.name = payload.name.trim().to_string();
    if payload.name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let category = category_queries::create_category(&state.db, &payload).await?;

    tracing::info!("Category {} created by user {}", category.id, claims.sub);

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    JsonBody(mut payload): JsonBody<UpdateCategoryRequest>,
) -> Result<Json<Category>> {
    require_permission(&state.db, &claims, Permission::ManageCategories).await?;

    if let Some(name) = payload.name.as_mut() {
        *name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name cannot be empty".to_string()));
        }
    }

    let category = category_queries::update_category(&state.db, id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> Result<Json<DeletedResponse>> {
    require_permission(&state.db, &claims, Permission::ManageCategories).await?;

    if category_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!("Category with id {} not found", id)));
    }

    let product_count = category_queries::count_products(&state.db, id).await?;
    if product_count > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot delete category with {} associated products",
            product_count
        )));
    }

    category_queries::delete_category(&state.db, id).await?;

    tracing::info!("Category {} deleted by user {}", id, claims.sub);

    Ok(Json(DeletedResponse {
        message: "Category deleted successfully".to_string(),
        id,
    }))
}
