mod admin;
mod categories;
mod health;
mod login;
mod orders;
mod products;
mod profile;
mod register;
mod wishlist;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    error::AppError,
    middleware::{admin_middleware, auth_middleware},
};

pub fn create_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/users/register", post(register::register_user))
        .route("/api/users/login", post(login::login_user))
        .route("/api/products", get(products::list_products))
        .route("/api/products/{id}", get(products::get_product))
        .route("/api/categories", get(categories::list_categories))
        .route("/api/categories/{id}", get(categories::get_category));

    let authenticated = Router::new()
        .route(
            "/api/users/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/user", get(orders::get_user_orders))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/cancel", put(orders::cancel_order))
        .route(
            "/api/wishlist",
            get(wishlist::get_wishlist)
                .post(wishlist::add_to_wishlist)
                .delete(wishlist::clear_wishlist),
        )
        .route(
            "/api/wishlist/{product_id}",
            delete(wishlist::remove_from_wishlist),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin = Router::new()
        .route("/api/users", get(admin::search_users))
        .route("/api/users/admin", post(admin::create_admin))
        .route("/api/users/{id}/role", put(admin::update_user_role))
        .route("/api/users/{id}", delete(admin::delete_user))
        .route("/api/permissions", get(admin::list_admin_permissions))
        .route(
            "/api/permissions/{user_id}",
            get(admin::get_user_permissions).put(admin::update_user_permissions),
        )
        .route("/api/analytics/summary", get(admin::analytics_summary))
        .route("/api/products", post(products::create_product))
        .route(
            "/api/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/api/categories", post(categories::create_category))
        .route(
            "/api/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/api/orders", get(orders::search_orders))
        .route("/api/orders/{id}/status", put(orders::update_order_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
