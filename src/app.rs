use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::{AppConfig, AuthConfig},
    database,
    error::{AppError, Result},
    routes,
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub auth: AuthConfig,
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let pool = database::create_pool(&config.database).await?;

    if let Some(seed) = &config.bootstrap_admin {
        database::bootstrap_admin(&pool, seed, config.auth.bcrypt_cost).await?;
    }

    let state = AppState {
        db: pool,
        auth: config.auth.clone(),
    };

    router(state, config)
}

/// Wires routes and layers around an existing state. Split from `build` so the
/// router can be driven without a live database.
pub fn router(state: AppState, config: &AppConfig) -> Result<Router> {
    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_origin(allowed_origins);

    let app = routes::create_router(&state)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
