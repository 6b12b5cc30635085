mod app_config;

pub use app_config::{AdminSeed, AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig};
