use std::{env, str::FromStr};

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub bootstrap_admin: Option<AdminSeed>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

/// Credentials of the admin account ensured at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. `from_env` is the production entry point.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bcrypt_cost: u32 = parse_or(&get, "BCRYPT_COST", 10)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(AppError::ConfigError(
                "BCRYPT_COST must be between 4 and 31".to_string(),
            ));
        }

        let jwt_secret = required(&get, "JWT_SECRET")?;

        let bootstrap_admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed { email, password })
            }
            _ => None,
        };

        Ok(Self {
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&get, "PORT", 5000)?,
                max_body_size: parse_or(&get, "MAX_BODY_SIZE", 1_048_576)?,
            },
            database: DatabaseConfig {
                url: required(&get, "DB_URL")?,
                max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
            },
            cors: CorsConfig {
                allowed_origins: get("FRONTEND_URL")
                    .unwrap_or_else(|| "http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            auth: AuthConfig {
                jwt_secret,
                token_ttl_hours: parse_or(&get, "JWT_EXPIRATION_HOURS", 24)?,
                bcrypt_cost,
            },
            bootstrap_admin,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn required<F>(get: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::ConfigError(format!("{} not set", key)))
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::ConfigError(format!("Invalid {} value", key))),
        None => Ok(default),
    }
}
