use std::env;
use std::time::Duration;

/// Deployment environment, mirrors `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Dev,
    Staging,
    Prod,
}

impl AppEnv {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub session_expiry_secs: i64,
    pub id_token_expiry_secs: i64,
    pub password_reset_expiry_secs: i64,
    pub store_timeout_secs: u64,
    pub app_env: AppEnv,
    pub app_url: String,
    pub frontend_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("BACKEND_PORT", 3000),
            session_secret: env::var("SESSION_SECRET")?,
            // Five days, matching the identity provider's session cookie maximum.
            session_expiry_secs: parse_or("SESSION_EXPIRY_SECS", 432_000),
            id_token_expiry_secs: parse_or("ID_TOKEN_EXPIRY_SECS", 3600),
            password_reset_expiry_secs: parse_or("PASSWORD_RESET_EXPIRY_SECS", 3600),
            store_timeout_secs: parse_or("STORE_TIMEOUT_SECS", 10),
            app_env: AppEnv::parse(&env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())),
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        })
    }

    pub fn is_prod(&self) -> bool {
        self.app_env == AppEnv::Prod
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
