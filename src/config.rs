use anyhow::Context;
use std::path::PathBuf;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Runtime settings, read once at start-up from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub debug_mode: bool,
    pub allowed_origins: Vec<String>,
    pub skip_migrations: bool,
    pub upload_dir: PathBuf,
    pub default_page_size: i64,
    pub write_rate_limit_per_minute: u32,
    /// Key rate limits on `X-Forwarded-For` and friends. Only safe behind a
    /// proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    /// Absolute origin used for canonical links on profile cards.
    pub public_base_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        let default_page_size = std::env::var("DEFAULT_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(50);

        let write_rate_limit_per_minute = std::env::var("WRITE_RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(30);

        Ok(Self {
            database_url,
            jwt_secret,
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            debug_mode: env_flag("DEBUG_MODE"),
            allowed_origins: parse_origins(
                &std::env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
            ),
            skip_migrations: env_flag("SKIP_MIGRATIONS"),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./uploads")),
            default_page_size,
            write_rate_limit_per_minute,
            trust_proxy_headers: env_flag("TRUST_PROXY_HEADERS"),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/matrimony_test".to_string(),
        jwt_secret: "test-secret".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        debug_mode: true,
        allowed_origins: Vec::new(),
        skip_migrations: true,
        upload_dir: PathBuf::from("./uploads"),
        default_page_size: 50,
        write_rate_limit_per_minute: 30,
        trust_proxy_headers: false,
        public_base_url: None,
    }
}
