use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight campaign runs (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Non-terminal campaigns untouched for this long are failed (default: `60`).
    pub stale_campaign_minutes: i64,
    /// How often the staleness sweeper runs (default: `300`).
    pub stale_check_interval_secs: u64,
    /// Directory of rendered campaign images served as static files.
    pub images_dir: PathBuf,
    /// URL prefix `images_dir` is mounted under.
    pub images_url_prefix: String,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:3001` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                    |
    /// | `STALE_CAMPAIGN_MINUTES`    | `60`                    |
    /// | `STALE_CHECK_INTERVAL_SECS` | `300`                   |
    /// | `GENERATED_IMAGES_DIR`      | `./generated-images`    |
    /// | `GENERATED_IMAGES_URL`      | `/generated-images`     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3001".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let stale_campaign_minutes: i64 = std::env::var("STALE_CAMPAIGN_MINUTES")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("STALE_CAMPAIGN_MINUTES must be a valid i64");

        let stale_check_interval_secs: u64 = std::env::var("STALE_CHECK_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("STALE_CHECK_INTERVAL_SECS must be a valid u64");

        let images_dir = std::env::var("GENERATED_IMAGES_DIR")
            .unwrap_or_else(|_| "./generated-images".into())
            .into();
        let images_url_prefix =
            std::env::var("GENERATED_IMAGES_URL").unwrap_or_else(|_| "/generated-images".into());

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            stale_campaign_minutes,
            stale_check_interval_secs,
            images_dir,
            images_url_prefix,
            jwt,
        }
    }
}
