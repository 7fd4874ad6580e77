/// Configuration management for the rain service
///
/// All settings come from environment variables with development defaults;
/// the JWT secret must be set explicitly in production.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Auth (JWT validation) configuration
    pub auth: AuthConfig,
    /// Relevance scorer / context generator endpoint
    pub scorer: ScorerConfig,
    /// Document fetcher (reader API) endpoint
    pub fetcher: FetcherConfig,
    /// Image synthesis endpoint
    pub imagery: ImageryConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Connection acquisition timeout
    pub acquire_timeout_secs: u64,
}

/// JWT validation configuration. Tokens are issued by the external
/// identity service; this service only validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Relevance scorer / context generator (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_scorer_timeout_secs")]
    pub timeout_secs: u64,
}

/// Document fetcher (reader API returning cleaned markdown)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    pub base_url: String,
    pub content_timeout_secs: u64,
    pub metadata_timeout_secs: u64,
}

/// Image synthesis API. Disabled when no key is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageryConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(value) => value,
            Err(_) if app_env.eq_ignore_ascii_case("production") => {
                return Err("JWT_SECRET must be set in production".to_string())
            }
            Err(_) => "rain-dev-secret".to_string(),
        };

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("RAIN_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("RAIN_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8084),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if app_env.eq_ignore_ascii_case("production") => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };
                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/rain".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
                acquire_timeout_secs: std::env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            auth: AuthConfig { jwt_secret },
            scorer: ScorerConfig {
                base_url: std::env::var("SCORER_BASE_URL")
                    .unwrap_or_else(|_| "https://api.cerebras.ai/v1".to_string()),
                api_key: std::env::var("SCORER_API_KEY").unwrap_or_default(),
                timeout_secs: std::env::var("SCORER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(default_scorer_timeout_secs),
            },
            fetcher: FetcherConfig {
                base_url: std::env::var("FETCHER_BASE_URL")
                    .unwrap_or_else(|_| "https://r.jina.ai".to_string()),
                content_timeout_secs: std::env::var("FETCHER_CONTENT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
                metadata_timeout_secs: std::env::var("FETCHER_METADATA_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(15),
            },
            imagery: ImageryConfig {
                base_url: std::env::var("IMAGERY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.runware.ai/v1".to_string()),
                api_key: std::env::var("IMAGERY_API_KEY").ok().filter(|k| !k.is_empty()),
                timeout_secs: std::env::var("IMAGERY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            },
        })
    }
}

fn default_scorer_timeout_secs() -> u64 {
    30
}
