use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Database connection URL
    #[arg(long, env = "TRADEWIND_DATABASE_URL")]
    pub database_url: String,

    /// Log output format
    #[arg(long, env = "TRADEWIND_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub push: PushConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "TRADEWIND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "TRADEWIND_PORT", default_value_t = 3000)]
    pub port: u16,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret key for JWT signing
    #[arg(long, env = "TRADEWIND_JWT_SECRET")]
    pub jwt_secret: String,

    /// Access token time-to-live in seconds
    #[arg(long, env = "TRADEWIND_ACCESS_TOKEN_TTL_SECS", default_value_t = 900)]
    pub access_token_ttl_secs: u64,

    /// Refresh token time-to-live in days
    #[arg(long, env = "TRADEWIND_REFRESH_TOKEN_TTL_DAYS", default_value_t = 30)]
    pub refresh_token_ttl_days: i64,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed for standard endpoints
    #[arg(long, env = "TRADEWIND_RATE_LIMIT_PER_SECOND", default_value_t = 10)]
    pub per_second: u32,

    /// Burst allowance for standard endpoints
    #[arg(long, env = "TRADEWIND_RATE_LIMIT_BURST", default_value_t = 20)]
    pub burst: u32,

    /// Stricter rate limit for expensive auth-related endpoints (register/login)
    #[arg(long, env = "TRADEWIND_AUTH_RATE_LIMIT_PER_SECOND", default_value_t = 1)]
    pub auth_per_second: u32,

    /// Burst allowance for expensive auth-related endpoints
    #[arg(long, env = "TRADEWIND_AUTH_RATE_LIMIT_BURST", default_value_t = 3)]
    pub auth_burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct PushConfig {
    /// FCM server key; push delivery is logged but skipped when unset
    #[arg(long, env = "TRADEWIND_FCM_SERVER_KEY")]
    pub fcm_server_key: Option<String>,

    /// FCM HTTP endpoint
    #[arg(long, env = "TRADEWIND_FCM_ENDPOINT", default_value = "https://fcm.googleapis.com/fcm/send")]
    pub fcm_endpoint: String,

    /// Timeout for a single push delivery attempt
    #[arg(long, env = "TRADEWIND_PUSH_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
