use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_TAX_RATE_BPS: u32 = 1800;
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 5;
const DEV_DEFAULT_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";

/// Which payment gateway implementation to wire in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    /// Talk to the real payment processor over HTTPS.
    Rest,
    /// In-memory gateway for disconnected operation (demos, integration tests).
    Stub,
}

/// Payment gateway configuration. Credentials stay server-side only and are
/// never echoed back through any API surface.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_mode")]
    pub mode: GatewayMode,

    /// Base URL of the processor's REST API
    #[serde(default = "default_gateway_endpoint")]
    pub endpoint: String,

    /// Application id issued by the processor
    #[serde(default)]
    pub app_id: String,

    /// Application secret issued by the processor
    #[serde(default)]
    pub secret: String,

    /// Absolute URL the processor redirects the buyer back to after payment
    #[serde(default = "default_return_url")]
    pub return_url: String,

    /// Bound on every gateway call; elapsed means unavailable, not failed
    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,

    /// Verdict the stub gateway reports for unscripted orders: "success" or "failed"
    #[serde(default = "default_stub_outcome")]
    pub stub_outcome: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mode: GatewayMode::Stub,
            endpoint: default_gateway_endpoint(),
            app_id: String::new(),
            secret: String::new(),
            return_url: default_return_url(),
            timeout_secs: default_gateway_timeout_secs(),
            stub_outcome: default_stub_outcome(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Secret used to verify identity-provider bearer tokens
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Currency every order is priced in (single-currency storefront)
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Tax rate applied to the cart subtotal, in basis points
    #[validate(range(max = 10_000))]
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB connect timeout (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    #[serde(default)]
    #[validate]
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Minimal constructor used by tests and embedded setups.
    pub fn new(
        database_url: impl Into<String>,
        jwt_secret: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            host: host.into(),
            port,
            environment: environment.into(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            currency: DEFAULT_CURRENCY.to_string(),
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            db_max_connections: 5,
            db_min_connections: 1,
            db_connect_timeout_secs: 30,
            gateway: GatewayConfig::default(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
            || self.environment.eq_ignore_ascii_case("test")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

fn default_database_url() -> String {
    "sqlite://coursedesk.db?mode=rwc".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_gateway_mode() -> GatewayMode {
    GatewayMode::Rest
}

fn default_gateway_endpoint() -> String {
    "https://sandbox.gateway.example/pg".to_string()
}

fn default_return_url() -> String {
    "http://localhost:3000/checkout/confirm".to_string()
}

fn default_gateway_timeout_secs() -> u64 {
    DEFAULT_GATEWAY_TIMEOUT_SECS
}

fn default_stub_outcome() -> String {
    "success".to_string()
}

/// Loads configuration from layered sources:
/// config/default.toml, config/{environment}.toml, then APP__* env vars.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = env::var("APP_ENVIRONMENT").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"));

    // A dev-only fallback so the service boots without any local config.
    if run_env == DEFAULT_ENV && env::var("APP__JWT_SECRET").is_err() {
        builder = builder.set_default("jwt_secret", DEV_DEFAULT_JWT_SECRET)?;
    }

    let cfg: AppConfig = builder.build()?.try_deserialize()?;

    cfg.validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

    info!(
        environment = %cfg.environment,
        port = cfg.port,
        "configuration loaded"
    );

    Ok(cfg)
}

/// Initializes the global tracing subscriber.
pub fn init_tracing(log_level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}
