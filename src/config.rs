use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 5000;
const CONFIG_DIR: &str = "config";
const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 15;
const DEFAULT_EMAIL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TOKEN_EXPIRATION_SECS: u64 = 30 * 60;
const DEFAULT_CURRENCY: &str = "NGN";

/// Application configuration, loaded once at process start and passed by
/// reference into every component. Nothing reads ambient globals.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (Postgres or SQLite)
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment ("development", "production", ...)
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

    /// Paystack secret key, sent as a bearer token on every gateway call
    #[validate(length(min = 1))]
    pub paystack_secret_key: String,

    /// Paystack public key, handed to the client for the popup flow
    #[validate(length(min = 1))]
    pub paystack_public_key: String,

    /// Gateway base URL; overridden in tests to point at a mock server
    #[serde(default = "default_paystack_base_url")]
    pub paystack_base_url: String,

    /// Bounded timeout for gateway calls (seconds)
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,

    /// Currency code sent to the gateway
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Email delivery API endpoint; unset disables outbound email
    #[serde(default)]
    pub email_api_url: Option<String>,

    /// Bearer key for the email delivery API
    #[serde(default)]
    pub email_api_key: Option<String>,

    /// From address on order confirmations
    #[serde(default = "default_email_from")]
    pub email_from: String,

    /// Bounded timeout for email delivery (seconds)
    #[serde(default = "default_email_timeout_secs")]
    pub email_timeout_secs: u64,

    /// Shared admin secret exchanged for a session token at login
    #[validate(length(min = 8))]
    pub admin_password: String,

    /// Signing secret for admin session tokens (minimum 32 characters)
    #[validate(length(min = 32), custom = "validate_token_secret")]
    pub admin_token_secret: String,

    /// Admin session token lifetime (seconds)
    #[serde(default = "default_token_expiration_secs")]
    pub admin_token_expiration_secs: u64,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_paystack_base_url() -> String {
    DEFAULT_PAYSTACK_BASE_URL.to_string()
}
fn default_gateway_timeout_secs() -> u64 {
    DEFAULT_GATEWAY_TIMEOUT_SECS
}
fn default_email_timeout_secs() -> u64 {
    DEFAULT_EMAIL_TIMEOUT_SECS
}
fn default_token_expiration_secs() -> u64 {
    DEFAULT_TOKEN_EXPIRATION_SECS
}
fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}
fn default_email_from() -> String {
    "orders@storefront.local".to_string()
}

/// The token secret must carry real entropy, not a repeated filler char.
fn validate_token_secret(secret: &str) -> Result<(), ValidationError> {
    let unique: std::collections::HashSet<char> = secret.chars().collect();
    if unique.len() < 10 {
        let mut err = ValidationError::new("admin_token_secret");
        err.message =
            Some("admin_token_secret must have at least 10 unique characters".into());
        return Err(err);
    }
    Ok(())
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Permissive CORS is only acceptable in development or when the
    /// operator explicitly opted in.
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads application configuration.
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // NOTE: the gateway keys and admin secrets have no defaults - they MUST
    // be provided via environment variables or config files.
    let builder = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;

    Ok(app_config)
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}
