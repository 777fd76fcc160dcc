use std::{env, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use mkt_common::{helpers::parse_boolean_flag, Secret};

use crate::errors::ServerError;

const DEFAULT_MPS_HOST: &str = "127.0.0.1";
const DEFAULT_MPS_PORT: u16 = 4000;
const DEFAULT_TOKEN_VALIDITY: Duration = Duration::hours(24);
const DEFAULT_PROCESSOR_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Trust the `X-Forwarded-For` header for the peer address in access logs. Set this when the server sits
    /// behind a reverse proxy; otherwise every request logs the proxy's address.
    pub use_x_forwarded_for: bool,
    pub auth: AuthConfig,
    /// Connection details for the external payment processor.
    pub processor: ProcessorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MPS_HOST.to_string(),
            port: DEFAULT_MPS_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            auth: AuthConfig::default(),
            processor: ProcessorConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MPS_HOST").ok().unwrap_or_else(|| DEFAULT_MPS_HOST.into());
        let port = env::var("MPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MPS_PORT. {e} Using the default, {DEFAULT_MPS_PORT}, instead."
                    );
                    DEFAULT_MPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MPS_PORT);
        let database_url = env::var("MPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MPS_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("MPS_USE_X_FORWARDED_FOR").ok(), false);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let processor = ProcessorConfig::from_env_or_default();
        Self { host, port, database_url, use_x_forwarded_for, auth, processor }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The secret used to sign and verify access tokens (HS256).
    pub jwt_secret: Secret<String>,
    /// How long issued access tokens stay valid.
    pub token_validity: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. Every \
             restart will invalidate all outstanding tokens. DO NOT operate on production like this. Set the \
             MPS_JWT_SECRET environment variable instead. 🚨️🚨️🚨️"
        );
        let secret = format!("{:032x}{:032x}", rand::random::<u128>(), rand::random::<u128>());
        Self { jwt_secret: Secret::new(secret), token_validity: DEFAULT_TOKEN_VALIDITY }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("MPS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [MPS_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "MPS_JWT_SECRET must be at least 32 characters long.".to_string(),
            ));
        }
        let token_validity = env::var("MPS_JWT_VALIDITY_HOURS")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for MPS_JWT_VALIDITY_HOURS. {e}"))
                    .ok()
            })
            .map(Duration::hours)
            .unwrap_or(DEFAULT_TOKEN_VALIDITY);
        Ok(Self { jwt_secret: Secret::new(secret), token_validity })
    }
}

//-----------------------------------------------  RedirectUrls  -------------------------------------------------------
/// The storefront pages the processor redirects buyers to after checkout. Shared with the route handlers, which
/// append the session or product reference when opening a session.
#[derive(Clone, Debug)]
pub struct RedirectUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl From<&ProcessorConfig> for RedirectUrls {
    fn from(config: &ProcessorConfig) -> Self {
        Self { success_url: config.success_url.clone(), cancel_url: config.cancel_url.clone() }
    }
}

//----------------------------------------------  ProcessorConfig  -----------------------------------------------------
/// Connection details for the external payment processor's REST API.
#[derive(Clone, Debug, Default)]
pub struct ProcessorConfig {
    /// Base URL, e.g. `https://api.processor.example`.
    pub base_url: String,
    pub secret_key: Secret<String>,
    /// Where the processor sends the buyer after a successful payment.
    pub success_url: String,
    /// Where the processor sends the buyer after an abandoned payment.
    pub cancel_url: String,
    /// Per-call timeout for processor requests.
    pub timeout: StdDuration,
}

impl ProcessorConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("MPS_PROCESSOR_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MPS_PROCESSOR_URL is not set. Please set it to the payment processor's API base URL.");
            String::default()
        });
        let secret_key = env::var("MPS_PROCESSOR_SECRET_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ MPS_PROCESSOR_SECRET_KEY is not set. Processor calls will not be authorised.");
            String::default()
        });
        let success_url = env::var("MPS_SUCCESS_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MPS_SUCCESS_URL is not set. Buyers will not be redirected anywhere useful after paying.");
            String::default()
        });
        let cancel_url = env::var("MPS_CANCEL_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MPS_CANCEL_URL is not set. Buyers will not be redirected anywhere useful after cancelling.");
            String::default()
        });
        let timeout = env::var("MPS_PROCESSOR_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for MPS_PROCESSOR_TIMEOUT. {e}"))
                    .ok()
            })
            .map(StdDuration::from_secs)
            .unwrap_or(StdDuration::from_secs(DEFAULT_PROCESSOR_TIMEOUT_SECS));
        Self { base_url, secret_key: Secret::new(secret_key), success_url, cancel_url, timeout }
    }
}
