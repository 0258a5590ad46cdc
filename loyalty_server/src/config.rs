//! Server configuration.
//!
//! The listen address, database URL, accrual system address and JWT secret come from the command line (see
//! [`crate::cli::Cli`]), which falls back to the environment. The following settings are read from the environment
//! only:
//!
//! | Variable                    | Default | Meaning                                         |
//! |-----------------------------|---------|-------------------------------------------------|
//! | `LPS_ACCRUAL_POLL_INTERVAL` | 2       | Seconds between accrual worker ticks            |
//! | `LPS_ACCRUAL_TIMEOUT`       | 5       | Seconds before a request to the accrual system is abandoned |
//! | `LPS_STORAGE_TIMEOUT`       | 3       | Seconds to wait for a database connection or the write lock |
//! | `LPS_RATE_LIMIT`            | 10      | Single order lookups allowed per client per minute |
//! | `LPS_MAX_DB_CONNECTIONS`    | 25      | Database pool size                              |
//! | `LPS_USE_X_FORWARDED_FOR`   | false   | Trust `X-Forwarded-For` for the client address  |
use std::{env, fmt::Display, str::FromStr, time::Duration};

use accrual_tools::AccrualConfig;
use log::*;
use lp_common::{helpers::parse_boolean_flag, Secret};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::{cli::Cli, errors::ServerError};

const DEFAULT_LPS_HOST: &str = "127.0.0.1";
const DEFAULT_LPS_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty.db";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_ACCRUAL_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_RATE_LIMIT: u32 = 10;
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 30);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    /// Bounds every storage call: both the wait for a pooled connection and the wait for the SQLite write lock.
    pub storage_timeout: Duration,
    pub accrual: AccrualConfig,
    pub accrual_poll_interval: Duration,
    pub auth: AuthConfig,
    /// Single order lookups allowed per client per minute.
    pub rate_limit: u32,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LPS_HOST.to_string(),
            port: DEFAULT_LPS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            accrual: AccrualConfig::default(),
            accrual_poll_interval: DEFAULT_POLL_INTERVAL,
            auth: AuthConfig::default(),
            rate_limit: DEFAULT_RATE_LIMIT,
            use_x_forwarded_for: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    /// Combines the command line flags with the environment-only settings.
    pub fn from_cli(cli: Cli) -> Result<Self, ServerError> {
        let (host, port) = parse_run_address(&cli.run_address)?;
        let auth = match cli.jwt_secret() {
            Some(secret) => AuthConfig::new(secret),
            None => AuthConfig::default(),
        };
        let accrual_timeout = duration_from_env("LPS_ACCRUAL_TIMEOUT", DEFAULT_ACCRUAL_TIMEOUT);
        let accrual = AccrualConfig::new(&cli.accrual_system_address, accrual_timeout);
        info!("🪛️ Accrual system: {} (timeout {accrual_timeout:?})", accrual.base_url);
        let accrual_poll_interval = duration_from_env("LPS_ACCRUAL_POLL_INTERVAL", DEFAULT_POLL_INTERVAL);
        let storage_timeout = duration_from_env("LPS_STORAGE_TIMEOUT", DEFAULT_STORAGE_TIMEOUT);
        let rate_limit = number_from_env("LPS_RATE_LIMIT", DEFAULT_RATE_LIMIT);
        let max_db_connections = number_from_env("LPS_MAX_DB_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS);
        let use_x_forwarded_for = parse_boolean_flag(env::var("LPS_USE_X_FORWARDED_FOR").ok(), false);
        Ok(Self {
            host,
            port,
            database_url: cli.database_uri,
            max_db_connections,
            storage_timeout,
            accrual,
            accrual_poll_interval,
            auth,
            rate_limit,
            use_x_forwarded_for,
        })
    }
}

/// Splits `host:port`. A bare `:port` listens on the default host.
pub fn parse_run_address(address: &str) -> Result<(String, u16), ServerError> {
    let (host, port) = address
        .trim()
        .rsplit_once(':')
        .ok_or_else(|| ServerError::ConfigurationError(format!("'{address}' is not a valid host:port address")))?;
    let port = port
        .parse::<u16>()
        .map_err(|e| ServerError::ConfigurationError(format!("'{port}' is not a valid port. {e}")))?;
    let host = match host.trim_start_matches('[').trim_end_matches(']') {
        "" => DEFAULT_LPS_HOST.to_string(),
        h => h.to_string(),
    };
    Ok((host, port))
}

fn number_from_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + PartialOrd + Default,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => match s.trim().parse::<T>() {
            Ok(v) if v > T::default() => v,
            Ok(_) => {
                warn!("🪛️ {name} must be positive. Using the default value of {default} instead.");
                default
            },
            Err(e) => {
                warn!("🪛️ Invalid configuration value for {name}: {s}. {e}. Using the default value of {default}.");
                default
            },
        },
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

fn duration_from_env(name: &str, default: Duration) -> Duration {
    Duration::from_secs(number_from_env(name, default.as_secs()))
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret used to sign and verify session tokens.
    pub jwt_secret: Secret<String>,
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. Every token will be \
             invalidated when the server restarts. If this is a production instance, you are doing it wrong! Set \
             the LPS_JWT_SECRET environment variable instead. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: Secret<String>) -> Self {
        Self { jwt_secret, token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for }
    }
}
