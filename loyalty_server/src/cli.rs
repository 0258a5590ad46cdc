use clap::Parser;
use lp_common::Secret;

/// Command line flags. Every flag falls back to its environment variable, and then to the default.
///
/// The remaining settings are only configurable from the environment. See [`crate::config`].
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Loyalty points server", long_about = None)]
pub struct Cli {
    /// The address to listen on, as `host:port`
    #[arg(short = 'a', long = "address", env = "RUN_ADDRESS", default_value = "127.0.0.1:8080")]
    pub run_address: String,
    /// The database URL
    #[arg(short = 'd', long = "database", env = "DATABASE_URI", default_value = "sqlite://data/loyalty.db")]
    pub database_uri: String,
    /// The base URL of the accrual system
    #[arg(short = 'r', long = "accrual", env = "ACCRUAL_SYSTEM_ADDRESS", default_value = "http://127.0.0.1:8081")]
    pub accrual_system_address: String,
    /// The secret used to sign session tokens. A random one is generated for each run if omitted.
    #[arg(short = 's', long = "jwt-secret", env = "LPS_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,
}

impl Cli {
    pub fn jwt_secret(&self) -> Option<Secret<String>> {
        self.jwt_secret.clone().filter(|s| !s.is_empty()).map(Secret::new)
    }
}
