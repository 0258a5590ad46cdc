use std::time::Duration;

pub const DEFAULT_ACCRUAL_ADDRESS: &str = "http://127.0.0.1:8081";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Base URL of the accrual system, without the `/api/...` path.
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_ACCRUAL_ADDRESS.to_string(), request_timeout: DEFAULT_REQUEST_TIMEOUT }
    }
}

impl AccrualConfig {
    pub fn new(base_url: &str, request_timeout: Duration) -> Self {
        Self { base_url: normalize_base_url(base_url), request_timeout }
    }
}

/// Accepts bare `host:port` addresses and strips trailing slashes.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}
