use std::sync::Arc;

use log::*;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};

use crate::{config::AccrualConfig, data_objects::AccrualResponse, AccrualApiError};

/// Used when the accrual system rate limits us without saying for how long.
const DEFAULT_RETRY_AFTER: u64 = 60;

#[derive(Clone)]
pub struct AccrualApi {
    config: AccrualConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for AccrualApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualApi ({})", self.config.base_url)
    }
}

impl AccrualApi {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &AccrualConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.config.base_url)
    }

    /// Asks the accrual system about a single order.
    ///
    /// Returns `Ok(None)` when the accrual system does not know about the order yet (HTTP 204).
    pub async fn get_order_accrual(&self, number: &str) -> Result<Option<AccrualResponse>, AccrualApiError> {
        let url = self.url(&format!("/orders/{number}"));
        trace!("Sending accrual query: {url}");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AccrualApiError::RestResponseError(format!("Request for order {number} timed out. {e}"))
            } else {
                AccrualApiError::RestResponseError(e.to_string())
            }
        })?;
        match response.status() {
            StatusCode::OK => {
                let result =
                    response.json::<AccrualResponse>().await.map_err(|e| AccrualApiError::JsonError(e.to_string()))?;
                debug!("Accrual system reports order {number} as {}", result.status);
                Ok(Some(result))
            },
            StatusCode::NO_CONTENT => {
                debug!("Order {number} is not registered with the accrual system yet");
                Ok(None)
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER);
                warn!("Accrual system is rate limiting us. Retry after {retry_after}s");
                Err(AccrualApiError::RateLimited { retry_after })
            },
            status => {
                let status = status.as_u16();
                let message =
                    response.text().await.map_err(|e| AccrualApiError::RestResponseError(e.to_string()))?;
                Err(AccrualApiError::QueryError { status, message })
            },
        }
    }
}
