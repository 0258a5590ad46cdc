//! Adapts the accrual system REST client to the engine's [`AccrualAuthority`] seam.
use std::time::Duration;

use accrual_tools::{AccrualApi, AccrualApiError, AccrualConfig, AccrualResponse, AccrualStatus};
use log::*;
use loyalty_engine::{
    db_types::OrderNumber,
    traits::{AccrualReport, AuthorityStatus},
    AccrualAuthority,
    AccrualAuthorityError,
};

use crate::errors::ServerError;

/// Extra time allowed on top of the HTTP client's own timeout before the outer timeout fires.
const TIMEOUT_GRACE: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct AccrualServiceClient {
    api: AccrualApi,
    timeout: Duration,
}

impl AccrualServiceClient {
    pub fn new(config: AccrualConfig) -> Result<Self, ServerError> {
        let timeout = config.request_timeout + TIMEOUT_GRACE;
        let api = AccrualApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api, timeout })
    }

    pub fn api(&self) -> &AccrualApi {
        &self.api
    }
}

impl AccrualAuthority for AccrualServiceClient {
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<Option<AccrualReport>, AccrualAuthorityError> {
        let response = tokio::time::timeout(self.timeout, self.api.get_order_accrual(number.as_str()))
            .await
            .map_err(|_| {
                warn!("🔄️ Accrual query for order {number} timed out after {:?}", self.timeout);
                AccrualAuthorityError::Timeout
            })?
            .map_err(authority_error)?;
        Ok(response.map(accrual_report))
    }
}

pub fn authority_error(e: AccrualApiError) -> AccrualAuthorityError {
    match e {
        AccrualApiError::RateLimited { retry_after } => AccrualAuthorityError::RateLimited(retry_after),
        AccrualApiError::JsonError(s) => AccrualAuthorityError::InvalidResponse(s),
        AccrualApiError::QueryError { status, message } => {
            AccrualAuthorityError::InvalidResponse(format!("HTTP {status}. {message}"))
        },
        AccrualApiError::RestResponseError(s) | AccrualApiError::Initialization(s) => {
            AccrualAuthorityError::Unavailable(s)
        },
    }
}

pub fn accrual_report(response: AccrualResponse) -> AccrualReport {
    let status = match response.status {
        AccrualStatus::Registered => AuthorityStatus::Registered,
        AccrualStatus::Processing => AuthorityStatus::Processing,
        AccrualStatus::Invalid => AuthorityStatus::Invalid,
        AccrualStatus::Processed => AuthorityStatus::Processed,
    };
    AccrualReport { order: response.order, status, accrual: response.accrual }
}
