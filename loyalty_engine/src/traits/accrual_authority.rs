use thiserror::Error;

use crate::db_types::{OrderNumber, Points};

/// Every variant is transient: the order stays where it is and is retried on the next tick.
#[derive(Debug, Clone, Error)]
pub enum AccrualAuthorityError {
    #[error("Could not reach the accrual system: {0}")]
    Unavailable(String),
    #[error("The accrual system did not answer in time")]
    Timeout,
    #[error("The accrual system asked us to back off for {0} seconds")]
    RateLimited(u64),
    #[error("The accrual system sent an invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualReport {
    /// The order number the authority is reporting on.
    pub order: String,
    pub status: AuthorityStatus,
    pub accrual: Option<Points>,
}

/// The client side of the external accrual system protocol.
#[allow(async_fn_in_trait)]
pub trait AccrualAuthority {
    /// Fetches the accrual status of an order. `Ok(None)` means the authority does not know about the order yet.
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<Option<AccrualReport>, AccrualAuthorityError>;
}
