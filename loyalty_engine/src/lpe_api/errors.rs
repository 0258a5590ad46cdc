use thiserror::Error;

use crate::traits::{AccrualAuthorityError, OrderRegistryError};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order number: {0}")]
    InvalidFormat(String),
    #[error("Order {0} does not exist")]
    NotFound(String),
    #[error(transparent)]
    Registry(#[from] OrderRegistryError),
}

#[derive(Debug, Clone, Error)]
pub enum AccrualSyncError {
    #[error(transparent)]
    Authority(#[from] AccrualAuthorityError),
    #[error("Asked about order {expected}, but the accrual system answered for order {reported}")]
    MismatchedReport { expected: String, reported: String },
    #[error("The accrual system reported a negative accrual for order {0}")]
    NegativeAccrual(String),
    #[error(transparent)]
    Registry(#[from] OrderRegistryError),
}

impl AccrualSyncError {
    /// Transient errors leave the order untouched, to be retried on the next tick.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Registry(OrderRegistryError::IllegalTransition { .. }))
    }
}
