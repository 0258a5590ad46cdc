use thiserror::Error;

use crate::db_types::{Balance, NewWithdrawal, Points, Withdrawal};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid order number: {0}")]
    InvalidFormat(String),
    #[error("Withdrawal amount must be positive, not {0}")]
    InvalidAmount(Points),
    #[error("User #{0} has no balance record")]
    BalanceNotFound(i64),
    #[error("Insufficient funds to withdraw {requested}")]
    InsufficientFunds { requested: Points },
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// Balance and withdrawal bookkeeping.
///
/// There is no public credit method. Balances only increase when an order becomes `Processed`, via
/// [`crate::traits::OrderManagement::advance_order_status`].
#[allow(async_fn_in_trait)]
pub trait LedgerManagement: Clone {
    /// Creates a zero balance for the user if one does not exist yet.
    async fn initialize_balance(&self, user_id: i64) -> Result<(), LedgerError>;

    async fn fetch_balance(&self, user_id: i64) -> Result<Option<Balance>, LedgerError>;

    /// Debits the balance and records the withdrawal as a single atomic unit.
    ///
    /// The debit only happens if the current balance covers the full amount, so the balance can never go negative,
    /// however many withdrawals race.
    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;

    /// All withdrawals for the user, newest first.
    async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;
}
