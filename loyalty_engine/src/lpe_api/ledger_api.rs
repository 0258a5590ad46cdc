use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Balance, NewWithdrawal, OrderNumber, Points, Withdrawal},
    traits::{LedgerError, LedgerManagement},
};

/// `LedgerApi` reports balances and spends points on behalf of users.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B: Clone> Clone for LedgerApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    pub async fn initialize_balance(&self, user_id: i64) -> Result<(), LedgerError> {
        self.db.initialize_balance(user_id).await
    }

    /// Every registered user has a balance, so a missing one is a data integrity fault.
    pub async fn balance(&self, user_id: i64) -> Result<Balance, LedgerError> {
        self.db.fetch_balance(user_id).await?.ok_or_else(|| {
            error!("💰️ User #{user_id} has no balance record. This should not happen for a registered user.");
            LedgerError::BalanceNotFound(user_id)
        })
    }

    /// Spends `sum` points against a future order.
    pub async fn withdraw(&self, user_id: i64, order_number: &str, sum: Points) -> Result<Withdrawal, LedgerError> {
        let order_number = OrderNumber::parse(order_number).map_err(|e| LedgerError::InvalidFormat(e.0))?;
        if !sum.is_positive() {
            return Err(LedgerError::InvalidAmount(sum));
        }
        let withdrawal = self.db.withdraw(NewWithdrawal::new(user_id, order_number, sum)).await?;
        info!("💰️ User #{user_id} withdrew {sum} points against order {}", withdrawal.order_number);
        Ok(withdrawal)
    }

    /// The user's withdrawals, newest first.
    pub async fn withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        self.db.fetch_withdrawals(user_id).await
    }
}
