//! `SqliteDatabase` is the SQLite implementation of a Loyalty Engine backend.
//!
//! It implements all the storage traits defined in the [`crate::traits`] module.
use std::{fmt::Debug, time::Duration};

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{balances, is_unique_violation, new_pool, orders, users, withdrawals};
use crate::{
    db_types::{Balance, NewOrder, NewWithdrawal, Order, OrderNumber, OrderStatusType, Points, UserAccount, Withdrawal},
    traits::{
        AuthApiError,
        AuthManagement,
        InsertOrderResult,
        LedgerError,
        LedgerManagement,
        OrderManagement,
        OrderRegistryError,
        StatusUpdate,
    },
};

pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        SqliteDatabase::new_with_options(url, max_connections, DEFAULT_STORAGE_TIMEOUT).await
    }

    /// `timeout` bounds how long any storage call waits for a connection or for the write lock.
    pub async fn new_with_options(url: &str, max_connections: u32, timeout: Duration) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections, timeout).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Checks that the database answers a trivial query.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderRegistryError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_pending_orders(&mut conn).await?;
        Ok(orders)
    }

    /// The status change and the credit share one transaction. The transaction opens with the conditional update, so
    /// if two callers race to advance the same order, the second one sees the new status and changes nothing.
    async fn advance_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        accrual: Points,
    ) -> Result<StatusUpdate, OrderRegistryError> {
        let predecessors = OrderStatusType::valid_predecessors(new_status);
        if predecessors.is_empty() {
            return Err(OrderRegistryError::IllegalTransition { from: vec![], to: new_status });
        }
        if accrual.is_negative() {
            return Err(OrderRegistryError::NegativeAccrual(order_id));
        }
        let accrual = if new_status == OrderStatusType::Processed { accrual } else { Points::ZERO };
        let mut tx = self.pool.begin().await?;
        let updated = orders::update_order_status(order_id, new_status, accrual, predecessors, &mut tx).await?;
        let Some(order) = updated else {
            let exists = orders::fetch_order_by_id(order_id, &mut tx).await?.is_some();
            tx.commit().await?;
            if !exists {
                return Err(OrderRegistryError::OrderIdNotFound(order_id));
            }
            trace!("🗃️ Order #{order_id} is not in a state that can move to {new_status}. Nothing to do.");
            return Ok(StatusUpdate::Unchanged);
        };
        let mut credited = Points::ZERO;
        if new_status == OrderStatusType::Processed && accrual.is_positive() {
            if !balances::credit(order.user_id, accrual, &mut tx).await? {
                let exists = balances::fetch_balance(order.user_id, &mut tx).await?.is_some();
                tx.rollback().await?;
                if exists {
                    error!(
                        "🗃️ Crediting {accrual} for order {} would overflow the balance of user #{}. Rolling back.",
                        order.number, order.user_id
                    );
                    return Err(OrderRegistryError::BalanceOverflow(order.id, order.user_id));
                }
                error!(
                    "🗃️ Order {} is processed, but its owner #{} has no balance. Rolling back.",
                    order.number, order.user_id
                );
                return Err(OrderRegistryError::BalanceNotFound(order.id, order.user_id));
            }
            credited = accrual;
        }
        tx.commit().await?;
        debug!("🗃️ Order {} moved to {new_status}. {credited} credited to user #{}", order.number, order.user_id);
        Ok(StatusUpdate::Advanced { order, credited })
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn initialize_balance(&self, user_id: i64) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        balances::initialize_balance(user_id, &mut conn).await?;
        Ok(())
    }

    async fn fetch_balance(&self, user_id: i64) -> Result<Option<Balance>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balances::fetch_balance(user_id, &mut conn).await?;
        Ok(balance)
    }

    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        let user_id = withdrawal.user_id;
        let sum = withdrawal.sum;
        let mut tx = self.pool.begin().await?;
        if !balances::debit(user_id, sum, &mut tx).await? {
            let exists = balances::fetch_balance(user_id, &mut tx).await?.is_some();
            tx.rollback().await?;
            return if exists {
                debug!("🗃️ User #{user_id} cannot withdraw {sum}. Insufficient funds.");
                Err(LedgerError::InsufficientFunds { requested: sum })
            } else {
                Err(LedgerError::BalanceNotFound(user_id))
            };
        }
        let record = withdrawals::insert_withdrawal(withdrawal, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ User #{user_id} withdrew {sum} against order {}", record.order_number);
        Ok(record)
    }

    async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals(user_id, &mut conn).await?;
        Ok(withdrawals)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<UserAccount, AuthApiError> {
        let mut tx = self.pool.begin().await?;
        let user = match users::insert_user(login, password_hash, &mut tx).await {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => return Err(AuthApiError::LoginTaken(login.to_string())),
            Err(e) => return Err(e.into()),
        };
        balances::initialize_balance(user.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ User '{}' created with id #{}", user.login, user.id);
        Ok(user)
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_login(login, &mut conn).await?;
        Ok(user)
    }
}
