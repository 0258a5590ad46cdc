use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType, Points},
    traits::{InsertOrderResult, StatusUpdate},
};

#[derive(Debug, Clone, Error)]
pub enum OrderRegistryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order with id {0} does not exist")]
    OrderIdNotFound(i64),
    #[error("Cannot move an order to {to}. Only {from:?} orders can do that")]
    IllegalTransition { from: Vec<OrderStatusType>, to: OrderStatusType },
    #[error("Order {0} cannot be credited because user #{1} has no balance")]
    BalanceNotFound(i64, i64),
    #[error("Accrual for order {0} cannot be negative")]
    NegativeAccrual(i64),
    #[error("Crediting order {0} would overflow the balance of user #{1}")]
    BalanceOverflow(i64, i64),
}

impl From<sqlx::Error> for OrderRegistryError {
    fn from(e: sqlx::Error) -> Self {
        OrderRegistryError::DatabaseError(e.to_string())
    }
}

/// Registration, lookup and status management of orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Registers a new order number.
    ///
    /// Uniqueness is enforced by storage, not by a prior lookup, so concurrent inserts of the same number resolve to
    /// exactly one `Inserted` and `DuplicateKey` for everyone else, carrying the winner's user id.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderRegistryError>;

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderRegistryError>;

    /// All orders for the user, newest first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderRegistryError>;

    /// All `New` and `Processing` orders, oldest first.
    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, OrderRegistryError>;

    /// Moves the order to `new_status` if, and only if, it is currently in one of the valid predecessor states for
    /// `new_status`.
    ///
    /// When the new status is `Processed` and `accrual` is positive, the owner's balance is credited in the same
    /// atomic unit as the status change. Since the status change can only succeed once, the credit can only happen
    /// once.
    async fn advance_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        accrual: Points,
    ) -> Result<StatusUpdate, OrderRegistryError>;
}
