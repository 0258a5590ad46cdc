//! Request and response bodies for the JSON API.
use chrono::{DateTime, Utc};
use loyalty_engine::db_types::{Balance, Order, OrderStatusType, Points, Withdrawal};
use lp_common::Secret;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn into_parts(self) -> (String, Secret<String>) {
        (self.login, Secret::new(self.password))
    }
}

/// An entry in the order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub number: String,
    pub status: OrderStatusType,
    /// Only present once the order has been processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let accrual = (order.status == OrderStatusType::Processed).then_some(order.accrual);
        Self { number: order.number.to_string(), status: order.status, accrual, uploaded_at: order.uploaded_at }
    }
}

/// The status of a single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderStatusView {
    pub number: String,
    pub status: OrderStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

impl From<Order> for OrderStatusView {
    fn from(order: Order) -> Self {
        let OrderView { number, status, accrual, .. } = order.into();
        Self { number, status, accrual }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceView {
    pub current: Points,
    pub withdrawn: Points,
}

impl From<Balance> for BalanceView {
    fn from(balance: Balance) -> Self {
        Self { current: balance.current, withdrawn: balance.withdrawn }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Points,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalView {
    pub order: String,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalView {
    fn from(w: Withdrawal) -> Self {
        Self { order: w.order_number.to_string(), sum: w.sum, processed_at: w.processed_at }
    }
}
