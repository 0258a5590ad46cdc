use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use lp_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::is_valid_order_number;

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// A checksum-validated order number.
///
/// Order numbers are opaque digit strings. They are compared as strings and never parsed into an integer, so leading
/// zeros are significant and there is no length limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize)]
#[sqlx(transparent)]
pub struct OrderNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid order number: '{0}'")]
pub struct InvalidOrderNumber(pub String);

impl OrderNumber {
    /// Validates the Luhn checksum of `s` exactly as given. Whitespace counts as a non-digit.
    pub fn parse(s: &str) -> Result<Self, InvalidOrderNumber> {
        if is_valid_order_number(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidOrderNumber(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = InvalidOrderNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        OrderNumber::parse(&s).map_err(serde::de::Error::custom)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been uploaded, and the accrual system has not reported on it yet.
    New,
    /// The accrual system knows about the order and is calculating the reward.
    Processing,
    /// The accrual system has rejected the order. No points will be awarded. Final.
    Invalid,
    /// The accrual system has calculated the reward, and it has been credited. Final.
    Processed,
}

impl OrderStatusType {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    /// The statuses an order may be in in order to move to `target`. Orders only ever move forward.
    ///
    /// | From \ To  | New | Processing | Invalid | Processed |
    /// |------------|-----|------------|---------|-----------|
    /// | New        | -   | Yes        | Yes     | Yes       |
    /// | Processing | -   | -          | Yes     | Yes       |
    /// | Invalid    | -   | -          | -       | -         |
    /// | Processed  | -   | -          | -       | -         |
    pub fn valid_predecessors(target: OrderStatusType) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match target {
            New => &[],
            Processing => &[New],
            Invalid | Processed => &[New, Processing],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        Self::valid_predecessors(next).contains(self)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to New");
            OrderStatusType::New
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    /// The user that uploaded the order. Never changes.
    pub user_id: i64,
    pub status: OrderStatusType,
    /// Zero unless the order is `Processed`.
    pub accrual: Points,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub number: OrderNumber,
    pub user_id: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(number: OrderNumber, user_id: i64) -> Self {
        Self { number, user_id, uploaded_at: Utc::now() }
    }
}

//--------------------------------------        Balance       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Balance {
    pub user_id: i64,
    /// Points available to spend. Never negative.
    pub current: Points,
    /// Total points ever withdrawn. Never decreases.
    pub withdrawn: Points,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Withdrawal      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    /// The future order the points are spent against.
    pub order_number: OrderNumber,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: i64,
    pub order_number: OrderNumber,
    pub sum: Points,
}

impl NewWithdrawal {
    pub fn new(user_id: i64, order_number: OrderNumber, sum: Points) -> Self {
        Self { user_id, order_number, sum }
    }
}

//--------------------------------------      UserAccount      ---------------------------------------------------------
#[derive(Clone, FromRow)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    /// Argon2 hash in PHC string format
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("password_hash", &"****")
            .field("created_at", &self.created_at)
            .finish()
    }
}
