//! # Loyalty engine public API
//!
//! The `lpe_api` module exposes the programmatic API for the Loyalty Engine. The API is modular, so that clients of
//! the API can pick and choose the functionality they want.
//!
//! * [`order_flow_api`] registers uploaded orders and serves order history.
//! * [`ledger_api`] serves balances and handles withdrawals.
//! * [`auth_api`] registers users and checks their credentials.
//! * [`accrual_sync_api`] reconciles pending orders with the external accrual system, one tick at a time.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a backend that implements
//! the traits required by the API.
//!
//! ```rust,ignore
//! use loyalty_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements LedgerManagement
//! let api = LedgerApi::new(db);
//! let balance = api.balance(user_id).await?;
//! ```

pub mod accrual_sync_api;
pub mod auth_api;
pub mod errors;
pub mod ledger_api;
pub mod order_flow_api;
pub mod order_objects;
