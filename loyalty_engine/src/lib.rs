//! Loyalty Engine
//!
//! The Loyalty Engine tracks the orders customers submit for loyalty point accrual, reconciles their status against
//! an external accrual system, and keeps each customer's point balance as an auditable ledger of credits (accruals)
//! and debits (withdrawals).
//!
//! The library is divided into three main sections:
//! 1. Storage contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). Callers
//!    should never need to access the database directly. The data types used by the backends are defined in
//!    [`mod@db_types`] and are public.
//! 2. The public API ([`OrderFlowApi`], [`LedgerApi`], [`AuthApi`] and [`AccrualSyncApi`]). Each API wraps a backend
//!    implementing the traits it needs.
//! 3. Helpers, notably the Luhn order number validator in [`helpers::luhn`].
pub mod db_types;
pub mod helpers;
mod lpe_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use lpe_api::{
    accrual_sync_api::AccrualSyncApi,
    auth_api::{hash_password, verify_password, AuthApi},
    errors::{AccrualSyncError, OrderFlowError},
    ledger_api::LedgerApi,
    order_flow_api::OrderFlowApi,
    order_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccrualAuthority,
    AccrualAuthorityError,
    AuthApiError,
    AuthManagement,
    InsertOrderResult,
    LedgerError,
    LedgerManagement,
    OrderManagement,
    OrderRegistryError,
    StatusUpdate,
};
