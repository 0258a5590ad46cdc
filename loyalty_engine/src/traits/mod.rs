//! # Storage contracts
//!
//! This module defines the behaviour that a storage backend must expose in order to support the Loyalty Engine, plus
//! the seam to the external accrual system.
//!
//! * [`OrderManagement`] registers orders and is the only way to move an order through its status lifecycle. Credits
//!   to a user's balance happen as a side effect of an order becoming `Processed`, and nowhere else.
//! * [`LedgerManagement`] manages balances and withdrawals.
//! * [`AuthManagement`] stores user accounts.
//! * [`AccrualAuthority`] is the client side of the external accrual system protocol.
mod accrual_authority;
mod auth_management;
mod data_objects;
mod ledger_management;
mod order_management;

pub use accrual_authority::{AccrualAuthority, AccrualAuthorityError, AccrualReport, AuthorityStatus};
pub use auth_management::{AuthApiError, AuthManagement};
pub use data_objects::{InsertOrderResult, StatusUpdate};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use order_management::{OrderManagement, OrderRegistryError};
