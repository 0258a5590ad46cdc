//! # Loyalty points server
//! This crate hosts the HTTP server for the loyalty points service. It is responsible for:
//! * Registering users and issuing session tokens.
//! * Accepting order numbers for loyalty point accrual and reporting their status.
//! * Reporting balances, and debiting them when users spend points against a new order.
//! * Running the background [accrual worker](accrual_worker/index.html), which reconciles pending orders against the
//!   external accrual system.
//!
//! ## Configuration
//! The server is configured via command line flags and environment variables. See [cli](cli/index.html) and
//! [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that always returns a 200 OK response.
//! * `/ping`: Returns 200 OK when the database answers.
//! * `/api/user/register` and `/api/user/login`: Issue session tokens.
//! * `/api/user/orders`: Upload an order number (`POST`) or list your orders (`GET`).
//! * `/api/user/orders/{number}`: The status of one of your orders. Rate limited per client.
//! * `/api/user/balance`, `/api/user/balance/withdraw` and `/api/user/withdrawals`: The points ledger.

pub mod accrual_worker;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod rate_limit;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
