//! SQLite backend for the Loyalty Engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
