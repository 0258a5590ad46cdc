mod api;
mod config;
mod error;

mod data_objects;

pub use api::AccrualApi;
pub use config::AccrualConfig;
pub use data_objects::{AccrualResponse, AccrualStatus};
pub use error::AccrualApiError;
