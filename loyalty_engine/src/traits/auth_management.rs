use thiserror::Error;

use crate::db_types::UserAccount;

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Login and password must not be empty")]
    EmptyCredentials,
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
    #[error("Invalid login or password")]
    InvalidCredentials,
    #[error("Could not hash password: {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait AuthManagement: Clone {
    /// Creates the user and their zero balance in a single atomic unit. Fails with `LoginTaken` if the login exists.
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<UserAccount, AuthApiError>;

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, AuthApiError>;
}
