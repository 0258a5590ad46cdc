use std::fmt::Debug;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2,
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
};
use log::*;
use lp_common::Secret;

use crate::{
    db_types::UserAccount,
    traits::{AuthApiError, AuthManagement},
};

/// `AuthApi` registers users and checks their credentials. Session tokens are the caller's concern.
pub struct AuthApi<B> {
    db: B,
}

impl<B> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi")
    }
}

impl<B: Clone> Clone for AuthApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    /// Creates a new user with a zero balance.
    pub async fn register(&self, login: &str, password: &Secret<String>) -> Result<UserAccount, AuthApiError> {
        if login.is_empty() || password.is_empty() {
            return Err(AuthApiError::EmptyCredentials);
        }
        let hash = hash_password(password.reveal())?;
        let user = self.db.create_user(login, &hash).await?;
        info!("🔐️ New user '{}' registered as #{}", user.login, user.id);
        Ok(user)
    }

    /// Returns the user if the password matches. Unknown logins and wrong passwords are indistinguishable.
    pub async fn login(&self, login: &str, password: &Secret<String>) -> Result<UserAccount, AuthApiError> {
        if login.is_empty() || password.is_empty() {
            return Err(AuthApiError::EmptyCredentials);
        }
        let user = self.db.fetch_user_by_login(login).await?.ok_or_else(|| {
            debug!("🔐️ Login attempt for unknown user '{login}'");
            AuthApiError::InvalidCredentials
        })?;
        if !verify_password(password.reveal(), &user.password_hash) {
            debug!("🔐️ Wrong password for user '{login}'");
            return Err(AuthApiError::InvalidCredentials);
        }
        debug!("🔐️ User '{login}' logged in");
        Ok(user)
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        warn!("🔐️ Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}
