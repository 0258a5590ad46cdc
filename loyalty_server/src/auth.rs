//! Session tokens.
//!
//! Users get an HS256 JWT when they register or log in. The token is returned in the `Authorization` response header
//! and in an HttpOnly `token` cookie. Authenticated routes accept either, via the [`JwtClaims`] extractor.
use std::time::Duration;

use actix_web::{
    cookie::Cookie,
    dev::Payload,
    http::header::AUTHORIZATION,
    web,
    FromRequest,
    HttpRequest,
    HttpResponse,
};
use chrono::Utc;
use futures::future::{ready, Ready};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use loyalty_engine::db_types::UserAccount;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: String,
    pub login: String,
    /// Issued at (Unix timestamp seconds)
    pub iat: u64,
    /// Expiration (Unix timestamp seconds)
    pub exp: u64,
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse::<i64>().map_err(|_| AuthError::ValidationError(format!("'{}' is not a user id", self.sub)))
    }
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime: config.token_lifetime,
        }
    }

    /// Issue a new access token for the given user.
    /// This method DOES NOT check the user's credentials. This must be done prior to calling `issue_token`.
    pub fn issue_token(&self, user: &UserAccount) -> Result<String, ServerError> {
        let now = Utc::now().timestamp().max(0).unsigned_abs();
        let claims =
            JwtClaims { sub: user.id.to_string(), login: user.login.clone(), iat: now, exp: now + self.lifetime.as_secs() };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServerError::CouldNotIssueAccessToken(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("🔐️ JWT validation failed: {e}");
            AuthError::ValidationError(e.to_string())
        })?;
        Ok(data.claims)
    }

    /// A 200 response carrying the token in the `Authorization` header, the `token` cookie and the JSON body.
    pub fn token_response(&self, user: &UserAccount) -> Result<HttpResponse, ServerError> {
        let token = self.issue_token(user)?;
        let cookie = Cookie::build(TOKEN_COOKIE, token.clone()).path("/").http_only(true).finish();
        Ok(HttpResponse::Ok()
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
            .cookie(cookie)
            .json(serde_json::json!({ "token": token })))
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::Unspecified("No token issuer has been configured".into()))?;
    let token = bearer_token(req)
        .or_else(|| req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AuthError::MissingToken)?;
    let claims = issuer.validate(&token)?;
    trace!("🔐️ Request authenticated for user #{} ({})", claims.sub, claims.login);
    Ok(claims)
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
