use actix_web::{
    body::MessageBody,
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use loyalty_engine::db_types::UserAccount;
use lp_common::Secret;

use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    routes::json_config,
};

// The secret used to sign test tokens. DO NOT re-use it anywhere.
pub const TEST_SECRET: &str = "endpoint-test-secret-0f4c2a9e71d3";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(Secret::new(TEST_SECRET.to_string()))
}

pub fn test_user(id: i64, login: &str) -> UserAccount {
    UserAccount {
        id,
        login: login.to_string(),
        password_hash: String::default(),
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
    }
}

pub fn issue_token(user_id: i64, login: &str) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(&test_user(user_id, login)).expect("Failed to sign token")
}

pub fn bearer(user_id: i64) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", issue_token(user_id, "alice")))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub async fn send_request<F>(req: TestRequest, configure: F) -> TestResponse
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())))
        .app_data(json_config())
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    TestResponse { status, headers, body }
}
