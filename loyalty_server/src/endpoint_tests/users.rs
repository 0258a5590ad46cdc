use actix_web::{
    http::{header::AUTHORIZATION, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use loyalty_engine::{hash_password, AuthApi, AuthApiError};
use mockall::predicate::eq;

use super::{
    helpers::{get_auth_config, send_request, test_user},
    mocks::MockAuthManager,
};
use crate::{
    auth::TokenIssuer,
    routes::{LoginRoute, RegisterRoute},
};

fn configure(db: MockAuthManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(RegisterRoute::<MockAuthManager>::new())
            .service(LoginRoute::<MockAuthManager>::new())
            .app_data(web::Data::new(AuthApi::new(db)));
    }
}

fn credentials(path: &str, login: &str, password: &str) -> TestRequest {
    TestRequest::post().uri(path).set_json(serde_json::json!({ "login": login, "password": password }))
}

#[actix_web::test]
async fn register_new_user() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_create_user().times(1).returning(|login, hash| {
        assert_eq!(login, "alice");
        assert!(hash.starts_with("$argon2"), "Password was not hashed");
        Ok(test_user(42, login))
    });
    let res = send_request(credentials("/user/register", "alice", "hunter2"), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let header = res.headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
    let token = header.strip_prefix("Bearer ").unwrap();
    let claims = TokenIssuer::new(&get_auth_config()).validate(token).unwrap();
    assert_eq!(claims.user_id().unwrap(), 42);
    assert_eq!(claims.login, "alice");
    let cookie = res.headers.get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.starts_with(&format!("token={token}")));
    assert!(cookie.contains("HttpOnly"));
    assert_eq!(res.body, format!(r#"{{"token":"{token}"}}"#));
}

#[actix_web::test]
async fn register_taken_login() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_create_user().returning(|login, _| Err(AuthApiError::LoginTaken(login.to_string())));
    let res = send_request(credentials("/user/register", "alice", "hunter2"), configure(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body, r#"{"error":"The login 'alice' is already taken"}"#);
}

#[actix_web::test]
async fn register_bad_requests() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_create_user().times(0);
    let res = send_request(credentials("/user/register", "", "hunter2"), configure(db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let mut db = MockAuthManager::new();
    db.expect_create_user().times(0);
    let req = TestRequest::post()
        .uri("/user/register")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(r#"{"login": "alice"}"#);
    let res = send_request(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.starts_with(r#"{"error":"Could not read request body"#));
}

#[actix_web::test]
async fn login_existing_user() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    let hash = hash_password("hunter2").unwrap();
    db.expect_fetch_user_by_login().with(eq("alice")).returning(move |login| {
        let mut user = test_user(7, login);
        user.password_hash = hash.clone();
        Ok(Some(user))
    });
    let res = send_request(credentials("/user/login", "alice", "hunter2"), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let header = res.headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
    let claims = TokenIssuer::new(&get_auth_config()).validate(header.strip_prefix("Bearer ").unwrap()).unwrap();
    assert_eq!(claims.user_id().unwrap(), 7);
}

#[actix_web::test]
async fn login_with_wrong_password() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    let hash = hash_password("hunter2").unwrap();
    db.expect_fetch_user_by_login().returning(move |login| {
        let mut user = test_user(7, login);
        user.password_hash = hash.clone();
        Ok(Some(user))
    });
    let res = send_request(credentials("/user/login", "alice", "hunter3"), configure(db)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.headers.get(AUTHORIZATION).is_none());
}

#[actix_web::test]
async fn login_unknown_user() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_by_login().returning(|_| Ok(None));
    let res = send_request(credentials("/user/login", "mallory", "hunter2"), configure(db)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, r#"{"error":"Authentication Error. Invalid login or password."}"#);
}
