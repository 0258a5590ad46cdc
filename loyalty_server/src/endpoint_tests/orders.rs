use actix_web::{
    http::{header::RETRY_AFTER, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{DateTime, TimeZone, Utc};
use loyalty_engine::{
    db_types::{Order, OrderNumber, OrderStatusType, Points},
    InsertOrderResult,
    OrderFlowApi,
};
use mockall::predicate::eq;

use super::{
    helpers::{bearer, get_auth_config, send_request, test_user},
    mocks::MockOrderManager,
};
use crate::{
    auth::TokenIssuer,
    config::ServerOptions,
    rate_limit::RateLimiter,
    routes::{MyOrdersRoute, OrderByNumberRoute, UploadOrderRoute},
};

fn timestamp(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, day, hour, 30, 0).unwrap()
}

fn order(id: i64, number: &str, user_id: i64, status: OrderStatusType, accrual: Points) -> Order {
    Order {
        id,
        number: OrderNumber::parse(number).unwrap(),
        user_id,
        status,
        accrual,
        uploaded_at: timestamp(28 + id as u32 % 2, 13),
        updated_at: timestamp(29, 14),
    }
}

fn configure(db: MockOrderManager, rate_limit: u32) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(UploadOrderRoute::<MockOrderManager>::new())
            .service(MyOrdersRoute::<MockOrderManager>::new())
            .service(OrderByNumberRoute::<MockOrderManager>::new())
            .app_data(web::Data::new(OrderFlowApi::new(db)))
            .app_data(web::Data::new(RateLimiter::per_minute(rate_limit)))
            .app_data(web::Data::new(ServerOptions::default()));
    }
}

fn upload(body: &str) -> TestRequest {
    TestRequest::post().uri("/user/orders").insert_header(bearer(1)).set_payload(body.to_string())
}

#[actix_web::test]
async fn upload_without_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_insert_order().times(0);
    let req = TestRequest::post().uri("/user/orders").set_payload("79927398713");
    let res = send_request(req, configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, r#"{"error":"Authentication Error. No access token was provided."}"#);
}

#[actix_web::test]
async fn upload_with_forged_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_insert_order().times(0);
    let (header, mut token) = bearer(1);
    let len = token.len();
    token.replace_range(len - 10..len - 5, "AAAAA");
    let req = TestRequest::post().uri("/user/orders").insert_header((header, token)).set_payload("79927398713");
    let res = send_request(req, configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn upload_new_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_insert_order().times(1).returning(|o| {
        assert_eq!(o.number.as_str(), "79927398713");
        assert_eq!(o.user_id, 1);
        Ok(InsertOrderResult::Inserted(order(1, o.number.as_str(), o.user_id, OrderStatusType::New, Points::ZERO)))
    });
    let res = send_request(upload(" 79927398713\n"), configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn upload_own_order_again() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_insert_order().returning(|_| Ok(InsertOrderResult::DuplicateKey { owner: 1 }));
    let res = send_request(upload("79927398713"), configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn upload_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_insert_order().returning(|_| Ok(InsertOrderResult::DuplicateKey { owner: 2 }));
    let res = send_request(upload("79927398713"), configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body, r#"{"error":"Order 79927398713 has already been uploaded by another user"}"#);
}

#[actix_web::test]
async fn upload_bad_order_numbers() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_insert_order().times(0);
    let res = send_request(upload("79927398710"), configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut db = MockOrderManager::new();
    db.expect_insert_order().times(0);
    let res = send_request(upload("7992-7398-713"), configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut db = MockOrderManager::new();
    db.expect_insert_order().times(0);
    let res = send_request(upload("   "), configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_orders_for_user().with(eq(1)).returning(|_| {
        Ok(vec![
            order(1, "79927398713", 1, OrderStatusType::Processed, Points::from_hundredths(50_050)),
            order(2, "12345678903", 1, OrderStatusType::New, Points::ZERO),
        ])
    });
    let req = TestRequest::get().uri("/user/orders").insert_header(bearer(1));
    let res = send_request(req, configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, ORDERS_JSON);
}

#[actix_web::test]
async fn fetch_my_orders_with_cookie() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_orders_for_user().with(eq(3)).returning(|_| Ok(vec![]));
    let token = TokenIssuer::new(&get_auth_config()).issue_token(&test_user(3, "carol")).unwrap();
    let req = TestRequest::get().uri("/user/orders").cookie(actix_web::cookie::Cookie::new("token", token));
    let res = send_request(req, configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());
}

#[actix_web::test]
async fn fetch_single_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_by_number().returning(|n| {
        let owner = if n.as_str() == "79927398713" { 1 } else { 2 };
        Ok(Some(order(1, n.as_str(), owner, OrderStatusType::Processed, Points::from_hundredths(72_998))))
    });
    let service = test::init_service(
        App::new().app_data(web::Data::new(TokenIssuer::new(&get_auth_config()))).configure(configure(db, 10)),
    )
    .await;
    let req = TestRequest::get().uri("/user/orders/79927398713").insert_header(bearer(1)).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = test::read_body(res).await;
    assert_eq!(body, r#"{"number":"79927398713","status":"PROCESSED","accrual":729.98}"#);

    // Somebody else's order looks exactly like a missing one
    let req = TestRequest::get().uri("/user/orders/12345678903").insert_header(bearer(1)).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn fetch_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/user/orders/79927398713").insert_header(bearer(1));
    let res = send_request(req, configure(db, 10)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn single_order_lookups_are_rate_limited() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_by_number()
        .times(2)
        .returning(|n| Ok(Some(order(1, n.as_str(), 1, OrderStatusType::Processing, Points::ZERO))));
    let service = test::init_service(
        App::new().app_data(web::Data::new(TokenIssuer::new(&get_auth_config()))).configure(configure(db, 2)),
    )
    .await;
    for _ in 0..2 {
        let req = TestRequest::get().uri("/user/orders/79927398713").insert_header(bearer(1)).to_request();
        let res = test::call_service(&service, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
    let req = TestRequest::get().uri("/user/orders/79927398713").insert_header(bearer(1)).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers().get(RETRY_AFTER).unwrap(), "60");
}

const ORDERS_JSON: &str = r#"[{"number":"79927398713","status":"PROCESSED","accrual":500.5,"uploaded_at":"2024-02-29T13:30:00Z"},{"number":"12345678903","status":"NEW","uploaded_at":"2024-02-28T13:30:00Z"}]"#;
