use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use loyalty_engine::{
    db_types::{Balance, OrderNumber, Points, Withdrawal},
    LedgerApi,
    LedgerError,
};
use mockall::predicate::eq;

use super::{
    helpers::{bearer, send_request},
    mocks::MockLedgerManager,
};
use crate::routes::{MyBalanceRoute, MyWithdrawalsRoute, WithdrawRoute};

fn configure(db: MockLedgerManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(MyBalanceRoute::<MockLedgerManager>::new())
            .service(WithdrawRoute::<MockLedgerManager>::new())
            .service(MyWithdrawalsRoute::<MockLedgerManager>::new())
            .app_data(web::Data::new(LedgerApi::new(db)));
    }
}

fn withdrawal(id: i64, order: &str, sum: Points) -> Withdrawal {
    Withdrawal {
        id,
        user_id: 1,
        order_number: OrderNumber::parse(order).unwrap(),
        sum,
        processed_at: Utc.with_ymd_and_hms(2024, 3, id as u32, 9, 15, 0).unwrap(),
    }
}

fn withdraw_request(body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri("/user/balance/withdraw").insert_header(bearer(1)).set_json(body)
}

#[actix_web::test]
async fn fetch_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_fetch_balance().with(eq(1)).returning(|user_id| {
        Ok(Some(Balance {
            user_id,
            current: Points::from_hundredths(40_050),
            withdrawn: Points::from_hundredths(4_225),
            updated_at: Utc::now(),
        }))
    });
    let req = TestRequest::get().uri("/user/balance").insert_header(bearer(1));
    let res = send_request(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, r#"{"current":400.5,"withdrawn":42.25}"#);
}

#[actix_web::test]
async fn fetch_missing_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_fetch_balance().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/user/balance").insert_header(bearer(1));
    let res = send_request(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn fetch_balance_without_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_fetch_balance().times(0);
    let res = send_request(TestRequest::get().uri("/user/balance"), configure(db)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn withdraw_points() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_withdraw().times(1).returning(|w| {
        assert_eq!(w.user_id, 1);
        assert_eq!(w.sum, Points::from_whole(100));
        Ok(withdrawal(5, w.order_number.as_str(), w.sum))
    });
    let res = send_request(withdraw_request(serde_json::json!({"order": "2377225624", "sum": 100})), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, r#"{"order":"2377225624","sum":100.0,"processed_at":"2024-03-05T09:15:00Z"}"#);
}

#[actix_web::test]
async fn withdraw_more_than_the_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_withdraw().returning(|w| Err(LedgerError::InsufficientFunds { requested: w.sum }));
    let res =
        send_request(withdraw_request(serde_json::json!({"order": "2377225624", "sum": 1000})), configure(db)).await;
    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(res.body, r#"{"error":"Insufficient funds to withdraw 1000.00"}"#);
}

#[actix_web::test]
async fn withdraw_validation() {
    let _ = env_logger::try_init().ok();
    let cases = [
        (serde_json::json!({"order": "2377225625", "sum": 10}), StatusCode::UNPROCESSABLE_ENTITY),
        (serde_json::json!({"order": " 2377225624 ", "sum": 10}), StatusCode::UNPROCESSABLE_ENTITY),
        (serde_json::json!({"order": "2377225624", "sum": 0}), StatusCode::BAD_REQUEST),
        (serde_json::json!({"order": "2377225624", "sum": -5.5}), StatusCode::BAD_REQUEST),
        (serde_json::json!({"order": "2377225624", "sum": "lots"}), StatusCode::BAD_REQUEST),
        (serde_json::json!({"sum": 10}), StatusCode::BAD_REQUEST),
    ];
    for (body, expected) in cases {
        let mut db = MockLedgerManager::new();
        db.expect_withdraw().times(0);
        let res = send_request(withdraw_request(body.clone()), configure(db)).await;
        assert_eq!(res.status, expected, "Unexpected status for {body}");
    }
}

#[actix_web::test]
async fn fetch_withdrawals() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_fetch_withdrawals().with(eq(1)).returning(|_| {
        Ok(vec![
            withdrawal(2, "2377225624", Points::from_hundredths(75_125)),
            withdrawal(1, "79927398713", Points::from_whole(1)),
        ])
    });
    let req = TestRequest::get().uri("/user/withdrawals").insert_header(bearer(1));
    let res = send_request(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body,
        r#"[{"order":"2377225624","sum":751.25,"processed_at":"2024-03-02T09:15:00Z"},{"order":"79927398713","sum":1.0,"processed_at":"2024-03-01T09:15:00Z"}]"#
    );
}

#[actix_web::test]
async fn no_withdrawals() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_fetch_withdrawals().returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/user/withdrawals").insert_header(bearer(1));
    let res = send_request(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}
