use actix_web::{http::StatusCode, test::TestRequest, web};
use loyalty_engine::{
    test_utils::prepare_env::{drop_database, prepare_test_env, random_db_path},
    SqliteDatabase,
};

use super::helpers::send_request;
use crate::routes::{health, ping};

#[actix_web::test]
async fn health_check() {
    let res = send_request(TestRequest::get().uri("/health"), |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "👍️\n");
}

#[actix_web::test]
async fn ping_database() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let mut db = SqliteDatabase::new_with_url(&url, 1).await.unwrap();
    let data = web::Data::new(db.clone());
    let res = send_request(TestRequest::get().uri("/ping"), |cfg| {
        cfg.service(ping).app_data(data.clone());
    })
    .await;
    assert_eq!(res.status, StatusCode::OK);

    db.close().await.unwrap();
    let res = send_request(TestRequest::get().uri("/ping"), |cfg| {
        cfg.service(ping).app_data(data);
    })
    .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    drop_database(&url).await;
}
