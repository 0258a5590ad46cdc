use std::{path::Path, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, web::ServiceConfig, App, HttpServer};
use log::*;
use loyalty_engine::{AuthApi, LedgerApi, OrderFlowApi, SqliteDatabase};

use crate::{
    accrual_worker::start_accrual_worker,
    auth::TokenIssuer,
    config::{AuthConfig, ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::accrual::AccrualServiceClient,
    rate_limit::RateLimiter,
    routes::{
        health,
        json_config,
        ping,
        LoginRoute,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        OrderByNumberRoute,
        RegisterRoute,
        UploadOrderRoute,
        WithdrawRoute,
    },
};

/// Opens the database, brings the schema up to date, starts the accrual worker and serves requests until the server
/// is shut down (e.g. with Ctrl-C). The worker is stopped before this function returns.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ensure_database_directory(&config.database_url)?;
    let db = SqliteDatabase::new_with_options(&config.database_url, config.max_db_connections, config.storage_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not migrate the database. {e}")))?;
    let client = AccrualServiceClient::new(config.accrual.clone())?;
    let worker = start_accrual_worker(db.clone(), client, config.accrual_poll_interval);
    let result = match create_server_instance(config, db) {
        Ok(srv) => srv.await.map_err(|e| ServerError::Unspecified(e.to_string())),
        Err(e) => Err(e),
    };
    info!("🚀️ Server has shut down. Stopping the accrual worker");
    worker.stop().await;
    result
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let limiter = web::Data::new(RateLimiter::per_minute(config.rate_limit));
    let options = ServerOptions::from_config(&config);
    let auth_config = config.auth.clone();
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lps::access_log"))
            .configure(configure_app(db.clone(), &auth_config, options, limiter.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the routes and their shared state. The rate limiter is created once by the caller so that every worker
/// counts against the same window.
pub fn configure_app(
    db: SqliteDatabase,
    auth_config: &AuthConfig,
    options: ServerOptions,
    limiter: web::Data<RateLimiter>,
) -> impl FnOnce(&mut ServiceConfig) {
    let jwt_signer = TokenIssuer::new(auth_config);
    move |cfg| {
        let orders_api = OrderFlowApi::new(db.clone());
        let ledger_api = LedgerApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let api_scope = web::scope("/api")
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(UploadOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByNumberRoute::<SqliteDatabase>::new())
            .service(MyBalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(MyWithdrawalsRoute::<SqliteDatabase>::new());
        cfg.app_data(json_config())
            .app_data(web::Data::new(db))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options))
            .app_data(limiter)
            .service(health)
            .service(ping)
            .service(api_scope);
    }
}

/// SQLite creates missing database files, but not missing directories.
fn ensure_database_directory(url: &str) -> Result<(), ServerError> {
    let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}
