//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use loyalty_engine::{
    order_objects::UploadOutcome,
    traits::{AuthManagement, LedgerManagement, OrderManagement},
    AuthApi,
    LedgerApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::ServerOptions,
    data_objects::{BalanceView, Credentials, OrderStatusView, OrderView, WithdrawRequest, WithdrawalView},
    errors::ServerError,
    helpers::client_key,
    rate_limit::RateLimiter,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Malformed JSON bodies get the same `{"error": ...}` treatment as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

#[get("/ping")]
pub async fn ping(db: web::Data<SqliteDatabase>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received ping request");
    db.ping().await.map_err(|e| {
        warn!("💻️ Database did not answer the ping. {e}");
        ServerError::BackendError(format!("Database is not available. {e}"))
    })?;
    Ok(HttpResponse::Ok().body("👍️\n"))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(register => Post "/user/register" impl AuthManagement);
/// Route handler for user registration
///
/// Expects a JSON body of the form `{"login": "...", "password": "..."}`. On success the user is logged in straight
/// away: the access token is returned in the `Authorization` header, the `token` cookie and the response body.
pub async fn register<B: AuthManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let (login, password) = body.into_inner().into_parts();
    debug!("💻️ POST register for '{login}'");
    let user = api.register(&login, &password).await?;
    signer.token_response(&user)
}

route!(login => Post "/user/login" impl AuthManagement);
/// Route handler for the login endpoint. Same body and response as [`register`].
pub async fn login<B: AuthManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let (login, password) = body.into_inner().into_parts();
    debug!("💻️ POST login for '{login}'");
    let user = api.login(&login, &password).await?;
    signer.token_response(&user)
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(upload_order => Post "/user/orders" impl OrderManagement);
/// Route handler for order uploads
///
/// The body is the bare order number. Responses:
/// * 202 - the order was registered to the caller and will be checked with the accrual system.
/// * 200 - the caller had already uploaded this order.
/// * 409 - another user has already uploaded this order.
/// * 422 - the order number fails the Luhn check.
pub async fn upload_order<B: OrderManagement>(
    claims: JwtClaims,
    body: String,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    let number = body.trim();
    if number.is_empty() {
        return Err(ServerError::InvalidRequestBody("Expected an order number".into()));
    }
    debug!("💻️ POST order {number} for user #{user_id}");
    let result = api.upload_order(number, user_id).await?;
    match result.outcome {
        UploadOutcome::Accepted => Ok(HttpResponse::Accepted().finish()),
        UploadOutcome::AlreadyUploadedBySelf => Ok(HttpResponse::Ok().finish()),
        UploadOutcome::OwnedByOther => {
            Err(ServerError::Conflict(format!("Order {number} has already been uploaded by another user")))
        },
    }
}

route!(my_orders => Get "/user/orders" impl OrderManagement);
/// Route handler for the order history. Newest orders first, or 204 if the user has not uploaded any orders.
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    debug!("💻️ GET my_orders for user #{user_id}");
    let orders = api.orders_for_user(user_id).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderView::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_number => Get "/user/orders/{number}" impl OrderManagement);
/// Route handler for a single order's status
///
/// Users can only see their own orders; anyone else's order is reported as not found. Requests are rate limited per
/// client address.
pub async fn order_by_number<B: OrderManagement>(
    req: HttpRequest,
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
    limiter: web::Data<RateLimiter>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    let client = client_key(&req, options.use_x_forwarded_for);
    limiter.check(client).map_err(|retry_after| ServerError::RateLimited { retry_after })?;
    let number = path.into_inner();
    debug!("💻️ GET order {number} for user #{user_id}");
    let order = api.order_by_number(&number).await?;
    if order.user_id != user_id {
        debug!("💻️ User #{user_id} asked about order {number}, which is not theirs");
        return Err(ServerError::NoRecordFound(format!("Order {number}")));
    }
    Ok(HttpResponse::Ok().json(OrderStatusView::from(order)))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/user/balance" impl LedgerManagement);
pub async fn my_balance<B: LedgerManagement>(
    claims: JwtClaims,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    debug!("💻️ GET my_balance for user #{user_id}");
    let balance = api.balance(user_id).await?;
    Ok(HttpResponse::Ok().json(BalanceView::from(balance)))
}

route!(withdraw => Post "/user/balance/withdraw" impl LedgerManagement);
/// Route handler for spending points against a new order
///
/// Expects `{"order": "<number>", "sum": <points>}`. Returns 402 if the balance does not cover the sum.
pub async fn withdraw<B: LedgerManagement>(
    claims: JwtClaims,
    body: web::Json<WithdrawRequest>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    let WithdrawRequest { order, sum } = body.into_inner();
    debug!("💻️ POST withdraw {sum} against order {order} for user #{user_id}");
    let withdrawal = api.withdraw(user_id, &order, sum).await?;
    Ok(HttpResponse::Ok().json(WithdrawalView::from(withdrawal)))
}

route!(my_withdrawals => Get "/user/withdrawals" impl LedgerManagement);
/// Route handler for the withdrawal history. Newest first, or 204 if there are none.
pub async fn my_withdrawals<B: LedgerManagement>(
    claims: JwtClaims,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    debug!("💻️ GET my_withdrawals for user #{user_id}");
    let withdrawals = api.withdrawals(user_id).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let withdrawals = withdrawals.into_iter().map(WithdrawalView::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(withdrawals))
}
