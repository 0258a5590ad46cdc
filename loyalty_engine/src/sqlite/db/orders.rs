use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::is_unique_violation;
use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType, Points},
    traits::{InsertOrderResult, OrderRegistryError},
};

/// Inserts the order, relying on the `UNIQUE(number)` constraint to detect an existing registration. When the number
/// is already taken, the owner of the existing order is returned instead.
///
/// `RETURNING` rows are drained with `fetch_all`. A statement left mid-step keeps its implicit transaction open, which
/// hides the row from other connections and holds on to the write lock.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<InsertOrderResult, OrderRegistryError> {
    let number = order.number.clone();
    let result = sqlx::query_as::<_, Order>(
        r#"
            INSERT INTO orders (number, user_id, status, accrual, uploaded_at, updated_at)
            VALUES ($1, $2, 'NEW', 0, $3, $3)
            RETURNING *;
        "#,
    )
    .bind(order.number.as_str())
    .bind(order.user_id)
    .bind(order.uploaded_at)
    .fetch_all(&mut *conn)
    .await
    .and_then(|mut rows| rows.pop().ok_or(sqlx::Error::RowNotFound));
    match result {
        Ok(order) => {
            debug!("📦️ Order [{}] inserted with id {}", order.number, order.id);
            Ok(InsertOrderResult::Inserted(order))
        },
        Err(e) if is_unique_violation(&e) => {
            let owner = fetch_owner(&number, conn).await?.ok_or_else(|| {
                OrderRegistryError::DatabaseError(format!("Order {number} violated a unique key but does not exist"))
            })?;
            trace!("📦️ Order [{number}] already belongs to user #{owner}");
            Ok(InsertOrderResult::DuplicateKey { owner })
        },
        Err(e) => Err(e.into()),
    }
}

async fn fetch_owner(number: &OrderNumber, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let owner: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM orders WHERE number = $1")
        .bind(number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(owner.map(|(id,)| id))
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the user's orders, newest first. Orders uploaded at the same instant are ordered by descending id.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Returns all orders that have not reached a final status, oldest first.
pub async fn fetch_pending_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders: Vec<Order> = sqlx::query_as(
        "SELECT * FROM orders WHERE status IN ('NEW', 'PROCESSING') ORDER BY uploaded_at ASC, id ASC",
    )
    .fetch_all(conn)
    .await?;
    trace!("📦️ {} pending orders fetched", orders.len());
    Ok(orders)
}

/// Conditionally moves the order to `status`. The update only applies if the order's current status is one of
/// `predecessors`, so of several concurrent callers at most one succeeds. Returns `None` if nothing changed.
pub(crate) async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    accrual: Points,
    predecessors: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    if predecessors.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
    builder.push_bind(status.to_string());
    builder.push(", accrual = ");
    builder.push_bind(accrual.value());
    builder.push(", updated_at = ");
    builder.push_bind(Utc::now());
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND status IN (");
    let mut in_clause = builder.separated(", ");
    for s in predecessors {
        in_clause.push_bind(s.to_string());
    }
    builder.push(") RETURNING *");
    trace!("📦️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_all(conn).await?.pop();
    Ok(order)
}
