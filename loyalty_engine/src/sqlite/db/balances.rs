use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Balance, Points};

/// Creates a zero balance for the user. Does nothing if the user already has one.
pub async fn initialize_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO balances (user_id, current, withdrawn, updated_at) VALUES ($1, 0, 0, $2) ON CONFLICT (user_id) DO \
         NOTHING",
    )
    .bind(user_id)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    trace!("💰️ Balance initialised for user #{user_id}");
    Ok(())
}

pub async fn fetch_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance =
        sqlx::query_as("SELECT * FROM balances WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(balance)
}

/// Adds `amount` to the user's current balance. Returns false if the user has no balance, or if the new balance would
/// not fit in an i64. SQLite silently promotes an overflowing sum to REAL, so the bound is checked in the `WHERE` clause.
pub(crate) async fn credit(user_id: i64, amount: Points, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE balances SET current = current + $1, updated_at = $2 WHERE user_id = $3 AND current <= $4 - $1",
    )
    .bind(amount.value())
    .bind(Utc::now())
    .bind(user_id)
    .bind(i64::MAX)
    .execute(conn)
    .await?;
    trace!("💰️ Credited {amount} to user #{user_id}. Rows affected: {}", result.rows_affected());
    Ok(result.rows_affected() == 1)
}

/// Moves `amount` from `current` to `withdrawn`, but only if `current` covers it. Returns false if nothing changed,
/// either because the balance is too low or because it does not exist.
pub(crate) async fn debit(user_id: i64, amount: Points, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE balances SET current = current - $1, withdrawn = withdrawn + $1, updated_at = $2 WHERE user_id = $3 \
         AND current >= $1",
    )
    .bind(amount.value())
    .bind(Utc::now())
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
