use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{NewWithdrawal, Withdrawal};

/// Appends a withdrawal record. This does not touch the balance. Call it in the same transaction as
/// [`super::balances::debit`].
pub(crate) async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, sqlx::Error> {
    let mut rows: Vec<Withdrawal> = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (user_id, order_number, sum, processed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(withdrawal.user_id)
    .bind(withdrawal.order_number.as_str())
    .bind(withdrawal.sum.value())
    .bind(Utc::now())
    .fetch_all(conn)
    .await?;
    rows.pop().ok_or(sqlx::Error::RowNotFound)
}

/// Returns the user's withdrawals, newest first.
pub async fn fetch_withdrawals(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals =
        sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(withdrawals)
}
