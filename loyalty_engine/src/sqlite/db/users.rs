use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::UserAccount;

pub(crate) async fn insert_user(
    login: &str,
    password_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<UserAccount, sqlx::Error> {
    let mut rows: Vec<UserAccount> = sqlx::query_as("INSERT INTO users (login, password_hash, created_at) VALUES ($1, $2, $3) RETURNING *")
        .bind(login)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_all(conn)
        .await?;
    rows.pop().ok_or(sqlx::Error::RowNotFound)
}

pub async fn fetch_user_by_login(login: &str, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE login = $1").bind(login).fetch_optional(conn).await?;
    Ok(user)
}
