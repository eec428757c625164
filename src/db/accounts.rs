//! Account store: users and their funds balance.

use sqlx::types::BigDecimal;
use sqlx::{PgConnection, Result};
use uuid::Uuid;

use crate::db::models::User;

pub async fn insert_user(
    conn: &mut PgConnection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_by_username(conn: &mut PgConnection, username: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
}

/// Reads the balance and holds the row lock until the surrounding
/// transaction ends. All cart and checkout writes for a user take this lock first.
pub async fn lock_funds(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<BigDecimal>> {
    sqlx::query_scalar::<_, BigDecimal>("SELECT funds FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
}

/// Debits only when the balance covers the amount. Returns `false` otherwise.
pub async fn debit(conn: &mut PgConnection, user_id: Uuid, amount: &BigDecimal) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET funds = funds - $2 WHERE id = $1 AND funds >= $2")
        .bind(user_id)
        .bind(amount)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Adds funds and returns the new balance, or `None` for an unknown user.
pub async fn credit(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: &BigDecimal,
) -> Result<Option<BigDecimal>> {
    sqlx::query_scalar::<_, BigDecimal>(
        "UPDATE users SET funds = funds + $2 WHERE id = $1 RETURNING funds",
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await
}
