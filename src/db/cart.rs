//! Cart store: pending (user, product, quantity) lines.

use sqlx::{PgConnection, Result};
use uuid::Uuid;

use crate::db::models::{CartLine, PricedCartLine};

const PRICED_LINES_SQL: &str = r#"
    SELECT c.id, c.product_id, p.name AS product_name, c.quantity, p.price AS unit_price, p.stock
    FROM cart_lines c
    JOIN products p ON p.id = c.product_id
    WHERE c.user_id = $1
    ORDER BY p.id ASC, c.created_at ASC
"#;

pub async fn list_priced_lines(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<PricedCartLine>> {
    sqlx::query_as::<_, PricedCartLine>(PRICED_LINES_SQL)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
}

/// Same as [`list_priced_lines`] but row-locks the cart lines and their
/// products. Rows are locked in product id order so buyers that share
/// products always acquire locks in the same sequence.
pub async fn lock_priced_lines(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<PricedCartLine>> {
    let sql = format!("{} FOR UPDATE OF c, p", PRICED_LINES_SQL);
    sqlx::query_as::<_, PricedCartLine>(&sql)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
}

pub async fn insert_line(
    conn: &mut PgConnection,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<CartLine> {
    sqlx::query_as::<_, CartLine>(
        r#"
        INSERT INTO cart_lines (id, user_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&mut *conn)
    .await
}

/// Adds `quantity` to the oldest line for (user, product), if there is one.
pub async fn increment_line(
    conn: &mut PgConnection,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<Option<CartLine>> {
    sqlx::query_as::<_, CartLine>(
        r#"
        UPDATE cart_lines SET quantity = quantity + $3
        WHERE id = (
            SELECT id FROM cart_lines
            WHERE user_id = $1 AND product_id = $2
            ORDER BY created_at ASC
            LIMIT 1
        )
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&mut *conn)
    .await
}

/// Total quantity of a product across all of the user's lines.
pub async fn quantity_in_cart(conn: &mut PgConnection, user_id: Uuid, product_id: Uuid) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_lines WHERE user_id = $1 AND product_id = $2",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await
}

pub async fn remove_product(conn: &mut PgConnection, user_id: Uuid, product_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn clear(conn: &mut PgConnection, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
