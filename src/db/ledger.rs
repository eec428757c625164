//! Purchase ledger: append-only purchase records and their line items.

use sqlx::{PgConnection, Result};
use uuid::Uuid;

use crate::db::models::{Purchase, PurchaseLineItem};

pub async fn insert_purchase(conn: &mut PgConnection, purchase: &Purchase) -> Result<Purchase> {
    sqlx::query_as::<_, Purchase>(
        r#"
        INSERT INTO purchases (id, user_id, total, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(purchase.id)
    .bind(purchase.user_id)
    .bind(&purchase.total)
    .bind(purchase.created_at)
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_line_item(conn: &mut PgConnection, item: &PurchaseLineItem) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO purchase_line_items (id, purchase_id, product_id, quantity, unit_price)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(item.id)
    .bind(item.purchase_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(&item.unit_price)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn list_purchases(
    conn: &mut PgConnection,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Purchase>> {
    sqlx::query_as::<_, Purchase>(
        "SELECT * FROM purchases WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await
}

/// Looks a purchase up by id, scoped to its owner.
pub async fn get_purchase(conn: &mut PgConnection, user_id: Uuid, id: Uuid) -> Result<Option<Purchase>> {
    sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_line_items(conn: &mut PgConnection, purchase_id: Uuid) -> Result<Vec<PurchaseLineItem>> {
    sqlx::query_as::<_, PurchaseLineItem>(
        "SELECT * FROM purchase_line_items WHERE purchase_id = $1 ORDER BY product_id ASC",
    )
    .bind(purchase_id)
    .fetch_all(&mut *conn)
    .await
}
