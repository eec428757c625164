//! Inventory store: product records and their stock counts.

use sqlx::{PgConnection, Result};
use uuid::Uuid;

use crate::db::models::Product;

pub async fn insert_product(conn: &mut PgConnection, product: &Product) -> Result<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, name, description, price, stock, image, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.price)
    .bind(product.stock)
    .bind(&product.image)
    .bind(product.created_at)
    .bind(product.updated_at)
    .fetch_one(&mut *conn)
    .await
}

pub async fn get_product(conn: &mut PgConnection, id: Uuid) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_products(conn: &mut PgConnection, limit: i64, offset: i64) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name ASC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
}

/// Decrements stock only when enough remains. Returns `false` when the
/// guard rejected the update (or the product no longer exists).
pub async fn decrement_stock(conn: &mut PgConnection, id: Uuid, quantity: i32) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - $2, updated_at = NOW()
        WHERE id = $1 AND stock >= $2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
