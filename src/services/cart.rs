use serde::Serialize;
use sqlx::types::BigDecimal;
use sqlx::PgPool;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::CartLinePolicy;
use crate::db::models::{CartLine, PricedCartLine};
use crate::db::{accounts, cart, inventory};
use crate::services::checkout::cart_total;
use crate::validation::{validate_quantity, ValidationError};

#[derive(Debug, Error)]
pub enum CartError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("product {0} not found")]
    ProductNotFound(Uuid),

    #[error("account {0} not found")]
    AccountNotFound(Uuid),

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i64,
        available: i32,
    },

    #[error("product {0} is not in the cart")]
    NotInCart(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub lines: Vec<PricedCartLine>,
    #[schema(value_type = String)]
    pub total: BigDecimal,
}

#[derive(Clone)]
pub struct CartService {
    pool: PgPool,
    policy: CartLinePolicy,
}

impl CartService {
    pub fn new(pool: PgPool, policy: CartLinePolicy) -> Self {
        Self { pool, policy }
    }

    /// Adds a product to the user's cart. Stock is checked but not reserved;
    /// checkout re-validates it authoritatively.
    pub async fn add_to_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, CartError> {
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;

        // Serializes this user's cart writes with their checkouts.
        if accounts::lock_funds(&mut tx, user_id).await?.is_none() {
            return Err(CartError::AccountNotFound(user_id));
        }

        let product = inventory::get_product(&mut tx, product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        let requested = match self.policy {
            CartLinePolicy::Append => i64::from(quantity),
            CartLinePolicy::Merge => {
                cart::quantity_in_cart(&mut tx, user_id, product_id).await? + i64::from(quantity)
            }
        };

        if requested > i64::from(product.stock) {
            return Err(CartError::InsufficientStock {
                product_id,
                requested,
                available: product.stock,
            });
        }

        let line = match self.policy {
            CartLinePolicy::Append => cart::insert_line(&mut tx, user_id, product_id, quantity).await?,
            CartLinePolicy::Merge => {
                match cart::increment_line(&mut tx, user_id, product_id, quantity).await? {
                    Some(line) => line,
                    None => cart::insert_line(&mut tx, user_id, product_id, quantity).await?,
                }
            }
        };

        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            product_id = %product_id,
            quantity = line.quantity,
            "Cart line stored"
        );

        Ok(line)
    }

    /// Removes every line for the product. Returns the number of lines removed.
    pub async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> Result<u64, CartError> {
        let mut conn = self.pool.acquire().await?;
        let removed = cart::remove_product(&mut conn, user_id, product_id).await?;
        if removed == 0 {
            return Err(CartError::NotInCart(product_id));
        }
        Ok(removed)
    }

    pub async fn view_cart(&self, user_id: Uuid) -> Result<CartView, CartError> {
        let mut conn = self.pool.acquire().await?;
        let lines = cart::list_priced_lines(&mut conn, user_id).await?;
        let total = cart_total(&lines);
        Ok(CartView { lines, total })
    }
}
