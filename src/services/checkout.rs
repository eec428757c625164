//! Checkout engine.
//!
//! Converts a user's cart into a purchase in one database transaction:
//! debit funds, append the purchase record and its line items, decrement
//! stock per line, clear the cart. Either every write commits or none does.
//!
//! Locking order inside the transaction is always
//! `users` row (the buyer) -> `cart_lines` + `products` rows (ascending product id),
//! so checkouts by different users only contend on shared products and never
//! deadlock on each other.

use serde::Serialize;
use sqlx::types::BigDecimal;
use sqlx::{PgConnection, PgPool};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{PricedCartLine, Purchase, PurchaseLineItem};
use crate::db::{accounts, cart, inventory, ledger};

const LOCK_NOT_AVAILABLE: &str = "55P03";
const DEADLOCK_DETECTED: &str = "40P01";
const SERIALIZATION_FAILURE: &str = "40001";

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub purchase_id: Uuid,
    #[schema(value_type = String, example = "80.00")]
    pub total: BigDecimal,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: BigDecimal,
        available: BigDecimal,
    },

    #[error("account {0} not found")]
    AccountNotFound(Uuid),

    #[error("checkout failed: {0}")]
    Failed(#[from] CheckoutFailure),
}

/// Causes of a checkout that was rolled back after its transaction started writing.
#[derive(Debug, Error)]
pub enum CheckoutFailure {
    #[error("insufficient stock for product {product_id} (requested {requested})")]
    InsufficientStock { product_id: Uuid, requested: i32 },

    #[error("timed out waiting for row locks")]
    LockTimeout,

    #[error("funds debit was rejected")]
    DebitRejected,

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for CheckoutFailure {
    fn from(err: sqlx::Error) -> Self {
        if sqlstate(&err).as_deref() == Some(LOCK_NOT_AVAILABLE) {
            CheckoutFailure::LockTimeout
        } else {
            CheckoutFailure::Database(err)
        }
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Failed(err.into())
    }
}

impl CheckoutFailure {
    /// Short machine-readable name of the cause, used in API responses.
    pub fn cause(&self) -> &'static str {
        match self {
            CheckoutFailure::InsufficientStock { .. } => "InsufficientStock",
            CheckoutFailure::LockTimeout => "LockTimeout",
            CheckoutFailure::DebitRejected => "DebitRejected",
            CheckoutFailure::Database(_) => "Database",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutFailure::LockTimeout => true,
            CheckoutFailure::Database(err) => matches!(
                sqlstate(err).as_deref(),
                Some(DEADLOCK_DETECTED) | Some(SERIALIZATION_FAILURE)
            ),
            _ => false,
        }
    }
}

impl CheckoutError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::Failed(failure) if failure.is_retryable())
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// Sum of `quantity * unit_price` over all lines, in exact decimal arithmetic.
pub fn cart_total(lines: &[PricedCartLine]) -> BigDecimal {
    lines
        .iter()
        .map(PricedCartLine::subtotal)
        .fold(BigDecimal::from(0), |acc, subtotal| acc + subtotal)
}

#[derive(Clone)]
pub struct CheckoutService {
    pool: PgPool,
    lock_timeout: Duration,
}

impl CheckoutService {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// Runs a checkout for `user_id`, whose identity the caller has already verified.
    ///
    /// Every value the purchase depends on (cart contents, prices, funds,
    /// stock) is read inside the transaction under row locks, so retrying
    /// after a crash can never charge twice: the cart is only cleared by a
    /// committed checkout.
    #[tracing::instrument(name = "checkout", skip(self), fields(user_id = %user_id))]
    pub async fn checkout(&self, user_id: Uuid) -> Result<CheckoutReceipt, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        // SET does not take bind parameters; the value is an integer we own.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = {}",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        let funds = match accounts::lock_funds(&mut tx, user_id).await? {
            Some(funds) => funds,
            None => {
                tx.rollback().await?;
                return Err(CheckoutError::AccountNotFound(user_id));
            }
        };

        let lines = cart::lock_priced_lines(&mut tx, user_id).await?;
        if lines.is_empty() {
            tx.rollback().await?;
            return Err(CheckoutError::EmptyCart);
        }

        let total = cart_total(&lines);
        if funds < total {
            tx.rollback().await?;
            tracing::info!(%total, %funds, "Checkout rejected: insufficient funds");
            return Err(CheckoutError::InsufficientFunds {
                required: total,
                available: funds,
            });
        }

        match apply_purchase(&mut tx, user_id, &lines, total).await {
            Ok(purchase) => {
                tx.commit().await?;
                tracing::info!(
                    purchase_id = %purchase.id,
                    total = %purchase.total,
                    line_items = lines.len(),
                    "Checkout committed"
                );
                Ok(CheckoutReceipt {
                    purchase_id: purchase.id,
                    total: purchase.total,
                })
            }
            Err(failure) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Checkout rollback failed");
                }
                tracing::warn!(error = %failure, "Checkout rolled back");
                Err(failure.into())
            }
        }
    }
}

/// The write phase. Any error returned here leaves the transaction to be rolled back.
async fn apply_purchase(
    conn: &mut PgConnection,
    user_id: Uuid,
    lines: &[PricedCartLine],
    total: BigDecimal,
) -> Result<Purchase, CheckoutFailure> {
    if !accounts::debit(conn, user_id, &total).await? {
        return Err(CheckoutFailure::DebitRejected);
    }

    let purchase = ledger::insert_purchase(conn, &Purchase::new(user_id, total)).await?;

    for line in lines {
        ledger::insert_line_item(conn, &PurchaseLineItem::from_cart_line(purchase.id, line)).await?;

        if !inventory::decrement_stock(conn, line.product_id, line.quantity).await? {
            return Err(CheckoutFailure::InsufficientStock {
                product_id: line.product_id,
                requested: line.quantity,
            });
        }
    }

    cart::clear(conn, user_id).await?;

    Ok(purchase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn line(quantity: i32, price: &str) -> PricedCartLine {
        PricedCartLine {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "Bolillo".to_string(),
            quantity,
            unit_price: BigDecimal::from_str(price).unwrap(),
            stock: 100,
        }
    }

    #[test]
    fn test_cart_total_matches_scenario() {
        let lines = vec![line(2, "30.00"), line(1, "20.00")];
        assert_eq!(cart_total(&lines), BigDecimal::from(80));
    }

    #[test]
    fn test_cart_total_has_no_rounding_drift() {
        // 0.10 is not representable in binary floating point.
        let lines: Vec<_> = (0..1000).map(|_| line(1, "0.10")).collect();
        assert_eq!(cart_total(&lines), BigDecimal::from(100));

        let lines = vec![line(3, "0.01"), line(7, "19.99"), line(1, "0.07")];
        assert_eq!(cart_total(&lines), BigDecimal::from_str("140.03").unwrap());
    }

    #[test]
    fn test_cart_total_empty_is_zero() {
        assert_eq!(cart_total(&[]), BigDecimal::from(0));
    }

    #[test]
    fn test_lock_timeout_is_retryable() {
        let err = CheckoutError::Failed(CheckoutFailure::LockTimeout);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_precondition_errors_not_retryable() {
        assert!(!CheckoutError::EmptyCart.is_retryable());
        assert!(!CheckoutError::InsufficientFunds {
            required: BigDecimal::from(80),
            available: BigDecimal::from(10),
        }
        .is_retryable());
        let stock = CheckoutError::Failed(CheckoutFailure::InsufficientStock {
            product_id: Uuid::new_v4(),
            requested: 1,
        });
        assert!(!stock.is_retryable());
    }

    #[test]
    fn test_non_database_sqlx_error_is_database_failure() {
        let failure: CheckoutFailure = sqlx::Error::RowNotFound.into();
        assert_eq!(failure.cause(), "Database");
        assert!(!failure.is_retryable());
    }

    #[test]
    fn test_receipt_serializes_camel_case() {
        let receipt = CheckoutReceipt {
            purchase_id: Uuid::nil(),
            total: BigDecimal::from_str("80.00").unwrap(),
        };
        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("purchaseId").is_some());
        assert_eq!(json["total"], "80.00");
    }
}
