use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "30.00")]
    pub price: BigDecimal,
    pub stock: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: String,
        description: String,
        price: BigDecimal,
        stock: i32,
        image: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            price,
            stock,
            image,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A registered user together with the account balance checkout debits.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub funds: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// A cart line joined with its product's current name, price and stock.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct PricedCartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    pub stock: i32,
}

impl PricedCartLine {
    pub fn subtotal(&self) -> BigDecimal {
        BigDecimal::from(self.quantity) * &self.unit_price
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = String)]
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    pub fn new(user_id: Uuid, total: BigDecimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            total,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct PurchaseLineItem {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Price copied from the catalog when the purchase was made.
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
}

impl PurchaseLineItem {
    pub fn from_cart_line(purchase_id: Uuid, line: &PricedCartLine) -> Self {
        Self {
            id: Uuid::new_v4(),
            purchase_id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price.clone(),
        }
    }
}
