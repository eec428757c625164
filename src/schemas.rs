use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::db::models::{CartLine, PricedCartLine, Product, Purchase, PurchaseLineItem};
use crate::handlers::{self, auth, cart, purchases};
use crate::services::{CartView, CheckoutReceipt};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::cart::get_cart,
        handlers::cart::add_to_cart,
        handlers::cart::remove_from_cart,
        handlers::checkout::checkout,
        handlers::purchases::list_purchases,
        handlers::purchases::get_purchase,
        handlers::auth::register,
        handlers::auth::login,
    ),
    components(schemas(
        Product,
        CartLine,
        PricedCartLine,
        CartView,
        Purchase,
        PurchaseLineItem,
        CheckoutReceipt,
        cart::AddToCartRequest,
        cart::RemovedFromCart,
        purchases::PurchaseDetail,
        auth::RegisterRequest,
        auth::RegisterResponse,
        auth::LoginRequest,
        auth::TokenResponse,
        handlers::HealthStatus,
        handlers::DbPoolStats,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Checkout", description = "Atomic cart-to-purchase conversion"),
        (name = "Cart", description = "Pending purchase intents"),
        (name = "Catalog", description = "Read-only product listing"),
        (name = "Purchases", description = "Purchase history"),
        (name = "Auth", description = "Registration and bearer tokens"),
        (name = "Health", description = "Liveness and database status")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
