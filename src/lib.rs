pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod schemas;
pub mod services;
pub mod utils;
pub mod validation;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::auth::TokenKeys;
use crate::config::{AllowedOrigins, Config};
use crate::services::{CartService, CheckoutService};

/// Shared handles for request handlers. The pool is created once at
/// startup and passed in; nothing in the crate holds a global connection.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub tokens: TokenKeys,
    pub checkout: CheckoutService,
    pub cart: CartService,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: Config) -> Self {
        let tokens = TokenKeys::new(&config.jwt_secret, config.jwt_ttl_secs);
        let checkout = CheckoutService::new(db.clone(), config.checkout_lock_timeout());
        let cart = CartService::new(db.clone(), config.cart_line_policy);

        Self {
            db,
            config: Arc::new(config),
            tokens,
            checkout,
            cart,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api-docs/openapi.json", get(schemas::openapi_json))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/products", get(handlers::products::list_products))
        .route("/products/:id", get(handlers::products::get_product))
        .route(
            "/cart",
            get(handlers::cart::get_cart).post(handlers::cart::add_to_cart),
        )
        .route("/cart/:product_id", delete(handlers::cart::remove_from_cart))
        .route("/checkout", post(handlers::checkout::checkout))
        .route("/purchases", get(handlers::purchases::list_purchases))
        .route("/purchases/:id", get(handlers::purchases::get_purchase))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_logger::request_logger_middleware,
        ))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origins {
        AllowedOrigins::Any => layer.allow_origin(Any),
        AllowedOrigins::List(list) => {
            let values = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect::<Vec<_>>();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}
