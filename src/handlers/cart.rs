use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemovedFromCart {
    pub product_id: Uuid,
    pub lines_removed: u64,
}

#[utoipa::path(
    get,
    path = "/cart",
    responses((status = 200, description = "Current cart with live prices", body = crate::services::CartView)),
    security(("bearer" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let view = state.cart.view_cart(user.id).await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Line stored", body = crate::db::models::CartLine),
        (status = 400, description = "Invalid quantity or insufficient stock"),
        (status = 404, description = "Unknown product")
    ),
    security(("bearer" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<AddToCartRequest>,
) -> Result<impl IntoResponse, AppError> {
    let line = state
        .cart
        .add_to_cart(user.id, payload.product_id, payload.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(line)))
}

#[utoipa::path(
    delete,
    path = "/cart/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product to remove")),
    responses(
        (status = 200, description = "Lines removed", body = RemovedFromCart),
        (status = 404, description = "Product not in cart")
    ),
    security(("bearer" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let lines_removed = state.cart.remove_from_cart(user.id, product_id).await?;

    Ok(Json(RemovedFromCart {
        product_id,
        lines_removed,
    }))
}
