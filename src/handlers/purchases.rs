use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::ledger;
use crate::db::models::{Purchase, PurchaseLineItem};
use crate::error::AppError;
use crate::handlers::Pagination;
use crate::middleware::auth::AuthenticatedUser;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub line_items: Vec<PurchaseLineItem>,
}

#[utoipa::path(
    get,
    path = "/purchases",
    params(Pagination),
    responses((status = 200, description = "Caller's purchases, newest first", body = [Purchase])),
    security(("bearer" = [])),
    tag = "Purchases"
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = pagination.resolve();
    let mut conn = state.db.acquire().await?;
    let purchases = ledger::list_purchases(&mut conn, user.id, limit, offset).await?;

    Ok(Json(purchases))
}

#[utoipa::path(
    get,
    path = "/purchases/{id}",
    params(("id" = Uuid, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase with its line items", body = PurchaseDetail),
        (status = 404, description = "Unknown purchase or owned by another user")
    ),
    security(("bearer" = [])),
    tag = "Purchases"
)]
pub async fn get_purchase(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.acquire().await?;
    let purchase = ledger::get_purchase(&mut conn, user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Purchase {} not found", id)))?;
    let line_items = ledger::list_line_items(&mut conn, purchase.id).await?;

    Ok(Json(PurchaseDetail {
        purchase,
        line_items,
    }))
}
