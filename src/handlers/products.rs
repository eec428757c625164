use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::db::inventory;
use crate::error::AppError;
use crate::handlers::Pagination;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/products",
    params(Pagination),
    responses((status = 200, description = "Catalog page", body = [crate::db::models::Product])),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = pagination.resolve();
    let mut conn = state.db.acquire().await?;
    let products = inventory::list_products(&mut conn, limit, offset).await?;

    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = crate::db::models::Product),
        (status = 404, description = "Unknown product")
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.acquire().await?;
    let product = inventory::get_product(&mut conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

    Ok(Json(product))
}
