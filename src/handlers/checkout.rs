use axum::{extract::State, response::IntoResponse, Json};

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/checkout",
    responses(
        (status = 200, description = "Purchase committed", body = crate::services::CheckoutReceipt),
        (status = 400, description = "EmptyCart or InsufficientFunds; nothing was written"),
        (status = 500, description = "CheckoutFailed: transaction rolled back; `cause` names the reason and `retryable` whether to retry")
    ),
    security(("bearer" = [])),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let receipt = state.checkout.checkout(user.id).await?;
    Ok(Json(receipt))
}
