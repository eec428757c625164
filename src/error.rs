use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::AuthError;
use crate::services::{CartError, CheckoutError};
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Cart(#[from] CartError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials
            | AuthError::InvalidCredentials
            | AuthError::ExpiredToken => AppError::Unauthorized(err.to_string()),
            AuthError::Token(_) | AuthError::Hashing(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::InsufficientFunds { .. } => {
                    StatusCode::BAD_REQUEST
                }
                CheckoutError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                CheckoutError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Cart(err) => match err {
                CartError::Validation(_) | CartError::InsufficientStock { .. } => {
                    StatusCode::BAD_REQUEST
                }
                CartError::ProductNotFound(_)
                | CartError::AccountNotFound(_)
                | CartError::NotInCart(_) => StatusCode::NOT_FOUND,
                CartError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self, status: StatusCode) -> Value {
        match self {
            AppError::Checkout(err) => checkout_body(err, status),
            AppError::Cart(CartError::InsufficientStock { .. }) => json!({
                "error": "InsufficientStock",
                "message": self.to_string(),
                "status": status.as_u16(),
            }),
            AppError::Database(_) | AppError::Internal(_) | AppError::Cart(CartError::Database(_)) => {
                json!({
                    "error": "Internal server error",
                    "status": status.as_u16(),
                })
            }
            _ => json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            }),
        }
    }
}

fn checkout_body(err: &CheckoutError, status: StatusCode) -> Value {
    match err {
        CheckoutError::EmptyCart => json!({
            "error": "EmptyCart",
            "status": status.as_u16(),
        }),
        CheckoutError::InsufficientFunds { required, available } => json!({
            "error": "InsufficientFunds",
            "required": required.to_string(),
            "available": available.to_string(),
            "status": status.as_u16(),
        }),
        CheckoutError::AccountNotFound(_) => json!({
            "error": "AccountNotFound",
            "status": status.as_u16(),
        }),
        CheckoutError::Failed(failure) => json!({
            "error": "CheckoutFailed",
            "cause": failure.cause(),
            "retryable": failure.is_retryable(),
            "status": status.as_u16(),
        }),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(self.body(status))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::CheckoutFailure;
    use sqlx::types::BigDecimal;
    use uuid::Uuid;

    async fn body_json(response: Response) -> Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error_status_code() {
        let error = AppError::Validation(ValidationError::new("email", "is not valid"));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_error_status_code() {
        let error = AppError::NotFound("Resource not found".to_string());
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_database_error_status_code() {
        let error = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_errors_map_to_unauthorized() {
        let error: AppError = AuthError::ExpiredToken.into();
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
        let error: AppError = AuthError::MissingCredentials.into();
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_checkout_status_codes() {
        assert_eq!(
            AppError::from(CheckoutError::EmptyCart).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CheckoutError::Failed(CheckoutFailure::LockTimeout)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(CheckoutError::Failed(CheckoutFailure::InsufficientStock {
                product_id: Uuid::new_v4(),
                requested: 2,
            }))
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_stock_shortfall_is_checkout_failed() {
        let response = AppError::from(CheckoutError::Failed(CheckoutFailure::InsufficientStock {
            product_id: Uuid::new_v4(),
            requested: 3,
        }))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "CheckoutFailed");
        assert_eq!(body["cause"], "InsufficientStock");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn test_empty_cart_response_body() {
        let response = AppError::from(CheckoutError::EmptyCart).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "EmptyCart");
    }

    #[tokio::test]
    async fn test_insufficient_funds_response_body() {
        let response = AppError::from(CheckoutError::InsufficientFunds {
            required: BigDecimal::from(80),
            available: BigDecimal::from(10),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "InsufficientFunds");
        assert_eq!(body["required"], "80");
        assert_eq!(body["available"], "10");
    }

    #[tokio::test]
    async fn test_checkout_failed_response_body() {
        let response =
            AppError::from(CheckoutError::Failed(CheckoutFailure::LockTimeout)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "CheckoutFailed");
        assert_eq!(body["cause"], "LockTimeout");
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let response = AppError::Database(sqlx::Error::RowNotFound).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
    }
}
