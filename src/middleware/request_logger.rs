use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_LENGTH, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

use crate::AppState;

const MAX_BODY_LOG_SIZE: usize = 1024; // 1KB limit for body logging

pub async fn request_logger_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next<Body>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    // Uuid text is always a valid header value.
    let request_id_header = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &request_id_header {
        req.headers_mut().insert("x-request-id", value.clone());
    }

    let content_length = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    match content_length {
        Some(len) if state.config.log_request_body && len > 0 && len <= MAX_BODY_LOG_SIZE => {
            let (parts, body) = req.into_parts();
            let bytes = match hyper::body::to_bytes(body).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(
                        request_id = %request_id,
                        method = %method,
                        uri = %uri,
                        error = %e,
                        "Failed to read request body"
                    );
                    Default::default()
                }
            };

            let sanitized_body = match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(json) => {
                    let sanitized = crate::utils::sanitize::sanitize_json(&json);
                    serde_json::to_string(&sanitized).unwrap_or_else(|_| "[invalid json]".to_string())
                }
                Err(_) => format!("[non-json, {} bytes]", bytes.len()),
            };

            tracing::info!(
                request_id = %request_id,
                method = %method,
                uri = %uri,
                body_size = bytes.len(),
                body = %sanitized_body,
                "Incoming request"
            );

            req = Request::from_parts(parts, Body::from(bytes));
        }
        _ => {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                uri = %uri,
                "Incoming request"
            );
        }
    }

    let mut response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = latency.as_millis(),
        "Outgoing response"
    );

    if let Some(value) = request_id_header {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}
