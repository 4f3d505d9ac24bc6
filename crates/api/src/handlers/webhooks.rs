//! C9 webhook ingress: signature verification, dedup check, event enqueue.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use queue::QueuedEvent;
use serde_json::json;
use sha2::Sha256;

use super::AppState;

type HmacSha256 = Hmac<Sha256>;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `POST /webhook`. Fixed order of operations: required headers, signature
/// verification, dedup check, enqueue, respond.
pub async fn handle_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let Some(event_type) = header_str(&headers, "x-github-event") else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing X-GitHub-Event header" }))).into_response();
    };
    let Some(delivery_id) = header_str(&headers, "x-github-delivery") else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing X-GitHub-Delivery header" }))).into_response();
    };

    if let Some(secret) = &state.webhook_secret {
        let Some(signature) = header_str(&headers, "x-hub-signature-256").and_then(|s| s.strip_prefix("sha256=")) else {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "missing X-Hub-Signature-256 header", "deliveryId": delivery_id })),
            )
                .into_response();
        };
        let Ok(signature_bytes) = hex::decode(signature) else {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "malformed signature", "deliveryId": delivery_id })),
            )
                .into_response();
        };
        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "invalid webhook secret configuration", "deliveryId": delivery_id })),
                )
                    .into_response()
            }
        };
        mac.update(&body);
        if mac.verify_slice(&signature_bytes).is_err() {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "signature mismatch", "deliveryId": delivery_id })),
            )
                .into_response();
        }
    }

    let Ok(payload_str) = std::str::from_utf8(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "body is not valid utf-8", "deliveryId": delivery_id })),
        )
            .into_response();
    };

    if state.dedup.is_duplicate(payload_str, delivery_id) {
        return (StatusCode::OK, Json(json!({ "message": "duplicate ignored", "deliveryId": delivery_id }))).into_response();
    }

    let payload = serde_json::from_str(payload_str).unwrap_or(serde_json::Value::Null);

    let mut header_map = HashMap::new();
    for (name, value) in headers.iter() {
        if let Ok(v) = value.to_str() {
            header_map.insert(name.as_str().to_string(), v.to_string());
        }
    }

    let event = QueuedEvent::new(event_type.to_string(), payload, header_map, delivery_id.to_string(), state.queue_max_retries);

    match state.queue.enqueue(event).await {
        Ok(()) => {
            let depth = state.queue.depth().await;
            (
                StatusCode::OK,
                Json(json!({ "deliveryId": delivery_id, "eventType": event_type, "queueDepth": depth })),
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "event queue is full", "deliveryId": delivery_id })),
        )
            .into_response(),
    }
}

/// `GET /webhook/stats`.
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let queue_stats = state.queue.stats(&state.processors).await;
    let dedup_stats = state.dedup.stats();
    Json(json!({
        "queue": queue_stats,
        "deduplication": dedup_stats,
        "timestamp": Utc::now(),
    }))
}

/// `GET /webhook/health`. 503 once the queue is at or above 90% capacity.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if state.queue.is_unhealthy().await {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unhealthy" })))
    } else {
        (StatusCode::OK, Json(json!({ "status": "healthy" })))
    }
}
