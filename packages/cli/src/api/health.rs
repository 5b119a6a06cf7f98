// ABOUTME: Liveness and status endpoints
// ABOUTME: Unauthenticated probes reporting service name, version and uptime

use std::sync::OnceLock;

use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

static STARTED_AT: OnceLock<DateTime<Utc>> = OnceLock::new();

/// Record the process start time used for uptime reporting
pub fn mark_started() {
    STARTED_AT.get_or_init(Utc::now);
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cloudtrain"
    }))
}

pub async fn status_check() -> Json<Value> {
    let now = Utc::now();
    let started_at = *STARTED_AT.get_or_init(|| now);

    Json(json!({
        "status": "healthy",
        "timestamp": now.timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cloudtrain",
        "startedAt": started_at.to_rfc3339(),
        "uptime": (now - started_at).num_seconds()
    }))
}
