use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub const SERVICE_NAME: &str = "LinkRadio Parsing Server";

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    service: String,
    version: String,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct ServiceInfo {
    message: String,
    version: String,
    endpoints: BTreeMap<String, String>,
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Service name, version and endpoints", body = ServiceInfo))
)]
pub async fn service_info() -> Json<ServiceInfo> {
    let endpoints = [
        ("health", "GET /healthz"),
        ("parserHealth", "GET /api/v1/health"),
        ("parse", "POST /api/v1/parse"),
        ("batchParse", "POST /api/v1/parse/batch"),
        ("extract", "POST /api/v1/extract"),
        ("strategies", "GET /api/v1/strategies"),
        ("docs", "GET /docs"),
    ]
    .into_iter()
    .map(|(name, route)| (name.to_string(), route.to_string()))
    .collect();

    Json(ServiceInfo {
        message: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}
