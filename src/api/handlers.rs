use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures::future::join_all;
use std::time::Instant;
use tracing::info;

use crate::api::dtos::{
    BatchData, BatchItemResult, BatchParseRequest, BatchParseResponse, BatchSummary, ExtractData,
    ExtractResponse, ParseData, ParseRequest, ParseResponse, ParserHealthResponse,
    ResponseMetadata, StrategiesData, StrategiesResponse, StrategyInfo,
};
use crate::api::errors::{ApiError, ErrorResponse};
use crate::app_state::AppState;
use crate::health::SERVICE_NAME;

#[utoipa::path(
    post,
    path = "/api/v1/parse",
    tag = "parser",
    request_body = ParseRequest,
    responses(
        (status = 200, description = "Parsed article draft", body = ParseResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 422, description = "Parsing failed", body = ErrorResponse)
    )
)]
pub async fn parse(
    State(state): State<AppState>,
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Result<Json<ParseResponse>, ApiError> {
    let started = Instant::now();
    let Json(request) = payload?;
    let options = request
        .validate(state.config.default_timeout_ms())
        .map_err(ApiError::Validation)?;

    info!("Parsing request received for URL: {}", request.url);
    let content = state.manager.parse_content(&request.url, "", &options).await?;
    info!("Parsing completed successfully for URL: {}", request.url);

    Ok(Json(ParseResponse {
        success: true,
        data: ParseData {
            content,
            metadata: ResponseMetadata::since(started),
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/parse/batch",
    tag = "parser",
    request_body = BatchParseRequest,
    responses(
        (status = 200, description = "Per-URL outcomes with summary counts", body = BatchParseResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn parse_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchParseRequest>, JsonRejection>,
) -> Result<Json<BatchParseResponse>, ApiError> {
    let started = Instant::now();
    let Json(request) = payload?;
    let options = request
        .validate(state.config.default_timeout_ms())
        .map_err(ApiError::Validation)?;

    info!("Batch parsing request received for {} URLs", request.urls.len());

    let manager = &state.manager;
    let tasks = request
        .urls
        .iter()
        .zip(options.iter())
        .enumerate()
        .map(|(index, (item, options))| async move {
            match manager.parse_content(&item.url, "", options).await {
                Ok(content) => BatchItemResult {
                    index,
                    url: item.url.clone(),
                    success: true,
                    data: Some(content),
                    error: None,
                },
                Err(e) => BatchItemResult {
                    index,
                    url: item.url.clone(),
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                },
            }
        });
    let results = join_all(tasks).await;

    let summary = BatchSummary::of(&results);
    info!(
        "Batch parsing completed: {}/{} successful",
        summary.successful, summary.total
    );

    Ok(Json(BatchParseResponse {
        success: true,
        data: BatchData {
            results,
            summary,
            metadata: ResponseMetadata::since(started),
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/extract",
    tag = "parser",
    request_body = ParseRequest,
    responses(
        (status = 200, description = "Final extracted record", body = ExtractResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 422, description = "Extraction failed", body = ErrorResponse)
    )
)]
pub async fn extract(
    State(state): State<AppState>,
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let started = Instant::now();
    let Json(request) = payload?;
    let options = request
        .validate(state.config.default_timeout_ms())
        .map_err(ApiError::Validation)?;

    info!("Extraction request received for URL: {}", request.url);
    let content = state.manager.extract_content(&request.url, &options).await?;

    Ok(Json(ExtractResponse {
        success: true,
        data: ExtractData {
            content,
            metadata: ResponseMetadata::since(started),
        },
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/strategies",
    tag = "parser",
    responses((status = 200, description = "Registered parsing strategies", body = StrategiesResponse))
)]
pub async fn strategies(State(state): State<AppState>) -> Json<StrategiesResponse> {
    let strategies = state
        .manager
        .strategy_names()
        .into_iter()
        .map(|name| StrategyInfo {
            name,
            supports: "Web pages with JavaScript support".to_string(),
            confidence: "Varies by content type".to_string(),
        })
        .collect();
    let default = state
        .manager
        .strategies()
        .default_strategy()
        .map(|s| s.name().to_string());

    Json(StrategiesResponse {
        success: true,
        data: StrategiesData {
            strategies,
            default,
        },
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "At least one strategy is registered", body = ParserHealthResponse),
        (status = 503, description = "No parsing strategy available", body = ParserHealthResponse)
    )
)]
pub async fn parser_health(State(state): State<AppState>) -> Response {
    let status = state.manager.status();
    let healthy = !status.strategies.is_empty();
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = ParserHealthResponse {
        success: healthy,
        service: SERVICE_NAME.to_string(),
        parsers: if healthy { "Available" } else { "Unavailable" }.to_string(),
        strategies: status.strategies,
        extractors: status.extractors,
        timestamp: Utc::now(),
    };
    (code, Json(body)).into_response()
}
