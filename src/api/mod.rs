pub mod dtos;
pub mod errors;
pub mod handlers;

pub use errors::{ApiError, ErrorResponse};

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;
use crate::health;

#[derive(OpenApi)]
#[openapi(
    info(title = "linkparse", description = "Web content parsing service"),
    paths(
        health::service_info,
        health::health_check,
        handlers::parse,
        handlers::parse_batch,
        handlers::extract,
        handlers::strategies,
        handlers::parser_health,
    ),
    tags(
        (name = "parser", description = "Article parsing and extraction"),
        (name = "health", description = "Liveness and parser availability")
    )
)]
pub struct ApiDoc;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/parse", post(handlers::parse))
        .route("/parse/batch", post(handlers::parse_batch))
        .route("/extract", post(handlers::extract))
        .route("/strategies", get(handlers::strategies))
        .route("/health", get(handlers::parser_health))
}

/// Full application router with tracing and `x-request-id` propagation.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::service_info))
        .route("/healthz", get(health::health_check))
        .nest("/api/v1", api_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
