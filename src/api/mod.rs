//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Watch and trigger endpoints are mounted under `/api/v1`; health and
//! rule-table endpoints live at the root. With the `swagger-ui` feature the
//! OpenAPI document is served at `/api-docs/openapi.json` and browsable at
//! `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of the operator API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "mint-watch-gateway", description = "Operator API for account mint watches"),
    paths(
        handlers::system::health_handler,
        handlers::system::rules_handler,
        handlers::watch::list_watches,
        handlers::watch::get_watch,
        handlers::watch::cancel_watch,
        handlers::watch::cancel_all_watches,
        handlers::trigger::submit_trigger,
    ),
    components(schemas(
        dto::WatchDto,
        dto::WatchListResponse,
        dto::PaginationMeta,
        dto::CancelAllResponse,
        dto::TriggerRequest,
        dto::TriggerResponse,
        handlers::system::HealthResponse,
        crate::domain::Rule,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "System", description = "Health and configuration"),
        (name = "Watches", description = "Live watch management"),
        (name = "Triggers", description = "Manual trigger injection"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
