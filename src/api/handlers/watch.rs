//! Watch handlers: list, get, cancel, cancel all.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CancelAllResponse, PaginationParams, WatchDto, WatchListResponse};
use crate::app_state::AppState;
use crate::domain::AccountAddress;
use crate::error::{ErrorResponse, WatchError};

/// `GET /watches`: List live watches with pagination.
///
/// # Errors
///
/// Returns [`WatchError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/watches",
    tag = "Watches",
    summary = "List live watches",
    description = "Returns a paginated list of every address currently watched, oldest first.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated watch list", body = WatchListResponse),
    )
)]
pub async fn list_watches(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, WatchError> {
    let summaries = state.watch_service.list().await;
    let (page, pagination) = params.paginate(summaries);
    Ok(Json(WatchListResponse {
        data: page.into_iter().map(WatchDto::from).collect(),
        pagination,
    }))
}

/// `GET /watches/{address}`: Get one watch.
///
/// # Errors
///
/// Returns [`WatchError::InvalidAddress`] for a malformed address and
/// [`WatchError::WatchNotFound`] if the address is not watched.
#[utoipa::path(
    get,
    path = "/api/v1/watches/{address}",
    tag = "Watches",
    summary = "Get watch details",
    params(
        ("address" = String, Path, description = "Base-58 account address"),
    ),
    responses(
        (status = 200, description = "Watch details", body = WatchDto),
        (status = 400, description = "Malformed address", body = ErrorResponse),
        (status = 404, description = "Address not watched", body = ErrorResponse),
    )
)]
pub async fn get_watch(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, WatchError> {
    let address = AccountAddress::parse(&address)?;
    let summary = state.watch_service.get(&address).await?;
    Ok(Json(WatchDto::from(summary)))
}

/// `DELETE /watches/{address}`: Cancel one watch.
///
/// The watcher closes its subscription without sending a notification.
///
/// # Errors
///
/// Returns [`WatchError::WatchNotFound`] if the address is not watched.
#[utoipa::path(
    delete,
    path = "/api/v1/watches/{address}",
    tag = "Watches",
    summary = "Cancel a watch",
    params(
        ("address" = String, Path, description = "Base-58 account address"),
    ),
    responses(
        (status = 204, description = "Watch cancelled"),
        (status = 400, description = "Malformed address", body = ErrorResponse),
        (status = 404, description = "Address not watched", body = ErrorResponse),
    )
)]
pub async fn cancel_watch(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, WatchError> {
    let address = AccountAddress::parse(&address)?;
    state.watch_service.cancel(&address).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /watches`: Cancel every live watch.
#[utoipa::path(
    delete,
    path = "/api/v1/watches",
    tag = "Watches",
    summary = "Cancel all watches",
    responses(
        (status = 200, description = "Number of cancelled watches", body = CancelAllResponse),
    )
)]
pub async fn cancel_all_watches(State(state): State<AppState>) -> impl IntoResponse {
    let cancelled = state.watch_service.cancel_all().await;
    Json(CancelAllResponse { cancelled })
}

/// Watch management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/watches", get(list_watches).delete(cancel_all_watches))
        .route("/watches/{address}", get(get_watch).delete(cancel_watch))
}
