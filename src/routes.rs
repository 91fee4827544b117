//! REST endpoints for driving onboarding flows.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};
use uuid::Uuid;

use crate::catalog;
use crate::error::FlowError;
use crate::flows::{FlowKind, FlowManager, FlowView};
use crate::forms::{FieldPatch, RegistrationType};
use crate::navigation::{nav_items, navbar_visible};
use crate::wizard::Transition;
use crate::wizard::branch::corporate_registration;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub flows: Arc<FlowManager>,
}

/// Build the router with flow, catalog and navigation routes.
pub fn flow_routes(flows: Arc<FlowManager>) -> Router {
    let state = AppState { flows };

    Router::new()
        .route("/health", get(health))
        .route("/api/catalog", get(get_catalog))
        .route("/api/flows", post(mount_flow))
        .route("/api/flows/{id}", get(get_flow).delete(close_flow))
        .route("/api/flows/{id}/fields", patch(patch_fields))
        .route("/api/flows/{id}/advance", post(advance_flow))
        .route("/api/flows/{id}/retreat", post(retreat_flow))
        .route("/api/flows/{id}/restart", post(restart_flow))
        .route(
            "/api/flows/{id}/registration-type",
            post(choose_registration_type),
        )
        .route(
            "/api/visitors/{visitor}/dashboard-link",
            get(dashboard_link),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "ploxi-onboard"
    }))
}

async fn get_catalog() -> impl IntoResponse {
    Json(catalog::catalog())
}

// ── Responses ───────────────────────────────────────────────────────────

type ApiResponse = (StatusCode, Json<Value>);

fn flow_error(e: FlowError) -> ApiResponse {
    let status = match &e {
        FlowError::NotFound { .. } => StatusCode::NOT_FOUND,
        FlowError::UnknownField { .. }
        | FlowError::InvalidValue { .. }
        | FlowError::InvalidJump { .. } => StatusCode::BAD_REQUEST,
        FlowError::Completed
        | FlowError::SubmissionInProgress
        | FlowError::NotOnFinalStep { .. }
        | FlowError::NotApplicable { .. }
        | FlowError::MissingContext { .. } => StatusCode::CONFLICT,
        FlowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(error = %e, "Flow request failed");
    } else {
        warn!(error = %e, status = status.as_u16(), "Flow request rejected");
    }

    let mut body = json!({ "error": e.to_string() });
    match &e {
        FlowError::UnknownField { field } | FlowError::InvalidValue { field, .. } => {
            body["field"] = json!(field);
        }
        FlowError::MissingContext { .. } => {
            body["redirect"] = json!(corporate_registration().route);
        }
        _ => {}
    }
    (status, Json(body))
}

fn view_response(status: StatusCode, view: FlowView) -> ApiResponse {
    (status, Json(json!(view)))
}

/// A blocked advance is reported as 422 with the stored errors in the view.
fn transition_response(result: Result<(Transition, FlowView), FlowError>) -> ApiResponse {
    match result {
        Ok((transition, view)) => {
            let status = match transition {
                Transition::Blocked { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::OK,
            };
            let scroll_to_top = transition.scroll_to_top();
            (
                status,
                Json(json!({
                    "transition": transition,
                    "scrollToTop": scroll_to_top,
                    "flow": view,
                })),
            )
        }
        Err(e) => flow_error(e),
    }
}

fn parse_id(id: &str) -> Result<Uuid, ApiResponse> {
    Uuid::parse_str(id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid flow ID"})),
        )
    })
}

// ── Flows ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MountRequest {
    visitor_id: String,
    flow: FlowKind,
}

async fn mount_flow(
    State(state): State<AppState>,
    Json(body): Json<MountRequest>,
) -> impl IntoResponse {
    if body.visitor_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "visitorId is required"})),
        );
    }
    match state.flows.mount(&body.visitor_id, body.flow).await {
        Ok(view) => view_response(StatusCode::CREATED, view),
        Err(e) => flow_error(e),
    }
}

async fn get_flow(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.flows.view(id).await {
        Ok(view) => view_response(StatusCode::OK, view),
        Err(e) => flow_error(e),
    }
}

async fn close_flow(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.flows.close(id).await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "closed"}))),
        Err(e) => flow_error(e),
    }
}

async fn patch_fields(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FieldPatch>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.flows.patch(id, &body).await {
        Ok(view) => view_response(StatusCode::OK, view),
        Err(e) => flow_error(e),
    }
}

async fn advance_flow(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match parse_id(&id) {
        Ok(id) => transition_response(state.flows.advance(id).await),
        Err(response) => response,
    }
}

async fn retreat_flow(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match parse_id(&id) {
        Ok(id) => transition_response(state.flows.retreat(id).await),
        Err(response) => response,
    }
}

async fn restart_flow(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match parse_id(&id) {
        Ok(id) => transition_response(state.flows.restart(id).await),
        Err(response) => response,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationTypeRequest {
    registration_type: RegistrationType,
}

async fn choose_registration_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RegistrationTypeRequest>,
) -> impl IntoResponse {
    match parse_id(&id) {
        Ok(id) => transition_response(
            state
                .flows
                .choose_registration_type(id, body.registration_type)
                .await,
        ),
        Err(response) => response,
    }
}

// ── Navigation ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PathQuery {
    #[serde(default)]
    path: String,
}

async fn dashboard_link(
    State(state): State<AppState>,
    Path(visitor): Path<String>,
    Query(query): Query<PathQuery>,
) -> impl IntoResponse {
    let path = if query.path.is_empty() {
        "/".to_string()
    } else {
        query.path
    };
    let href = state.flows.dashboard_link(&visitor, &path).await;
    Json(json!({
        "href": href,
        "navbarVisible": navbar_visible(&path),
        "items": nav_items(&path, &href),
    }))
}
