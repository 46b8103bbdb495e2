//! HTTP request handlers

use super::types::{ErrorResponse, SessionResponse, TurnRequest};
use super::AppState;
use crate::runtime::{RouterError, TurnOutcome};
use crate::session::SessionStore;
use crate::state_machine::TransitionError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions/new", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/turn", post(send_turn))
        .route("/version", get(get_version))
        .with_state(state)
}

async fn create_session(State(state): State<AppState>) -> Result<Json<TurnOutcome>, AppError> {
    let id = uuid::Uuid::new_v4().to_string();
    let outcome = state.router.open_session(&id).await?;
    Ok(Json(outcome))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let record = state
        .router
        .store()
        .load(&id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;

    Ok(Json(record.into()))
}

async fn send_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnOutcome>, AppError> {
    let input = req.into_input().map_err(AppError::BadRequest)?;
    let outcome = state.router.handle_turn(&id, input).await?;
    Ok(Json(outcome))
}

async fn get_version() -> &'static str {
    concat!("acme-dental ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<RouterError> for AppError {
    fn from(err: RouterError) -> Self {
        let message = err.to_string();
        match err {
            RouterError::Transition(TransitionError::EmptyInput) => AppError::BadRequest(message),
            RouterError::Transition(
                TransitionError::AgentBusy | TransitionError::SessionEnded,
            ) => AppError::Conflict(message),
            _ => {
                tracing::error!(error = %message, "Turn failed");
                AppError::Internal(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
