//! Session management handlers.

use axum::Json;
use axum::extract::{Path, State};

use sessionhub_service::SessionView;

use crate::dto::response::{ApiResponse, DeletedSessionsResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, parse_session_id};
use crate::state::AppState;

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<SessionView>>>> {
    let sessions = state.session_service.list(&auth).await?;
    Ok(Json(ApiResponse::ok(sessions)))
}

/// DELETE /api/sessions/{session_id}
///
/// Deleting a session that is already gone, or belongs to someone else,
/// succeeds with nothing deleted.
pub async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<ApiResponse<DeletedSessionsResponse>>> {
    let session_id = parse_session_id(&session_id)?;
    let removed = state.session_service.delete_one(&auth, session_id).await?;

    Ok(Json(ApiResponse::ok(DeletedSessionsResponse {
        deleted: removed.into_iter().map(|s| s.id).collect(),
    })))
}

/// DELETE /api/sessions
///
/// Signs out every other device of the caller.
pub async fn delete_other_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<DeletedSessionsResponse>>> {
    let removed = state.session_service.delete_all_except_current(&auth).await?;

    Ok(Json(ApiResponse::ok(DeletedSessionsResponse {
        deleted: removed.into_iter().map(|s| s.id).collect(),
    })))
}
