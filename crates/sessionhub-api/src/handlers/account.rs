//! Account handlers.

use axum::Json;
use axum::extract::State;

use sessionhub_auth::RoleRequirement;
use sessionhub_core::traits::Clock;

use crate::dto::response::{AccountExportResponse, ApiResponse, UserResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/account
pub async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = state.auth_service.account(&auth).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(user))))
}

/// GET /api/account/export (PRO only)
pub async fn export_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<AccountExportResponse>>> {
    state
        .pipeline
        .authorize(auth.role, RoleRequirement::ProOnly)?;

    let user = state.auth_service.account(&auth).await?;
    let sessions = state.session_service.list(&auth).await?;

    Ok(Json(ApiResponse::ok(AccountExportResponse {
        user: UserResponse::from(user),
        active_sessions: sessions.len(),
        exported_at: state.clock.now(),
    })))
}
