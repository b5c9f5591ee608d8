//! Auth handlers: signup, login, refresh, logout, session status.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use sessionhub_service::SessionStatus;

use crate::dto::request::{LoginRequest, RefreshRequest, SignupRequest};
use crate::dto::response::{
    ApiResponse, LoginResponse, MessageResponse, TokenResponse, UserResponse,
};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ClientMeta, ValidatedJson};
use crate::state::AppState;

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let user = state.auth_service.signup(&req.email, &req.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserResponse::from(user))),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let outcome = state
        .auth_service
        .login(&req.email, &req.password, &client)
        .await?;
    Ok(Json(ApiResponse::ok(LoginResponse {
        tokens: TokenResponse::from(outcome.tokens),
        evicted_sessions: outcome.evicted,
        user: UserResponse::from(outcome.user),
    })))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    let tokens = state.auth_service.refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok(TokenResponse::from(tokens))))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.auth_service.logout(&auth).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Logged out successfully".to_string(),
    })))
}

/// GET /api/auth/session-status
pub async fn session_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<SessionStatus>>> {
    let status = state.session_service.status(&auth).await?;
    Ok(Json(ApiResponse::ok(status)))
}
