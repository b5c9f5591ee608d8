//! Fixed-window rate limiting per route group.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use sessionhub_auth::{OperationClass, RateLimitKey, bearer_token};

use crate::error::ApiError;
use crate::extractors::client_ip;
use crate::state::AppState;

/// Charges the request against `class`.
///
/// Auth-class requests are keyed by address (see [`client_ip`]). Everything
/// else is keyed by the bearer token's user when it verifies. Failures-only classes are
/// charged after the handler, and only when it returned an error status.
pub async fn rate_limit(
    State((state, class)): State<(AppState, OperationClass)>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.rate_limit.enabled {
        return next.run(request).await;
    }

    let ip = client_ip(
        request.headers(),
        request.extensions(),
        &state.config.server.trusted_proxies,
    );
    let user_id = match class {
        OperationClass::Auth => None,
        _ => {
            let header = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            state.pipeline.identify(bearer_token(header))
        }
    };
    let key = RateLimitKey::derive(user_id, &ip);

    if let Err(err) = state.pipeline.rate_limit(&key, class) {
        return ApiError(err).into_response();
    }

    let response = next.run(request).await;

    if class.counts_failures_only() {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            debug!(key = %key, class = %class, status = status.as_u16(), "Charging failed request");
            state.pipeline.record_failure(&key, class);
        }
    }
    response
}
