//! WebSocket authentication: validates the access token presented by
//! query parameter or first message.

use std::sync::Arc;

use sessionhub_auth::{AuthContext, RequestPipeline};
use sessionhub_core::result::AppResult;

/// Authenticates push-channel connections.
///
/// A connection is admitted only with a token that verifies AND whose
/// session is still live, the same rule HTTP requests follow.
#[derive(Clone)]
pub struct ConnectionAuthenticator {
    pipeline: Arc<RequestPipeline>,
}

impl std::fmt::Debug for ConnectionAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionAuthenticator").finish()
    }
}

impl ConnectionAuthenticator {
    /// Creates a new connection authenticator.
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    /// Authenticates a connection using an access token.
    pub async fn authenticate(&self, token: &str) -> AppResult<AuthContext> {
        self.pipeline.authenticate(Some(token)).await
    }
}
