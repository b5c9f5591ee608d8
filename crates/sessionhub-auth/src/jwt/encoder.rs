//! Access-token signing.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use sessionhub_core::config::auth::AuthConfig;
use sessionhub_core::error::AppError;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_entity::user::UserRole;

use super::claims::Claims;

/// Creates HS256-signed access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token TTL.
    access_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl", &self.access_ttl)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: config.access_token_ttl,
        }
    }

    /// Signs an access token for `session_id`, valid from `now` for the configured TTL.
    pub fn encode_access(
        &self,
        user_id: UserId,
        email: &str,
        role: UserRole,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let ttl = chrono::Duration::from_std(self.access_ttl)
            .map_err(|e| AppError::configuration(format!("Access token TTL out of range: {e}")))?;
        let exp = now + ttl;

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            sid: session_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;

        Ok((token, exp))
    }
}
