//! Access-token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use sessionhub_core::config::auth::AuthConfig;
use sessionhub_core::error::AppError;

use super::claims::Claims;

/// Verifies signatures and expiry of access tokens.
///
/// Expiry is checked against the caller's clock instead of the system time
/// so it stays consistent with session deadlines.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Signature and shape validation.
    validation: Validation,
    /// Tolerated clock skew in seconds.
    leeway_secs: i64,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            leeway_secs: i64::try_from(config.leeway.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Decodes an access token and checks it has not expired at `now`.
    pub fn decode_access(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::invalid_token("Invalid token signature")
                }
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::token_expired("Token has expired")
                }
                _ => AppError::invalid_token(format!("Malformed token: {e}")),
            })?;

        if claims.is_expired_at(now, self.leeway_secs) {
            return Err(AppError::token_expired("Token has expired"));
        }

        Ok(claims)
    }
}
