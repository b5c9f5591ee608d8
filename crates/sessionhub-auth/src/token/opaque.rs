//! Opaque refresh-token secrets and their at-rest digest.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generates a 64-character hex secret from two random v4 UUIDs.
pub fn generate_refresh_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Hex SHA-256 of a refresh secret. Only this digest is persisted.
pub fn hash_refresh_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}
