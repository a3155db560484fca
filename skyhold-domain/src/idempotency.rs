use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// A deduplication record for a client-submitted mutation. Keyed by
/// (request_id, route); the stored response body lets a retry replay the
/// original response verbatim, the hash guards its integrity.
#[derive(Debug, Clone)]
pub struct IdempotencyRecord {
    pub request_id: String,
    pub route: String,
    pub user_id: String,
    pub response_hash: String,
    pub response_body: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewIdempotencyRecord {
    pub request_id: String,
    pub route: String,
    pub user_id: String,
    pub response_hash: String,
    pub response_body: serde_json::Value,
}

impl NewIdempotencyRecord {
    /// Build a record from the response that is about to be returned.
    pub fn capture<T: Serialize>(
        request_id: &str,
        route: &str,
        user_id: &str,
        response: &T,
    ) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_value(response)?;
        let hash = response_hash(&body);
        Ok(Self {
            request_id: request_id.to_string(),
            route: route.to_string(),
            user_id: user_id.to_string(),
            response_hash: hash,
            response_body: body,
        })
    }
}

/// Hex SHA-256 over the canonical JSON encoding of a response.
pub fn response_hash(body: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
