//! Token issuance and validation (§6 Authentication): short-lived JWT
//! access tokens plus long-lived hashed API keys, both resolving to the
//! same [`AuthenticatedCaller`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::rbac::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    pub roles: Vec<Role>,
    pub exp: usize,
    pub iat: usize,
    /// Unique token id, checked against the revocation set on every call.
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token is malformed or signature invalid")]
    InvalidToken,
    #[error("token has expired")]
    Expired,
    #[error("token has been revoked")]
    Revoked,
    #[error("unknown api key")]
    UnknownApiKey,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    pub user_id: String,
    pub roles: Vec<Role>,
}

pub const ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;

/// Issues and validates JWT access tokens, and checks/revokes them via an
/// in-process revocation set (§6: "API keys and JWTs both check a
/// revocation list before being honored").
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    revoked_jti: Arc<RwLock<HashSet<String>>>,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            revoked_jti: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn issue(&self, user_id: &str, roles: Vec<Role>) -> Result<String, AuthError> {
        let now = now_secs();
        let claims = Claims {
            sub: user_id.to_string(),
            roles,
            iat: now,
            exp: now + ACCESS_TOKEN_TTL_SECS as usize,
            jti: uuid::Uuid::new_v4().to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| AuthError::InvalidToken)
    }

    pub async fn validate(&self, token: &str) -> Result<AuthenticatedCaller, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            }
        })?;
        if self.revoked_jti.read().await.contains(&data.claims.jti) {
            return Err(AuthError::Revoked);
        }
        Ok(AuthenticatedCaller { user_id: data.claims.sub, roles: data.claims.roles })
    }

    /// Revokes a token by its `jti` (logout, key rotation).
    pub async fn revoke(&self, jti: &str) {
        self.revoked_jti.write().await.insert(jti.to_string());
    }

    /// Decodes `token` far enough to recover its `jti` and revokes it
    /// directly, so callers that only have the raw bearer token (e.g. a
    /// `/auth/logout` handler) don't need to re-derive claims themselves.
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        self.revoke(&data.claims.jti).await;
        Ok(())
    }
}

fn now_secs() -> usize {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as usize).unwrap_or(0)
}

/// One issued API key: the plaintext is shown to the caller exactly once
/// at creation time; only its SHA-256 digest is persisted (§6: "API keys
/// are stored hashed, never in plaintext").
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    pub id: String,
    pub user_id: String,
    pub key_hash: String,
    pub roles: Vec<Role>,
    pub revoked: bool,
}

#[must_use]
pub fn hash_api_key(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex::encode(digest)
}

pub fn authenticate_api_key(
    plaintext: &str,
    records: &[ApiKeyRecord],
) -> Result<AuthenticatedCaller, AuthError> {
    let hash = hash_api_key(plaintext);
    let record = records
        .iter()
        .find(|r| r.key_hash == hash)
        .ok_or(AuthError::UnknownApiKey)?;
    if record.revoked {
        return Err(AuthError::Revoked);
    }
    Ok(AuthenticatedCaller { user_id: record.user_id.clone(), roles: record.roles.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issues_and_validates_round_trip() {
        let service = TokenService::new("a very long signing secret for tests only");
        let token = service.issue("user-1", vec![Role::Analyst]).unwrap();
        let caller = service.validate(&token).await.unwrap();
        assert_eq!(caller.user_id, "user-1");
        assert_eq!(caller.roles, vec![Role::Analyst]);
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let service = TokenService::new("a very long signing secret for tests only");
        let token = service.issue("user-1", vec![Role::Analyst]).unwrap();
        let data = decode::<Claims>(&token, &service.decoding_key, &Validation::default()).unwrap();
        service.revoke(&data.claims.jti).await;
        let result = service.validate(&token).await;
        assert!(matches!(result, Err(AuthError::Revoked)));
    }

    #[test]
    fn api_key_hash_matches_stored_record() {
        let plaintext = "sk-live-abcdef";
        let record = ApiKeyRecord {
            id: "key-1".into(),
            user_id: "user-1".into(),
            key_hash: hash_api_key(plaintext),
            roles: vec![Role::Viewer],
            revoked: false,
        };
        let caller = authenticate_api_key(plaintext, &[record]).unwrap();
        assert_eq!(caller.user_id, "user-1");
    }

    #[test]
    fn revoked_api_key_is_rejected() {
        let plaintext = "sk-live-abcdef";
        let record = ApiKeyRecord {
            id: "key-1".into(),
            user_id: "user-1".into(),
            key_hash: hash_api_key(plaintext),
            roles: vec![Role::Viewer],
            revoked: true,
        };
        let result = authenticate_api_key(plaintext, &[record]);
        assert!(matches!(result, Err(AuthError::Revoked)));
    }
}
