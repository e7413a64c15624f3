//! # Tokens
//!
//! HS256 JWTs carrying the user id.
//!
//! - Access token: signed with `JWT_SECRET`, valid for one hour
//! - Refresh token: signed with `JWT_REFRESH_SECRET`, valid for seven days, also stored
//!   under `refreshToken:<token>` so it can be revoked
//!
//! When an access token has expired and the client presents a known refresh token,
//! both are rotated: the old refresh token is deleted and a new pair is issued. Any
//! other verification failure is a plain rejection.
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::database::{Store, StoreError};

pub const ACCESS_TTL_SECS: i64 = 60 * 60;
pub const REFRESH_TTL_SECS: i64 = 60 * 60 * 24 * 7;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize, Deserialize, Debug)]
struct Claims {
    id: String,
    iat: i64,
    exp: i64,
    jti: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug)]
pub struct Session {
    pub user_id: String,
    /// Set when the access token had expired and a fresh pair was issued.
    pub rotated: Option<TokenPair>,
}

pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
}

fn refresh_key(token: &str) -> String {
    format!("refreshToken:{token}")
}

impl TokenIssuer {
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    fn sign(&self, key: &EncodingKey, user_id: &str, ttl_secs: i64) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: user_id.to_string(),
            iat: now,
            exp: now + ttl_secs,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(&Header::default(), &claims, key)?)
    }

    pub async fn issue(&self, store: &dyn Store, user_id: &str) -> Result<TokenPair, AuthError> {
        let access = self.sign(&self.access_encoding, user_id, ACCESS_TTL_SECS)?;
        let refresh = self.sign(&self.refresh_encoding, user_id, REFRESH_TTL_SECS)?;

        store
            .set(
                &refresh_key(&refresh),
                user_id.to_string(),
                Some(Duration::from_secs(REFRESH_TTL_SECS as u64)),
            )
            .await?;

        Ok(TokenPair { access, refresh })
    }

    pub async fn verify(
        &self,
        store: &dyn Store,
        access: &str,
        refresh: Option<&str>,
    ) -> Result<Session, AuthError> {
        match decode::<Claims>(access, &self.access_decoding, &self.validation) {
            Ok(data) => Ok(Session {
                user_id: data.claims.id,
                rotated: None,
            }),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                let refresh = refresh.ok_or(AuthError::InvalidToken)?;
                self.rotate(store, refresh).await
            }
            Err(e) => {
                debug!("Rejected access token: {e}");
                Err(AuthError::InvalidToken)
            }
        }
    }

    async fn rotate(&self, store: &dyn Store, refresh: &str) -> Result<Session, AuthError> {
        let key = refresh_key(refresh);

        let Some(stored_user) = store.get(&key).await? else {
            debug!("Refresh token not found in store");
            return Err(AuthError::InvalidToken);
        };

        let claims = decode::<Claims>(refresh, &self.refresh_decoding, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?
            .claims;
        if claims.id != stored_user {
            return Err(AuthError::InvalidToken);
        }

        store.delete(&key).await?;
        let rotated = self.issue(store, &claims.id).await?;

        Ok(Session {
            user_id: claims.id,
            rotated: Some(rotated),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("access-secret", "refresh-secret")
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let store = MemoryStore::new();
        let tokens = issuer().issue(&store, "user-1").await.unwrap();

        let session = issuer().verify(&store, &tokens.access, None).await.unwrap();

        assert_eq!(session.user_id, "user-1");
        assert!(session.rotated.is_none());
        assert_eq!(
            store.get(&refresh_key(&tokens.refresh)).await.unwrap().as_deref(),
            Some("user-1")
        );
    }

    #[tokio::test]
    async fn test_rejects_foreign_and_garbage_tokens() {
        let store = MemoryStore::new();
        let foreign = TokenIssuer::new("other", "other")
            .issue(&store, "user-1")
            .await
            .unwrap();

        assert!(matches!(
            issuer().verify(&store, &foreign.access, None).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            issuer().verify(&store, "not.a.jwt", None).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_expired_access_rotates_with_refresh() {
        let store = MemoryStore::new();
        let issuer = issuer();
        let tokens = issuer.issue(&store, "user-1").await.unwrap();
        let expired = issuer.sign(&issuer.access_encoding, "user-1", -3600).unwrap();

        let session = issuer
            .verify(&store, &expired, Some(&tokens.refresh))
            .await
            .unwrap();

        let rotated = session.rotated.unwrap();
        assert_eq!(session.user_id, "user-1");
        assert_ne!(rotated.refresh, tokens.refresh);
        assert_eq!(store.get(&refresh_key(&tokens.refresh)).await.unwrap(), None);

        // The old refresh token is single use.
        assert!(matches!(
            issuer.verify(&store, &expired, Some(&tokens.refresh)).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_expired_access_without_refresh_is_rejected() {
        let store = MemoryStore::new();
        let issuer = issuer();
        let expired = issuer.sign(&issuer.access_encoding, "user-1", -3600).unwrap();

        assert!(matches!(
            issuer.verify(&store, &expired, None).await,
            Err(AuthError::InvalidToken)
        ));
    }
}
