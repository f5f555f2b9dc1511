//! Password hashing and bearer tokens.
//!
//! Tokens are stateless HS256 JWTs naming the username in `sub`. Resolving a
//! token re-reads the account so tokens for deleted users stop working.

use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use chainpoll_db::{StoreError, UserRecord, UserStore};
use chainpoll_types::api::Claims;

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("could not validate credentials")]
    Unauthenticated,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("username already registered: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Store(StoreError),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token encoding failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(username) => AuthError::Duplicate(username),
            other => AuthError::Store(other),
        }
    }
}

/// Hash a password with Argon2id and a random salt. CPU heavy; call from a
/// blocking context.
pub fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// False for a wrong password and for a stored hash that does not parse.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            store,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn issue_token(&self, username: &str, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims {
            sub: username.to_string(),
            exp: (Utc::now() + ttl).timestamp().max(0) as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify signature and expiry, then load the named account.
    pub async fn resolve_token(&self, token: &str) -> Result<UserRecord, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                AuthError::Unauthenticated
            })?
            .claims;

        self.store
            .find_user(&claims.sub)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<UserRecord, AuthError> {
        if self.store.find_user(username).await?.is_some() {
            return Err(AuthError::Duplicate(username.to_string()));
        }

        let password = Zeroizing::new(password.to_string());
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))??;

        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
        };
        self.store.insert_user(&user).await?;

        Ok(user)
    }

    /// Check credentials and issue a token with the configured lifetime.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(UserRecord, String), AuthError> {
        let user = self
            .store
            .find_user(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password = Zeroizing::new(password.to_string());
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?;

        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user.username, self.ttl)?;
        Ok((user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainpoll_db::MemoryUserStore;

    const SECRET: &[u8] = b"test-secret-at-least-32-bytes-long!!";

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserStore::new()),
            SECRET,
            Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        )
    }

    #[test]
    fn hash_verifies_only_same_password() {
        let hash = hash_password("pw123").unwrap();
        assert_ne!(hash, "pw123");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("pw123", &hash));
        assert!(!verify_password("pw124", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("pw123", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn register_then_duplicate_fails() {
        let auth = service();
        let user = auth.register("alice", "pw123").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "pw123");

        let err = auth.register("alice", "anything").await.unwrap_err();
        assert!(matches!(err, AuthError::Duplicate(name) if name == "alice"));
    }

    #[tokio::test]
    async fn authenticated_token_resolves_to_same_user() {
        let auth = service();
        let registered = auth.register("alice", "pw123").await.unwrap();

        let (user, token) = auth.authenticate("alice", "pw123").await.unwrap();
        assert_eq!(user.id, registered.id);

        let resolved = auth.resolve_token(&token).await.unwrap();
        assert_eq!(resolved.username, "alice");
        assert_eq!(resolved.id, registered.id);
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_user_is_rejected() {
        let auth = service();
        auth.register("alice", "pw123").await.unwrap();

        assert!(matches!(
            auth.authenticate("alice", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("bob", "pw123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let auth = service();
        auth.register("alice", "pw123").await.unwrap();

        let token = auth.issue_token("alice", Duration::seconds(-5)).unwrap();
        assert!(matches!(
            auth.resolve_token(&token).await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let auth = service();
        auth.register("alice", "pw123").await.unwrap();

        let other = AuthService::new(
            Arc::new(MemoryUserStore::new()),
            b"a-completely-different-signing-secret",
            Duration::minutes(30),
        );
        let forged = other.issue_token("alice", Duration::minutes(30)).unwrap();

        assert!(matches!(
            auth.resolve_token(&forged).await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn token_for_unknown_user_is_rejected() {
        let auth = service();
        let token = auth.issue_token("ghost", Duration::minutes(30)).unwrap();

        assert!(matches!(
            auth.resolve_token(&token).await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn malformed_token_is_rejected() {
        let auth = service();
        assert!(matches!(
            auth.resolve_token("not.a.jwt").await,
            Err(AuthError::Unauthenticated)
        ));
    }
}
