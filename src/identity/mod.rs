//! Identity gate: resolves a caller's role from an opaque session token.
//!
//! The engine never issues sessions; an external identity service owns them.
//! This module provides the provider abstraction, an HTTP implementation
//! against that service, and a mock for tests.

use crate::domain::{Role, UserId};
use crate::error::EngineError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod http;
pub mod mock;

pub use http::HttpIdentityProvider;
pub use mock::MockIdentityProvider;

/// A resolved caller: stable user id plus role claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

/// Error type for identity resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// No token was presented.
    #[error("no session token presented")]
    MissingToken,
    /// The identity service does not recognize the token.
    #[error("session token rejected by the identity service")]
    InvalidToken,
    /// Network error (e.g., connection timeout, DNS failure).
    #[error("network error: {0}")]
    Network(String),
    /// Unexpected response from the identity service.
    #[error("identity service response error: {0}")]
    Response(String),
}

/// Provider of token -> identity resolution.
///
/// Implementations are side-effect-free lookups; a valid token must resolve
/// regardless of how unprivileged its role is.
#[async_trait]
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    /// Resolve a session token to an identity.
    ///
    /// # Errors
    /// `InvalidToken` for tokens the identity service rejects; transport
    /// failures are reported as `Network`/`Response`, never as a rejection.
    async fn resolve(&self, token: &str) -> Result<Identity, IdentityError>;
}

/// Role gate wrapping a provider, used by every mutating operation.
#[derive(Debug, Clone)]
pub struct IdentityGate {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityGate {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Resolve a token, failing `Unauthenticated` when absent or invalid.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Identity, EngineError> {
        let token = token.ok_or(IdentityError::MissingToken)?;
        Ok(self.provider.resolve(token).await?)
    }

    /// Resolve a token and require at least `required`.
    ///
    /// Missing/invalid tokens fail `Unauthenticated`; a valid identity below
    /// the requirement fails `Forbidden`.
    pub async fn require(
        &self,
        token: Option<&str>,
        required: Role,
    ) -> Result<Identity, EngineError> {
        let identity = self.resolve(token).await?;
        if !identity.role.allows(required) {
            return Err(EngineError::Forbidden(format!(
                "requires role {} or higher, caller is {}",
                required, identity.role
            )));
        }
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> IdentityGate {
        let provider = MockIdentityProvider::new()
            .with_identity("tok-member", "alice", Role::Member)
            .with_identity("tok-mod", "mel", Role::Moderator);
        IdentityGate::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let err = gate().resolve(None).await.unwrap_err();
        assert!(matches!(err, EngineError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthenticated() {
        let err = gate().resolve(Some("tok-nope")).await.unwrap_err();
        assert!(matches!(err, EngineError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_valid_but_unprivileged_token_resolves() {
        let identity = gate().resolve(Some("tok-member")).await.unwrap();
        assert_eq!(identity.role, Role::Member);
    }

    #[tokio::test]
    async fn test_require_enforces_the_hierarchy() {
        let gate = gate();

        let identity = gate.require(Some("tok-mod"), Role::Member).await.unwrap();
        assert_eq!(identity.user_id.as_str(), "mel");

        let err = gate
            .require(Some("tok-member"), Role::Moderator)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }
}
