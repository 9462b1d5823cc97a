//! Mock identity provider for testing without network calls.

use super::{Identity, IdentityError, IdentityProvider};
use crate::domain::{Role, UserId};
use async_trait::async_trait;
use std::collections::HashMap;

/// Mock identity provider backed by a predefined token map.
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    identities: HashMap<String, Identity>,
}

impl MockIdentityProvider {
    /// Create a new mock provider that rejects every token.
    pub fn new() -> Self {
        Self {
            identities: HashMap::new(),
        }
    }

    /// Register a token resolving to (user, role).
    pub fn with_identity(mut self, token: &str, user_id: &str, role: Role) -> Self {
        self.identities.insert(
            token.to_string(),
            Identity {
                user_id: UserId::new(user_id.to_string()),
                role,
            },
        );
        self
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Identity, IdentityError> {
        self.identities
            .get(token)
            .cloned()
            .ok_or(IdentityError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_token_resolves() {
        let provider = MockIdentityProvider::new().with_identity("t1", "alice", Role::Moderator);
        let identity = provider.resolve("t1").await.unwrap();
        assert_eq!(identity.user_id.as_str(), "alice");
        assert_eq!(identity.role, Role::Moderator);
    }

    #[tokio::test]
    async fn test_unregistered_token_is_invalid() {
        let provider = MockIdentityProvider::new();
        assert_eq!(
            provider.resolve("nope").await.unwrap_err(),
            IdentityError::InvalidToken
        );
    }
}
