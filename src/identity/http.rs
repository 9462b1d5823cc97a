//! Identity service client over HTTP.

use super::{Identity, IdentityError, IdentityProvider};
use crate::domain::{Role, UserId};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Identity provider backed by the external identity service's introspection
/// endpoint.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectResponse {
    user_id: String,
    role: String,
}

impl HttpIdentityProvider {
    /// Create a new provider against the given base URL.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn post_introspect(&self, token: &str) -> Result<IntrospectResponse, IdentityError> {
        let url = format!("{}/v1/introspect", self.base_url);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(10)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&url)
                .json(&serde_json::json!({ "token": token }))
                .send()
                .await
                .map_err(|e| backoff::Error::transient(IdentityError::Network(e.to_string())))?;

            let status = response.status();
            // Token rejections are permanent; only infrastructure trouble retries.
            if status == 401 || status == 403 || status == 404 {
                return Err(backoff::Error::permanent(IdentityError::InvalidToken));
            }
            if status == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(IdentityError::Response(format!(
                    "identity service returned {}",
                    status.as_u16()
                ))));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(IdentityError::Response(format!(
                    "identity service returned {}",
                    status.as_u16()
                ))));
            }

            response
                .json::<IntrospectResponse>()
                .await
                .map_err(|e| backoff::Error::permanent(IdentityError::Response(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Identity, IdentityError> {
        let response = self.post_introspect(token).await?;
        debug!(user_id = %response.user_id, role = %response.role, "Resolved session token");

        let role = Role::from_str(&response.role)
            .map_err(|e| IdentityError::Response(e.to_string()))?;

        Ok(Identity {
            user_id: UserId::new(response.user_id),
            role,
        })
    }
}
