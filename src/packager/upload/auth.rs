//! Access token providers.
//!
//! Interactive sign-in is the host application's business; the packager only
//! needs a bearer token for Graph and for the delegate script.

use crate::packager::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Scope requested for app management.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Source of fresh access tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a token valid for Graph device app management.
    async fn access_token(&self) -> Result<String>;
}

/// A token obtained elsewhere (environment, CLI flag, host application).
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wraps an existing token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        if self.0.is_empty() {
            return Err(Error::Configuration("access token is empty".into()));
        }
        Ok(self.0.clone())
    }
}

/// OAuth2 client-credentials flow against the Entra ID token endpoint.
#[derive(Clone)]
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ClientCredentials {
    /// Creates a provider for `tenant_id`.
    pub fn new(tenant_id: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: format!("https://login.microsoftonline.com/{}/oauth2/v2.0/token", tenant_id),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for ClientCredentials {
    async fn access_token(&self) -> Result<String> {
        log::debug!("Requesting access token from {}", self.token_url);

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Configuration(format!(
                "token request rejected ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}
