//! Remote app catalog client.

use super::{auth::TokenProvider, metadata::Win32LobApp};
use crate::packager::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Remote service that stores application metadata.
#[async_trait]
pub trait AppCatalog: Send + Sync {
    /// Creates the application and returns its identifier.
    async fn create_app(&self, app: &Win32LobApp) -> Result<String>;
}

#[derive(Deserialize)]
struct CreatedApp {
    id: String,
}

/// Microsoft Graph `deviceAppManagement/mobileApps` client.
#[derive(Debug, Clone)]
pub struct GraphClient<T> {
    http: reqwest::Client,
    base_url: String,
    tokens: T,
}

impl<T: TokenProvider> GraphClient<T> {
    /// Creates a client against `base_url` (e.g. `https://graph.microsoft.com/beta`).
    pub fn new(base_url: &str, tokens: T) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn mobile_apps_url(&self) -> String {
        format!("{}/deviceAppManagement/mobileApps", self.base_url)
    }
}

#[async_trait]
impl<T: TokenProvider> AppCatalog for GraphClient<T> {
    async fn create_app(&self, app: &Win32LobApp) -> Result<String> {
        let token = self.tokens.access_token().await?;
        let url = self.mobile_apps_url();
        log::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(app)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("creating app metadata: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upload(format!(
                "Graph rejected app metadata ({}): {}",
                status, body
            )));
        }

        let body = response.text().await?;
        created_app_id(&body)
    }
}

/// Id of the app in a `mobileApps` POST response.
fn created_app_id(body: &str) -> Result<String> {
    let created: CreatedApp = serde_json::from_str(body)?;
    Ok(created.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::upload::auth::StaticToken;

    #[test]
    fn created_app_id_is_read_from_response() {
        let body = r##"{"@odata.type":"#microsoft.graph.win32LobApp","id":"3f2c","displayName":"Agent"}"##;
        assert_eq!(created_app_id(body).unwrap(), "3f2c");
        assert!(matches!(created_app_id("<html>gateway</html>"), Err(Error::Json(_))));
    }

    #[test]
    fn url_has_no_double_slash() {
        let client = GraphClient::new("https://graph.microsoft.com/beta/", StaticToken::new("t"));
        assert_eq!(
            client.mobile_apps_url(),
            "https://graph.microsoft.com/beta/deviceAppManagement/mobileApps"
        );
    }
}
