// zohosync/src/zoho/auth.rs
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::config::ZohoConfig;
use crate::errors::{Result, SyncError};

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Exchanges the stored refresh credential for a fresh access token.
    async fn get_access_token(&self) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Refresh-token grant against the Zoho accounts endpoint. Tokens are not cached.
pub struct ZohoTokenProvider {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl ZohoTokenProvider {
    pub fn new(http_client: reqwest::Client, config: &ZohoConfig) -> Self {
        Self {
            http_client,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
        }
    }
}

#[async_trait]
impl TokenProvider for ZohoTokenProvider {
    #[instrument(skip(self), fields(token_url = %self.token_url))]
    async fn get_access_token(&self) -> Result<String> {
        let params = [
            ("refresh_token", self.refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                error!("❌ Token request to Zoho failed: {}", e);
                SyncError::Auth(format!("Token request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Zoho token endpoint returned {}: {}", status, body);
            return Err(SyncError::Auth(format!(
                "Token request failed with status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            error!("❌ Could not parse Zoho token response: {}", e);
            SyncError::Auth(format!("Failed to parse token response: {}", e))
        })?;

        match token_response.access_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                info!(
                    expires_in = token_response.expires_in,
                    "✅ Access token obtained from Zoho."
                );
                Ok(token)
            }
            None => {
                error!("❌ Zoho token response did not contain an access_token.");
                Err(SyncError::Auth(
                    "Access token missing from Zoho response".to_string(),
                ))
            }
        }
    }
}
