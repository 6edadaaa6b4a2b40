use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use flightwatch_core::repository::{CachedToken, TokenStore};
use flightwatch_core::upstream::TokenProvider;
use flightwatch_core::{CoreError, CoreResult};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

const TOKEN_PATH: &str = "/v1/security/oauth2/token";

/// Obtains a brand-new access token from the authorization server.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self) -> CoreResult<CachedToken>;
}

/// OAuth2 `client_credentials` grant against the Amadeus token endpoint.
pub struct OAuthTokenIssuer {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl OAuthTokenIssuer {
    pub fn new(
        base_url: &str,
        client_id: impl Into<String>,
        client_secret: SecretString,
        timeout: Duration,
    ) -> CoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Authentication(e.to_string()))?;

        Ok(Self {
            client,
            token_url: format!("{}{}", base_url.trim_end_matches('/'), TOKEN_PATH),
            client_id: client_id.into(),
            client_secret,
        })
    }
}

#[async_trait]
impl TokenIssuer for OAuthTokenIssuer {
    async fn issue(&self) -> CoreResult<CachedToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| CoreError::Authentication(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown token error".to_string());
            return Err(CoreError::Authentication(format!("{}: {}", status, error_msg)));
        }

        let body = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| CoreError::Authentication(e.to_string()))?;

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at: Utc::now().timestamp() + body.expires_in,
        })
    }
}

/// Serves the shared cached token while it is fresh and refreshes it otherwise.
///
/// The cache row is shared between processes; the swap only lands if the row is
/// still what this process last read. Refreshes inside one process are serialized.
pub struct CachedTokenProvider {
    issuer: Arc<dyn TokenIssuer>,
    store: Arc<dyn TokenStore>,
    safety_margin_secs: i64,
    refresh: Mutex<()>,
}

impl CachedTokenProvider {
    pub fn new(issuer: Arc<dyn TokenIssuer>, store: Arc<dyn TokenStore>, safety_margin_secs: i64) -> Self {
        Self {
            issuer,
            store,
            safety_margin_secs,
            refresh: Mutex::new(()),
        }
    }

    fn fresh(&self, token: Option<&CachedToken>) -> Option<SecretString> {
        token
            .filter(|t| t.is_fresh(Utc::now().timestamp(), self.safety_margin_secs))
            .map(|t| SecretString::new(t.access_token.clone().into()))
    }
}

#[async_trait]
impl TokenProvider for CachedTokenProvider {
    async fn get_token(&self) -> CoreResult<SecretString> {
        if let Some(token) = self.fresh(self.store.load().await?.as_ref()) {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;

        // Another task may have refreshed while we waited for the lock.
        let current = self.store.load().await?;
        if let Some(token) = self.fresh(current.as_ref()) {
            return Ok(token);
        }

        let issued = self.issuer.issue().await?;
        if self.store.compare_and_swap(current.as_ref(), &issued).await? {
            info!("Refreshed upstream access token, valid until {}", issued.expires_at);
            return Ok(SecretString::new(issued.access_token.into()));
        }

        // Lost the race to another process: prefer its token when still usable.
        debug!("Token cache changed during refresh, re-reading");
        match self.fresh(self.store.load().await?.as_ref()) {
            Some(token) => Ok(token),
            None => Ok(SecretString::new(issued.access_token.into())),
        }
    }
}
