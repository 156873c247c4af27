use crate::config::YoLinkConfig;
use crate::error::{Error, Result};
use crate::yolink_api::models::response::token_response::{Credential, TokenResponse};
use chrono::Utc;
use reqwest::header::ACCEPT;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Holds the bearer credential for the API and the broker, refreshing it on demand through
/// the client-credentials token exchange.
#[derive(Clone)]
pub struct TokenCache {
    client: reqwest::Client,
    token_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    safety_fraction: f64,
    credential: Arc<RwLock<Option<Credential>>>,
}

impl TokenCache {
    pub fn new(client: reqwest::Client, config: &YoLinkConfig) -> Self {
        Self {
            client,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            safety_fraction: config.token_safety_fraction,
            credential: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn get_token(&self) -> Result<Credential> {
        {
            let lock = self.credential.read().await;
            if let Some(ref credential) = *lock
                && !credential.is_expired()
            {
                return Ok(credential.clone());
            }
        }

        // The exchange runs without holding the lock; a failure leaves nothing cached.
        match self.exchange().await {
            Ok(credential) => {
                *self.credential.write().await = Some(credential.clone());
                info!("New token obtained, expires at: {}", credential.expires_at);
                Ok(credential)
            }
            Err(e) => {
                self.invalidate().await;
                error!("Failed to obtain access token: {}", e);
                // Transport and body failures of the exchange are authentication failures.
                Err(match e {
                    Error::Config(_) | Error::Auth(_) => e,
                    other => Error::Auth(format!("token exchange failed: {}", other)),
                })
            }
        }
    }

    /// Drops the cached credential so the next `get_token` exchanges again.
    pub async fn invalidate(&self) {
        if self.credential.write().await.take().is_some() {
            debug!("Cleared cached access token");
        }
    }

    async fn exchange(&self) -> Result<Credential> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(Error::Config(
                "YOLINK_CLIENT_ID and YOLINK_CLIENT_SECRET environment variables must be set"
                    .to_string(),
            ));
        };

        debug!("Making auth request to: {}", self.token_url);
        let response = self
            .client
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let contents = response.text().await?;
        let token_response: TokenResponse = serde_json::from_str(&contents).map_err(|e| {
            if status.is_success() {
                Error::parse("auth response", e, &contents)
            } else {
                Error::Auth(format!("token endpoint returned {}: {}", status, contents))
            }
        })?;

        if !token_response.is_success() {
            return Err(Error::Auth(format!(
                "authentication failed: {} (code: {})",
                token_response.message.as_deref().unwrap_or_default(),
                token_response.code_text()
            )));
        }
        if token_response.access_token.is_empty() {
            return Err(Error::Auth(
                "authentication failed: no access token received".to_string(),
            ));
        }

        Ok(Credential::from_response(
            &token_response,
            self.safety_fraction,
            Utc::now(),
        ))
    }
}
