//! Token Client
//!
//! Fetches a short-lived conversation token from the backend. Tokens are
//! never cached: every start attempt asks for a fresh one.

use crate::error::{TOKEN_FETCH_FALLBACK, TokenError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Path of the token endpoint, relative to the backend base URL.
pub const TOKEN_ENDPOINT: &str = "/api/get-conversation-token";

/// The token issued for one session. Consumed immediately, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Defines the contract for anything that can issue a conversation token.
#[async_trait]
pub trait TokenClient: Send + Sync {
    /// Requests a token authorizing one session with `agent_id`.
    async fn fetch_token(&self, agent_id: &str) -> Result<TokenResponse, TokenError>;
}

/// A `TokenClient` backed by a plain HTTP GET against the backend.
///
/// No timeout is set here; the transport defaults apply.
pub struct HttpTokenClient {
    http: reqwest::Client,
    backend_url: String,
}

impl HttpTokenClient {
    /// Creates a client for the backend at `backend_url`.
    ///
    /// A trailing `/` is ignored so `https://host/` and `https://host` hit the
    /// same endpoint.
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), backend_url)
    }

    pub fn with_client(http: reqwest::Client, backend_url: impl Into<String>) -> Self {
        let backend_url = backend_url.into().trim_end_matches('/').to_string();
        Self { http, backend_url }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.backend_url, TOKEN_ENDPOINT)
    }
}

#[async_trait]
impl TokenClient for HttpTokenClient {
    async fn fetch_token(&self, agent_id: &str) -> Result<TokenResponse, TokenError> {
        let response = self
            .http
            .get(self.endpoint())
            .query(&[("agent_id", agent_id)])
            .send()
            .await
            .map_err(|e| TokenError::Network(e.to_string()))?;

        let status = response.status();
        debug!(%status, "Token backend responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                TOKEN_FETCH_FALLBACK.to_string()
            } else {
                body
            };
            return Err(TokenError::Fetch(message));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TokenError::Network(e.to_string()))?;
        serde_json::from_slice::<TokenResponse>(&body)
            .map_err(|e| TokenError::Fetch(format!("Invalid token response: {e}")))
    }
}
