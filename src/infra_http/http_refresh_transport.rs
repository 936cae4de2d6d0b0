use crate::domain_model::{RefreshRequest, RefreshResponse, RefreshToken};
use crate::domain_port::{RefreshTransport, TransportError};
use crate::logger::*;
use std::time::Duration;

/// `POST {base_url}/auth/refresh` over reqwest.
pub struct HttpRefreshTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRefreshTransport {
    pub fn try_new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/auth/refresh", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl RefreshTransport for HttpRefreshTransport {
    async fn refresh(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<RefreshResponse, TransportError> {
        debug!(endpoint = %self.endpoint, "requesting token refresh");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&RefreshRequest {
                refresh_token: refresh_token.as_str(),
            })
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<RefreshResponse>()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
