use crate::domain_model::{RefreshResponse, RefreshToken};

/// The single network round-trip that exchanges a refresh token for a new
/// access token.
#[async_trait::async_trait]
pub trait RefreshTransport: Send + Sync {
    async fn refresh(&self, refresh_token: &RefreshToken)
    -> Result<RefreshResponse, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unreadable response: {0}")]
    Malformed(String),
    #[error("network error: {0}")]
    Network(String),
}
