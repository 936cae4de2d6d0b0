use crate::domain_model::{AccessToken, LoginTokens};
use crate::domain_port::{StorageError, TransportError};
use std::future::Future;
use std::time::Duration;

/// Why a refresh attempt failed.
///
/// Cloneable so that every caller queued behind one in-flight refresh
/// receives the same value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("no refresh token")]
    NoRefreshToken,
    #[error("refresh rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("malformed refresh response: {0}")]
    MalformedResponse(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("refresh aborted before completion")]
    Aborted,
}

impl From<StorageError> for RefreshError {
    fn from(error: StorageError) -> Self {
        RefreshError::Storage(error.to_string())
    }
}

impl From<TransportError> for RefreshError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Rejected { status, body } => RefreshError::Rejected { status, body },
            TransportError::Malformed(reason) => RefreshError::MalformedResponse(reason),
            TransportError::Network(reason) => RefreshError::Transport(reason),
        }
    }
}

#[async_trait::async_trait]
pub trait TokenRefreshService: Send + Sync {
    /// Advisory expiry check using the configured expiry buffer.
    fn is_token_expiring_soon(&self, token: Option<&AccessToken>) -> bool;

    /// Refreshes only when the stored access token is inside the expiry
    /// buffer. Returns whether a refresh happened; never fails.
    async fn refresh_if_needed(&self) -> bool;

    /// Same as [`TokenRefreshService::refresh_if_needed`] with a caller
    /// supplied window instead of the expiry buffer.
    async fn refresh_if_needed_within(&self, window: Duration) -> bool;

    /// Runs the refresh protocol. Concurrent callers share one network call.
    async fn refresh_token(&self) -> Result<AccessToken, RefreshError>;

    fn time_until_expiry(&self) -> Option<u64>;

    fn is_authenticated(&self) -> bool;

    fn access_token(&self) -> Option<AccessToken>;

    /// Stores a fresh login and stamps the login time.
    fn record_login(&self, login: LoginTokens) -> Result<(), RefreshError>;

    /// Removes every auth slot.
    fn logout(&self);
}

impl dyn TokenRefreshService {
    /// Recovers from an unauthorized response: refreshes once, then replays
    /// `retry` once. A failed refresh is returned as-is; by then the session
    /// has already been cleared and the login redirect issued.
    pub async fn handle_auth_error<F, Fut, T>(&self, retry: F) -> Result<T, RefreshError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
    {
        self.refresh_token().await?;
        Ok(retry().await)
    }
}
