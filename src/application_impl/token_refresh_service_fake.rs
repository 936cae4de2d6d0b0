use crate::application_impl::RefreshPolicy;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use std::sync::Arc;

const FAKE_SIGNING_KEY: &[u8] = b"fake-panel-key";

/// Offline stand-in for UI work without a backend. Sessions live in the
/// configured storage like the real ones; every refresh mints a new
/// one-hour token for the same subject instead of calling the network.
pub struct FakeTokenRefreshService {
    storage: Arc<dyn AuthStorage>,
    clock: Arc<dyn Clock>,
    policy: RefreshPolicy,
}

impl FakeTokenRefreshService {
    pub fn new(storage: Arc<dyn AuthStorage>, clock: Arc<dyn Clock>, policy: RefreshPolicy) -> Self {
        Self {
            storage,
            clock,
            policy,
        }
    }

    fn read(&self, key: StorageKey) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(%key, error = %e, "failed to read auth slot");
                None
            }
        }
    }
}

fn fake_subject(username: &str) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, username.as_bytes()).to_string()
}

fn fake_access_token(subject: &str, now: DateTime<Utc>) -> Result<AccessToken, RefreshError> {
    let exp = now + Duration::hours(1);
    let token = encode(
        &Header::default(),
        &json!({ "sub": subject, "exp": exp.timestamp() }),
        &EncodingKey::from_secret(FAKE_SIGNING_KEY),
    )
    .map_err(|e| RefreshError::MalformedResponse(e.to_string()))?;
    Ok(AccessToken(token))
}

#[async_trait::async_trait]
impl TokenRefreshService for FakeTokenRefreshService {
    fn is_token_expiring_soon(&self, token: Option<&AccessToken>) -> bool {
        token.is_none_or(|t| t.is_expiring_within(self.clock.now(), self.policy.expiry_buffer))
    }

    async fn refresh_if_needed(&self) -> bool {
        self.refresh_if_needed_within(self.policy.expiry_buffer).await
    }

    async fn refresh_if_needed_within(&self, window: std::time::Duration) -> bool {
        let Some(token) = self.access_token() else {
            return false;
        };
        if !token.is_expiring_within(self.clock.now(), window) {
            return false;
        }
        self.refresh_token().await.is_ok()
    }

    async fn refresh_token(&self) -> Result<AccessToken, RefreshError> {
        if self.read(StorageKey::RefreshToken).is_none() {
            self.logout();
            return Err(RefreshError::NoRefreshToken);
        }
        let subject = self
            .access_token()
            .and_then(|t| t.unverified_claims())
            .and_then(|c| c.sub)
            .map(|s| s.to_string())
            .unwrap_or_else(|| fake_subject("anonymous"));
        let token = fake_access_token(&subject, self.clock.now())?;
        self.storage.set(StorageKey::AuthToken, token.as_str())?;
        debug!(%subject, "fake access token minted");
        Ok(token)
    }

    fn time_until_expiry(&self) -> Option<u64> {
        self.access_token()?.seconds_until_expiry(self.clock.now())
    }

    fn is_authenticated(&self) -> bool {
        let token = self.access_token();
        token.is_some() && !self.is_token_expiring_soon(token.as_ref())
    }

    fn access_token(&self) -> Option<AccessToken> {
        self.read(StorageKey::AuthToken).map(AccessToken)
    }

    fn record_login(&self, login: LoginTokens) -> Result<(), RefreshError> {
        self.storage
            .set(StorageKey::AuthToken, login.access_token.as_str())?;
        self.storage
            .set(StorageKey::RefreshToken, login.refresh_token.as_str())?;
        self.storage.set(
            StorageKey::LastLoginTime,
            &self.clock.now().timestamp_millis().to_string(),
        )?;
        match &login.user {
            Some(user) => {
                let blob = serde_json::to_string(user).map_err(StorageError::from)?;
                self.storage.set(StorageKey::AuthUser, &blob)?;
            }
            None => self.storage.remove(StorageKey::AuthUser)?,
        }
        Ok(())
    }

    fn logout(&self) {
        for key in StorageKey::ALL {
            if let Err(e) = self.storage.remove(key) {
                warn!(%key, error = %e, "failed to clear auth slot");
            }
        }
    }
}

/// Builds a ready-made fake login for `username`, valid for an hour from
/// `now`.
pub fn fake_login(username: &str, now: DateTime<Utc>) -> Result<LoginTokens, RefreshError> {
    let subject = fake_subject(username);
    Ok(LoginTokens {
        access_token: fake_access_token(&subject, now)?,
        refresh_token: RefreshToken(format!("fake-refresh-token:{username}")),
        user: Some(SessionUser {
            id: subject,
            username: username.to_string(),
            role: None,
        }),
    })
}
