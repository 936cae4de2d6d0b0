use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Tokens with less than this left are treated as already expired.
    pub expiry_buffer: Duration,
    /// No refresh is attempted this soon after a login.
    pub login_grace: Duration,
    pub login_path: String,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            expiry_buffer: Duration::from_secs(60),
            login_grace: Duration::from_secs(10),
            login_path: "/login".to_string(),
        }
    }
}

type Waiter = oneshot::Sender<Result<AccessToken, RefreshError>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

enum Turn<'a> {
    Lead(InFlight<'a>, RefreshToken),
    Follow(oneshot::Receiver<Result<AccessToken, RefreshError>>),
}

/// Held by the one caller performing the network exchange. Dropping it
/// without `settle` (the caller's future was cancelled) still clears the
/// flag; queued waiters then see their sender vanish.
struct InFlight<'a> {
    state: &'a Mutex<RefreshState>,
    settled: bool,
}

impl InFlight<'_> {
    /// Runs `before_release` and clears the flag in the same critical
    /// section, so no caller can observe the effects of a settled refresh
    /// while it still counts as in flight.
    fn settle(mut self, before_release: impl FnOnce()) -> Vec<Waiter> {
        self.settled = true;
        let mut state = lock(self.state);
        before_release();
        state.in_flight = false;
        std::mem::take(&mut state.waiters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut state = lock(self.state);
            state.in_flight = false;
            state.waiters.clear();
        }
    }
}

pub struct RealTokenRefreshService {
    storage: Arc<dyn AuthStorage>,
    transport: Arc<dyn RefreshTransport>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    policy: RefreshPolicy,
    state: Mutex<RefreshState>,
}

impl RealTokenRefreshService {
    pub fn new(
        storage: Arc<dyn AuthStorage>,
        transport: Arc<dyn RefreshTransport>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            storage,
            transport,
            navigator,
            clock,
            policy,
            state: Mutex::new(RefreshState::default()),
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

    fn stored_refresh_token(&self) -> Option<RefreshToken> {
        self.read(StorageKey::RefreshToken).map(RefreshToken)
    }

    fn within_login_grace(&self) -> bool {
        let Some(login_ms) = self
            .read(StorageKey::LastLoginTime)
            .and_then(|v| v.parse::<i64>().ok())
        else {
            return false;
        };
        let elapsed_ms = self.clock.now().timestamp_millis() - login_ms;
        let grace_ms = i64::try_from(self.policy.login_grace.as_millis()).unwrap_or(i64::MAX);
        elapsed_ms < grace_ms
    }

    fn clear_session(&self) {
        for key in StorageKey::ALL {
            if let Err(e) = self.storage.remove(key) {
                warn!(%key, error = %e, "failed to clear auth slot");
            }
        }
    }

    fn redirect_to_login(&self) {
        let current = self.navigator.current_path();
        let current_path = current.split(['?', '#']).next().unwrap_or_default();
        if current_path == self.policy.login_path {
            return;
        }
        self.navigator
            .navigate(&format!("{}?expired=true", self.policy.login_path));
    }

    /// The refresh token is read under the state lock: a leader clears the
    /// session only while holding it, so a missing token here means no
    /// refresh is running.
    fn take_turn(&self) -> Result<Turn<'_>, RefreshError> {
        let mut state = lock(&self.state);
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            return Ok(Turn::Follow(rx));
        }

        let Some(refresh_token) = self.stored_refresh_token() else {
            warn!("no refresh token stored, clearing session");
            self.clear_session();
            return Err(RefreshError::NoRefreshToken);
        };
        state.in_flight = true;
        Ok(Turn::Lead(
            InFlight {
                state: &self.state,
                settled: false,
            },
            refresh_token,
        ))
    }

    async fn exchange(&self, refresh_token: &RefreshToken) -> Result<AccessToken, RefreshError> {
        let response = self.transport.refresh(refresh_token).await?;
        let access_token = response
            .access_token
            .filter(|t| !t.is_empty())
            .map(AccessToken)
            .ok_or_else(|| RefreshError::MalformedResponse("missing access_token".to_string()))?;

        self.storage
            .set(StorageKey::AuthToken, access_token.as_str())?;
        if let Some(rotated) = response.refresh_token.filter(|t| !t.is_empty()) {
            self.storage.set(StorageKey::RefreshToken, &rotated)?;
        }
        Ok(access_token)
    }

    #[cfg(test)]
    fn pending_waiters(&self) -> usize {
        lock(&self.state).waiters.len()
    }
}

#[async_trait::async_trait]
impl TokenRefreshService for RealTokenRefreshService {
    fn is_token_expiring_soon(&self, token: Option<&AccessToken>) -> bool {
        token.is_none_or(|t| t.is_expiring_within(self.clock.now(), self.policy.expiry_buffer))
    }

    async fn refresh_if_needed(&self) -> bool {
        self.refresh_if_needed_within(self.policy.expiry_buffer).await
    }

    async fn refresh_if_needed_within(&self, window: Duration) -> bool {
        let Some(token) = self.access_token() else {
            return false;
        };
        if self.stored_refresh_token().is_none() {
            warn!("access token present without a refresh token, cannot refresh");
            return false;
        }
        if !token.is_expiring_within(self.clock.now(), window) {
            return false;
        }

        match self.refresh_token().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "token refresh failed, keeping stale token");
                false
            }
        }
    }

    async fn refresh_token(&self) -> Result<AccessToken, RefreshError> {
        if self.within_login_grace() {
            if let Some(token) = self.access_token() {
                debug!("logged in moments ago, keeping the issued access token");
                return Ok(token);
            }
        }

        let (in_flight, refresh_token) = match self.take_turn()? {
            Turn::Follow(rx) => {
                debug!("refresh already in flight, waiting on it");
                return rx.await.unwrap_or(Err(RefreshError::Aborted));
            }
            Turn::Lead(in_flight, refresh_token) => (in_flight, refresh_token),
        };

        let outcome = self.exchange(&refresh_token).await;
        let waiters = in_flight.settle(|| {
            if outcome.is_err() {
                self.clear_session();
            }
        });
        match &outcome {
            Ok(token) => info!(
                waiters = waiters.len(),
                secs_left = token.seconds_until_expiry(self.clock.now()),
                "access token refreshed"
            ),
            Err(e) => warn!(waiters = waiters.len(), error = %e, "token refresh failed, session cleared"),
        }
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        if outcome.is_err() {
            self.redirect_to_login();
        }
        outcome
    }

    fn time_until_expiry(&self) -> Option<u64> {
        self.access_token()?.seconds_until_expiry(self.clock.now())
    }

    fn is_authenticated(&self) -> bool {
        self.access_token()
            .is_some_and(|t| !t.is_expiring_within(self.clock.now(), self.policy.expiry_buffer))
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
        info!(
            user = login.user.as_ref().map(|u| u.username.as_str()),
            "session stored"
        );
        Ok(())
    }

    fn logout(&self) {
        self.clear_session();
        info!("session cleared");
    }
}
