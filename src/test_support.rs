//! Fakes shared by the unit tests.

use crate::domain_model::{AccessToken, RefreshResponse, RefreshToken};
use crate::domain_port::{Clock, RefreshTransport, TransportError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

pub fn mint_token(exp: DateTime<Utc>, sub: &str) -> AccessToken {
    let token = encode(
        &Header::default(),
        &json!({ "exp": exp.timestamp(), "sub": sub }),
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap();
    AccessToken(token)
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Replays queued outcomes and counts calls. When gated, each call parks
/// until the test hands out a permit.
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<RefreshResponse, TransportError>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn respond(self, access: &str, refresh: Option<&str>) -> Self {
        self.push(Ok(RefreshResponse {
            access_token: Some(access.to_owned()),
            refresh_token: refresh.map(str::to_owned),
        }))
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.push(Err(error))
    }

    pub fn push(self, outcome: Result<RefreshResponse, TransportError>) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RefreshTransport for ScriptedTransport {
    async fn refresh(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<RefreshResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(refresh_token.as_str().to_owned());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
    }
}
