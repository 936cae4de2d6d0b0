use base64::Engine;
use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Accepts base64url segments with or without trailing `=` padding.
const JWT_SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads the payload segment without checking the signature.
    ///
    /// The result is advisory: it only tells the client whether a refresh is
    /// worth attempting. The backend stays the authority on validity.
    pub fn unverified_claims(&self) -> Option<TokenClaims> {
        let mut segments = self.0.split('.');
        let (_header, payload) = (segments.next()?, segments.next()?);
        let bytes = JWT_SEGMENT.decode(payload).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.unverified_claims()
            .and_then(|claims| DateTime::from_timestamp(claims.exp, 0))
    }

    /// True when fewer than `buffer` remain before `exp`, or when the
    /// payload can't be read at all. Compared in milliseconds so a
    /// sub-second `now` is not rounded down.
    pub fn is_expiring_within(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        match self.unverified_claims() {
            Some(claims) => {
                let buffer_ms = i64::try_from(buffer.as_millis()).unwrap_or(i64::MAX);
                let left_ms = claims
                    .exp
                    .saturating_mul(1000)
                    .saturating_sub(now.timestamp_millis());
                left_ms < buffer_ms
            }
            None => true,
        }
    }

    /// Whole seconds until `exp`, clamped to zero.
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<u64> {
        let claims = self.unverified_claims()?;
        let left = claims.exp.saturating_sub(now.timestamp()).max(0);
        Some(left as u64)
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl RefreshToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Subset of the JWT payload the client looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Subject>,
}

/// Backends disagree on whether `sub` is a string or a numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Text(String),
    Number(i64),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Text(s) => f.write_str(s),
            Subject::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Body posted to `/auth/refresh`.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Body returned by `/auth/refresh`. Both fields are optional on the wire;
/// a response without an access token counts as a failed refresh.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
