use crate::domain_model::{AccessToken, RefreshToken};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known slots the session lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AuthToken,
    RefreshToken,
    LastLoginTime,
    AuthUser,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::AuthToken,
        StorageKey::RefreshToken,
        StorageKey::LastLoginTime,
        StorageKey::AuthUser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AuthToken => "auth_token",
            StorageKey::RefreshToken => "refresh_token",
            StorageKey::LastLoginTime => "last_login_time",
            StorageKey::AuthUser => "auth_user",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of the logged-in panel user, stored as a JSON blob next to the
/// tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub user: Option<SessionUser>,
}
