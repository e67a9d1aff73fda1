//! Session entity: the persisted record binding one login to its current token hashes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How the user authenticated when the session was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginMethod {
    #[default]
    Password,
    Otp,
    Passkey,
    Sso,
    Unknown,
}

impl LoginMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Password => "password",
            LoginMethod::Otp => "otp",
            LoginMethod::Passkey => "passkey",
            LoginMethod::Sso => "sso",
            LoginMethod::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for LoginMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "password" => LoginMethod::Password,
            "otp" => LoginMethod::Otp,
            "passkey" => LoginMethod::Passkey,
            "sso" => LoginMethod::Sso,
            _ => LoginMethod::Unknown,
        })
    }
}

/// Device details reported by the client at login
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Stable per-device identifier; generated when absent
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
}

/// Request context captured when a token pair is issued
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device: DeviceInfo,
    pub login_method: LoginMethod,
}

impl ClientContext {
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device.device_id = Some(device_id.into());
        self
    }
}

/// Descriptive session metadata; never used for authorization decisions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_name: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub login_method: LoginMethod,
}

impl From<&ClientContext> for SessionMetadata {
    fn from(context: &ClientContext) -> Self {
        Self {
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
            device_name: context.device.device_name.clone(),
            browser: context.device.browser.clone(),
            os: context.device.os.clone(),
            login_method: context.login_method,
        }
    }
}

/// Why a session was revoked
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RevocationReason {
    #[default]
    Logout,
    LogoutOtherDevices,
    Administrative,
    Security,
    Custom(String),
}

impl RevocationReason {
    pub fn as_str(&self) -> &str {
        match self {
            RevocationReason::Logout => "logout",
            RevocationReason::LogoutOtherDevices => "logout_other_devices",
            RevocationReason::Administrative => "administrative",
            RevocationReason::Security => "security",
            RevocationReason::Custom(reason) => reason,
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for RevocationReason {
    fn from(value: &str) -> Self {
        match value {
            "logout" => RevocationReason::Logout,
            "logout_other_devices" => RevocationReason::LogoutOtherDevices,
            "administrative" => RevocationReason::Administrative,
            "security" => RevocationReason::Security,
            other => RevocationReason::Custom(other.to_string()),
        }
    }
}

/// Which rows a revocation applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSelector {
    /// Exact session id
    SessionId(String),
    /// Access hash, refresh hash or device id
    TokenHashOrDevice(String),
}

/// Session entity stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique identifier embedded in every token issued under this session
    pub session_id: String,

    /// Owner of the session
    pub user_id: Uuid,

    /// Stable per-device identifier
    pub device_id: String,

    /// SHA-256 of the current access token
    pub access_token_hash: String,

    /// SHA-256 of the current refresh token
    pub refresh_token_hash: String,

    pub created_at: DateTime<Utc>,

    /// Tracks the refresh token lifetime
    pub expires_at: DateTime<Utc>,

    pub last_activity: DateTime<Utc>,

    /// Terminal once true
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_reason: Option<String>,

    pub metadata: SessionMetadata,
}

impl Session {
    /// Creates a new live session
    pub fn new(
        session_id: impl Into<String>,
        user_id: Uuid,
        device_id: impl Into<String>,
        access_token_hash: impl Into<String>,
        refresh_token_hash: impl Into<String>,
        expires_at: DateTime<Utc>,
        metadata: SessionMetadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            user_id,
            device_id: device_id.into(),
            access_token_hash: access_token_hash.into(),
            refresh_token_hash: refresh_token_hash.into(),
            created_at: now,
            expires_at,
            last_activity: now,
            is_revoked: false,
            revoked_at: None,
            revoked_reason: None,
            metadata,
        }
    }

    /// Whether the session has passed its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Live means not revoked and not expired; anything else counts as absent
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && !self.is_expired_at(now)
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }

    /// Marks the session revoked. Returns `false` if it already was.
    pub fn revoke(&mut self, reason: &RevocationReason, now: DateTime<Utc>) -> bool {
        if self.is_revoked {
            return false;
        }
        self.is_revoked = true;
        self.revoked_at = Some(now);
        self.revoked_reason = Some(reason.to_string());
        true
    }

    /// Whether a `last_activity` write is due given a throttle interval
    pub fn activity_is_stale(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        now - self.last_activity >= interval
    }

    /// Whether the selector addresses this session
    pub fn matches(&self, selector: &SessionSelector) -> bool {
        match selector {
            SessionSelector::SessionId(id) => &self.session_id == id,
            SessionSelector::TokenHashOrDevice(value) => {
                &self.access_token_hash == value
                    || &self.refresh_token_hash == value
                    || &self.device_id == value
            }
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            device_id: self.device_id.clone(),
            metadata: self.metadata.clone(),
            created_at: self.created_at,
            last_activity: self.last_activity,
            expires_at: self.expires_at,
        }
    }
}

/// Read model for "where am I logged in" listings; carries no token material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub device_id: String,
    pub metadata: SessionMetadata,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
