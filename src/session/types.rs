// Session types and data structures

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which timestamp a session's age is measured from when deciding expiry
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryBasis {
    /// Absolute age since the session was created
    Created,
    /// Inactivity since the last successful access or update
    #[default]
    LastAccess,
}

impl std::str::FromStr for ExpiryBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" | "created_at" => Ok(ExpiryBasis::Created),
            "last_access" | "last_accessed_at" | "inactivity" => Ok(ExpiryBasis::LastAccess),
            other => Err(format!("Unknown expiry basis '{}'", other)),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Age after which a session is evicted by the reaper
    pub ttl_secs: i64,
    /// How often the reaper sweeps the registry
    pub reaper_interval_secs: u64,
    /// Timestamp the age is measured from
    pub expiry_basis: ExpiryBasis,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 120,
            reaper_interval_secs: 60,
            expiry_basis: ExpiryBasis::LastAccess,
        }
    }
}

/// Longest accepted sweep period (one day)
pub const MAX_REAPER_INTERVAL_SECS: u64 = 86_400;

impl SessionConfig {
    /// TTL as a duration, or `None` when `ttl_secs` is out of range
    pub fn checked_ttl(&self) -> Option<Duration> {
        Duration::try_seconds(self.ttl_secs)
    }

    /// Out-of-range values saturate so a bad config never expires sessions early
    pub fn ttl(&self) -> Duration {
        self.checked_ttl().unwrap_or(Duration::MAX)
    }

    pub fn reaper_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.reaper_interval_secs)
    }
}

/// Caller-supplied identity attached to a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub email: String,
    pub nickname: String,
    /// Device or network identifier of the client
    pub mac_address: String,
}

/// Identity fields as supplied at login; every field is required
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub mac_address: Option<String>,
}

impl NewSession {
    pub fn new(
        email: impl Into<String>,
        nickname: impl Into<String>,
        mac_address: impl Into<String>,
    ) -> Self {
        Self {
            email: Some(email.into()),
            nickname: Some(nickname.into()),
            mac_address: Some(mac_address.into()),
        }
    }

    /// Names of required fields that are absent or blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("email", &self.email),
            ("nickname", &self.nickname),
            ("macAddress", &self.mac_address),
        ];

        fields
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }

    /// Convert into an identity, or `None` if any field is missing
    pub fn into_identity(self) -> Option<SessionIdentity> {
        if !self.missing_fields().is_empty() {
            return None;
        }

        Some(SessionIdentity {
            email: self.email?.trim().to_string(),
            nickname: self.nickname?.trim().to_string(),
            mac_address: self.mac_address?.trim().to_string(),
        })
    }
}

/// Partial identity update; `None` fields keep their previous value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUpdate {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub mac_address: Option<String>,
}

impl IdentityUpdate {
    pub fn nickname(nickname: impl Into<String>) -> Self {
        Self {
            nickname: Some(nickname.into()),
            ..Default::default()
        }
    }

    /// Drop blank values so they count as "not supplied"
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            email: keep(self.email),
            nickname: keep(self.nickname),
            mac_address: keep(self.mac_address),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.nickname.is_none() && self.mac_address.is_none()
    }
}

/// Live session record owned by the registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Opaque session token, also the registry key
    pub session_id: String,
    #[serde(flatten)]
    pub identity: SessionIdentity,
    /// Address the login request came from
    pub origin_ip: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a new record with a fresh random id
    pub fn new(identity: SessionIdentity, origin_ip: String, now: DateTime<Utc>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            identity,
            origin_ip,
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Advance `last_accessed_at`, never moving it backwards
    pub fn touch_at(&mut self, now: DateTime<Utc>) {
        if now > self.last_accessed_at {
            self.last_accessed_at = now;
        }
    }

    /// Apply the supplied fields and record the access
    pub fn apply_update(&mut self, update: &IdentityUpdate, now: DateTime<Utc>) {
        if let Some(email) = &update.email {
            self.identity.email = email.clone();
        }
        if let Some(nickname) = &update.nickname {
            self.identity.nickname = nickname.clone();
        }
        if let Some(mac_address) = &update.mac_address {
            self.identity.mac_address = mac_address.clone();
        }
        self.touch_at(now);
    }

    /// Time elapsed since the chosen basis timestamp
    pub fn age_at(&self, now: DateTime<Utc>, basis: ExpiryBasis) -> Duration {
        let since = match basis {
            ExpiryBasis::Created => self.created_at,
            ExpiryBasis::LastAccess => self.last_accessed_at,
        };
        now - since
    }

    /// A session is live during `[basis, basis + ttl)`
    pub fn is_expired_at(&self, now: DateTime<Utc>, config: &SessionConfig) -> bool {
        self.age_at(now, config.expiry_basis) >= config.ttl()
    }
}
