use crate::session::SessionConfig;
use crate::session::types::MAX_REAPER_INTERVAL_SECS;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub display: DisplayConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// How sessions are presented to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// IANA timezone used for user-facing timestamps
    pub timezone: String,
    /// Whether `GET /status` also refreshes the session's last access time
    pub refresh_on_status: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: "America/Mexico_City".to_string(),
            refresh_on_status: false,
        }
    }
}

impl AppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.session.ttl_secs <= 0 {
            return Err("session.ttl_secs must be greater than zero".to_string());
        }

        if self.session.checked_ttl().is_none() {
            return Err(format!(
                "session.ttl_secs {} is out of range",
                self.session.ttl_secs
            ));
        }

        if self.session.reaper_interval_secs == 0 {
            return Err("session.reaper_interval_secs must be greater than zero".to_string());
        }

        if self.session.reaper_interval_secs > MAX_REAPER_INTERVAL_SECS {
            return Err(format!(
                "session.reaper_interval_secs must be at most {}",
                MAX_REAPER_INTERVAL_SECS
            ));
        }

        self.display_timezone()?;

        Ok(())
    }

    pub fn display_timezone(&self) -> Result<Tz, String> {
        self.display
            .timezone
            .parse::<Tz>()
            .map_err(|_| format!("Unknown display timezone '{}'", self.display.timezone))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
