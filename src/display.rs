// User-facing rendering of session records

use crate::net_info::HostInfo;
use crate::session::SessionRecord;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render an instant as `YYYY-MM-DD HH:mm:ss` in the given timezone
pub fn format_timestamp(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string()
}

/// Render a duration as `"H horas, M minutos y S segundos"`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{} horas, {} minutos y {} segundos", hours, minutes, seconds)
}

/// Session as shown to clients, with timestamps in the display timezone
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub email: String,
    pub nickname: String,
    pub mac_address: String,
    pub origin_ip: String,
    pub created_at: String,
    pub last_accessed_at: String,
    pub server: HostInfo,
}

impl SessionView {
    pub fn new(record: &SessionRecord, tz: Tz, server: HostInfo) -> Self {
        Self {
            session_id: record.session_id.clone(),
            email: record.identity.email.clone(),
            nickname: record.identity.nickname.clone(),
            mac_address: record.identity.mac_address.clone(),
            origin_ip: record.origin_ip.clone(),
            created_at: format_timestamp(record.created_at, tz),
            last_accessed_at: format_timestamp(record.last_accessed_at, tz),
            server,
        }
    }
}

/// Status summary including the session's age since creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusView {
    pub session_id: String,
    pub started: String,
    pub last_access: String,
    pub elapsed: String,
    pub server: HostInfo,
}

impl SessionStatusView {
    pub fn at(record: &SessionRecord, now: DateTime<Utc>, tz: Tz, server: HostInfo) -> Self {
        Self {
            session_id: record.session_id.clone(),
            started: format_timestamp(record.created_at, tz),
            last_access: format_timestamp(record.last_accessed_at, tz),
            elapsed: format_elapsed(now - record.created_at),
            server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionIdentity;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_in_mexico_city() {
        // CST is UTC-6 with no daylight saving since 2022
        let instant = Utc.with_ymd_and_hms(2024, 3, 15, 18, 5, 9).unwrap();
        assert_eq!(
            format_timestamp(instant, chrono_tz::America::Mexico_City),
            "2024-03-15 12:05:09"
        );
    }

    #[test]
    fn test_format_timestamp_in_utc() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(instant, chrono_tz::UTC), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::zero()), "0 horas, 0 minutos y 0 segundos");
        assert_eq!(
            format_elapsed(Duration::seconds(3 * 3600 + 25 * 60 + 7)),
            "3 horas, 25 minutos y 7 segundos"
        );
        assert_eq!(
            format_elapsed(Duration::milliseconds(61_999)),
            "0 horas, 1 minutos y 1 segundos"
        );
    }

    #[test]
    fn test_format_elapsed_clamps_negative() {
        assert_eq!(
            format_elapsed(Duration::seconds(-5)),
            "0 horas, 0 minutos y 0 segundos"
        );
    }

    #[test]
    fn test_status_view_elapsed_from_creation() {
        let created = Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap();
        let mut record = SessionRecord::new(
            SessionIdentity {
                email: "a@x.com".to_string(),
                nickname: "a".to_string(),
                mac_address: "AA:BB".to_string(),
            },
            "10.0.0.7".to_string(),
            created,
        );
        record.touch_at(created + Duration::seconds(30));

        let view = SessionStatusView::at(
            &record,
            created + Duration::seconds(90),
            chrono_tz::UTC,
            HostInfo::unavailable(),
        );

        assert_eq!(view.elapsed, "0 horas, 1 minutos y 30 segundos");
        assert_eq!(view.started, "2024-03-15 18:00:00");
        assert_eq!(view.last_access, "2024-03-15 18:00:30");
    }
}
