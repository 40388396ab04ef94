//! Wire types for the LMS Manager HTTP API.
//!
//! Every response field is optional or defaulted: the client renders what
//! arrives and leaves the rest of the screen untouched.

use serde::{Deserialize, Serialize};

/// `POST /login` request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// `POST /login` success body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Error body returned by every endpoint on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

/// Body of the start/stop/restart endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// `GET /api/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub cpu_usage: Option<f64>,
    #[serde(default)]
    pub memory_usage: Option<f64>,
    #[serde(default)]
    pub disk_usage: Option<f64>,
    /// Host uptime in seconds.
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub moodle_status: Option<MoodleStatus>,
    #[serde(default)]
    pub load_avg: Option<LoadAverage>,
    #[serde(default)]
    pub network_io: Option<NetworkCounters>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Managed process status, embedded in stats or from `GET /api/moodle/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoodleStatus {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub version: Option<String>,
    /// Process uptime in seconds.
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub process_id: Option<u32>,
    #[serde(default)]
    pub last_check: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAverage {
    #[serde(default)]
    pub load_1: f64,
    #[serde(default)]
    pub load_5: f64,
    #[serde(default)]
    pub load_15: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkCounters {
    #[serde(default)]
    pub bytes_received: u64,
    #[serde(default)]
    pub bytes_sent: u64,
    #[serde(default)]
    pub packets_received: u64,
    #[serde(default)]
    pub packets_sent: u64,
}

/// `GET /api/alerts` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub resolved: bool,
}

/// `GET /api/logs` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub source: String,
}

/// `GET /api/users` element, also embedded in the login response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_accepts_partial_payload() {
        let snap: DashboardSnapshot = serde_json::from_str(r#"{"cpu_usage": 42.5}"#).unwrap();
        assert_eq!(snap.cpu_usage, Some(42.5));
        assert_eq!(snap.memory_usage, None);
        assert!(snap.moodle_status.is_none());
    }

    #[test]
    fn snapshot_parses_backend_shape() {
        let json = r#"{
            "cpu_usage": 12.0,
            "memory_usage": 65.2,
            "disk_usage": 81.0,
            "network_io": {"bytes_received": 1024, "bytes_sent": 2048, "packets_received": 3, "packets_sent": 4},
            "uptime": 90000,
            "load_avg": {"load_1": 0.5, "load_5": 0.25, "load_15": 0.1},
            "timestamp": "2025-01-09T10:00:00Z",
            "moodle_status": {"running": true, "version": "4.3", "uptime": 3665, "process_id": 4242}
        }"#;
        let snap: DashboardSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.uptime, Some(90000));
        assert_eq!(snap.load_avg.unwrap().load_5, 0.25);
        assert_eq!(snap.network_io.unwrap().bytes_sent, 2048);
        let status = snap.moodle_status.unwrap();
        assert!(status.running);
        assert_eq!(status.process_id, Some(4242));
    }

    #[test]
    fn alert_type_field_is_renamed() {
        let alert: Alert = serde_json::from_str(
            r#"{"id":"a1","type":"cpu","severity":"high","message":"CPU hot","timestamp":"2025-01-09T10:00:00Z","resolved":false}"#,
        )
        .unwrap();
        assert_eq!(alert.kind, "cpu");
        assert_eq!(alert.severity, "high");
    }

    #[test]
    fn login_response_tolerates_missing_user() {
        let resp: LoginResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(resp.token, "abc");
        assert!(resp.user.is_none());
    }

    #[test]
    fn error_body_defaults_when_empty() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.error.is_none());
    }
}
