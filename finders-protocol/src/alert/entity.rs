use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an alert. Stored as its integer code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Triggered = 0,
    Acknowledged = 1,
    Resolved = 2,
    Ignored = 3,
}

impl Default for AlertStatus {
    fn default() -> Self {
        AlertStatus::Triggered
    }
}

impl AlertStatus {
    /// Every status an alert may hold.
    pub const ALL: [AlertStatus; 4] = [
        AlertStatus::Triggered,
        AlertStatus::Acknowledged,
        AlertStatus::Resolved,
        AlertStatus::Ignored,
    ];

    /// Statuses grouped under the `open` filter token.
    pub const OPEN: [AlertStatus; 2] = [AlertStatus::Triggered, AlertStatus::Acknowledged];

    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Resolves a filter token, either a status name or its stored code, into
    /// statuses. Unknown tokens resolve to nothing.
    pub fn expand_token(token: &str) -> &'static [AlertStatus] {
        match token.trim().to_ascii_lowercase().as_str() {
            "triggered" | "0" => &[AlertStatus::Triggered],
            "acknowledged" | "1" => &[AlertStatus::Acknowledged],
            "resolved" | "2" => &[AlertStatus::Resolved],
            "ignored" | "3" => &[AlertStatus::Ignored],
            "open" => &Self::OPEN,
            _ => &[],
        }
    }
}

/// Severity reported by the alert source. Lower codes are more severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
    Info = 4,
    Unknown = 5,
}

impl Default for AlertSeverity {
    fn default() -> Self {
        AlertSeverity::Unknown
    }
}

impl AlertSeverity {
    const ALL: [AlertSeverity; 6] = [
        AlertSeverity::Critical,
        AlertSeverity::High,
        AlertSeverity::Medium,
        AlertSeverity::Low,
        AlertSeverity::Info,
        AlertSeverity::Unknown,
    ];

    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|severity| severity.code() == code)
    }
}

/// Alert raised for a project by an external monitoring integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    /// Sequential identifier scoped to the owning project.
    pub iid: i64,
    pub project_id: i64,
    pub title: String,
    #[serde(default)]
    pub status: AlertStatus,
    #[serde(default)]
    pub severity: AlertSeverity,
    /// Number of times the source fired this alert.
    pub events: i64,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Creates a freshly triggered alert with timestamps set to now.
    pub fn new(id: i64, iid: i64, project_id: i64, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            iid,
            project_id,
            title: title.into(),
            status: AlertStatus::Triggered,
            severity: AlertSeverity::Unknown,
            events: 1,
            started_at: now,
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: AlertStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_token_expands_to_unresolved_statuses() {
        assert_eq!(
            AlertStatus::expand_token("open"),
            &[AlertStatus::Triggered, AlertStatus::Acknowledged]
        );
        assert_eq!(AlertStatus::expand_token(" Resolved "), &[AlertStatus::Resolved]);
        assert!(AlertStatus::expand_token("closed").is_empty());
    }

    #[test]
    fn stored_codes_are_valid_tokens() {
        for status in AlertStatus::ALL {
            assert_eq!(AlertStatus::expand_token(&status.code().to_string()), &[status]);
        }
        assert!(AlertStatus::expand_token("4").is_empty());
        assert!(AlertStatus::expand_token("-1").is_empty());
    }

    #[test]
    fn codes_round_trip() {
        for status in AlertStatus::ALL {
            assert_eq!(AlertStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(AlertSeverity::from_code(0), Some(AlertSeverity::Critical));
        assert_eq!(AlertSeverity::from_code(9), None);
    }
}
