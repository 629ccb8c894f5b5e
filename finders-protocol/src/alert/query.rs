use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::entity::AlertStatus;

/// Ordering direction requested by a sort token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Alert attribute a sort token refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertSortField {
    Created,
    Updated,
    StartTime,
    EndTime,
    EventCount,
    Severity,
    Status,
}

/// Parsed `sort` parameter, e.g. `created_desc` or `severity_asc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlertSort {
    pub field: AlertSortField,
    pub direction: SortDirection,
}

impl AlertSort {
    pub fn new(field: AlertSortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Parses a sort token. Unknown tokens yield `None` and are treated as absent.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        let (name, direction) = token.rsplit_once('_')?;
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return None,
        };
        let field = match name {
            "created" | "created_at" => AlertSortField::Created,
            "updated" | "updated_at" => AlertSortField::Updated,
            "start_time" | "started_at" => AlertSortField::StartTime,
            "end_time" | "ended_at" => AlertSortField::EndTime,
            "events_count" => AlertSortField::EventCount,
            "severity" => AlertSortField::Severity,
            "status" => AlertSortField::Status,
            _ => return None,
        };
        Some(Self { field, direction })
    }

    /// Canonical token for this ordering.
    pub fn as_str(&self) -> &'static str {
        use AlertSortField::*;
        use SortDirection::*;
        match (self.field, self.direction) {
            (Created, Asc) => "created_asc",
            (Created, Desc) => "created_desc",
            (Updated, Asc) => "updated_asc",
            (Updated, Desc) => "updated_desc",
            (StartTime, Asc) => "start_time_asc",
            (StartTime, Desc) => "start_time_desc",
            (EndTime, Asc) => "end_time_asc",
            (EndTime, Desc) => "end_time_desc",
            (EventCount, Asc) => "events_count_asc",
            (EventCount, Desc) => "events_count_desc",
            (Severity, Asc) => "severity_asc",
            (Severity, Desc) => "severity_desc",
            (Status, Asc) => "status_asc",
            (Status, Desc) => "status_desc",
        }
    }
}

impl fmt::Display for AlertSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed filters accepted by the alerts finder.
///
/// Every field is optional and an absent field skips its pipeline stage.
/// Loose input (query strings, JSON objects) is normalised on the way in:
/// unknown statuses and sort tokens are dropped, malformed iids are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawAlertParams")]
pub struct AlertParams {
    pub status: Option<BTreeSet<AlertStatus>>,
    pub iid: Option<i64>,
    pub sort: Option<AlertSort>,
}

impl AlertParams {
    /// Parses a URL query string such as `status[]=triggered&status[]=resolved&sort=created_desc`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut statuses = Vec::new();
        let mut iid = None;
        let mut sort = None;

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "status" | "status[]" => statuses.push(value.into_owned()),
                "iid" => iid = Some(value.into_owned()),
                "sort" => sort = Some(value.into_owned()),
                other => debug!(key = other, "ignoring unrecognized alert filter"),
            }
        }

        Self::from_raw(&statuses, iid.as_deref(), sort.as_deref())
    }

    /// Builds params from already-split raw values.
    pub fn from_raw<S: AsRef<str>>(statuses: &[S], iid: Option<&str>, sort: Option<&str>) -> Self {
        Self {
            status: parse_statuses(statuses.iter().map(AsRef::as_ref)),
            iid: iid.and_then(parse_iid),
            sort: sort.and_then(|token| {
                let parsed = AlertSort::parse(token);
                if parsed.is_none() {
                    debug!(token, "ignoring unknown alert sort token");
                }
                parsed
            }),
        }
    }

    pub fn with_status(mut self, statuses: impl IntoIterator<Item = AlertStatus>) -> Self {
        let statuses: BTreeSet<_> = statuses.into_iter().collect();
        self.status = (!statuses.is_empty()).then_some(statuses);
        self
    }

    pub fn with_iid(mut self, iid: i64) -> Self {
        self.iid = Some(iid);
        self
    }

    pub fn with_sort(mut self, sort: AlertSort) -> Self {
        self.sort = Some(sort);
        self
    }
}

fn parse_statuses<'a>(tokens: impl Iterator<Item = &'a str>) -> Option<BTreeSet<AlertStatus>> {
    let mut statuses = BTreeSet::new();
    for token in tokens {
        let expanded = AlertStatus::expand_token(token);
        if expanded.is_empty() {
            debug!(token, "dropping unknown alert status");
        }
        statuses.extend(expanded.iter().copied());
    }
    (!statuses.is_empty()).then_some(statuses)
}

fn parse_iid(raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(iid) if iid > 0 => Some(iid),
        _ => {
            debug!(raw, "ignoring malformed alert iid");
            None
        }
    }
}

#[derive(Deserialize, Default)]
struct RawAlertParams {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    iid: Option<Value>,
    #[serde(default)]
    sort: Option<Value>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl From<RawAlertParams> for AlertParams {
    fn from(raw: RawAlertParams) -> Self {
        for key in raw.extra.keys() {
            debug!(key = key.as_str(), "ignoring unrecognized alert filter");
        }

        let statuses: Vec<String> = match raw.status {
            Some(Value::Array(items)) => items.into_iter().filter_map(status_token).collect(),
            Some(value) => status_token(value).into_iter().collect(),
            None => Vec::new(),
        };
        let iid = match raw.iid {
            Some(Value::Number(number)) => Some(number.to_string()),
            Some(Value::String(text)) => Some(text),
            _ => None,
        };
        let sort = match raw.sort {
            Some(Value::String(token)) => Some(token),
            _ => None,
        };

        AlertParams::from_raw(&statuses, iid.as_deref(), sort.as_deref())
    }
}

/// Status names and integer codes are tokens; other JSON values are dropped.
fn status_token(value: Value) -> Option<String> {
    match value {
        Value::String(status) => Some(status),
        Value::Number(code) => Some(code.to_string()),
        _ => None,
    }
}
