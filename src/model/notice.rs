//! Notices: the generic, deduplicated occurrence record.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Notice Type
// ---------------------------------------------------------------------------

/// Category of a notice.
///
/// Producers may use their own categories; those parse into `Other`.
/// Category names are lowercase ASCII letters, digits and dashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum NoticeType {
    /// A change was updated (status or progress).
    ChangeUpdate,
    /// A client-reported notice.
    Custom,
    /// A warning message for the operator.
    Warning,
    /// Any other producer-defined category.
    Other(String),
}

impl NoticeType {
    pub fn as_str(&self) -> &str {
        match self {
            NoticeType::ChangeUpdate => "change-update",
            NoticeType::Custom => "custom",
            NoticeType::Warning => "warning",
            NoticeType::Other(s) => s,
        }
    }

    /// Re-parse into canonical form, so `Other("warning")` becomes `Warning`.
    pub(crate) fn normalized(&self) -> Result<NoticeType> {
        self.as_str().parse()
    }
}

impl FromStr for NoticeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidIdentity("notice type must not be empty".into()));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(Error::InvalidIdentity(format!(
                "notice type {s:?} must contain only lowercase letters, digits and dashes"
            )));
        }
        Ok(match s {
            "change-update" => NoticeType::ChangeUpdate,
            "custom" => NoticeType::Custom,
            "warning" => NoticeType::Warning,
            other => NoticeType::Other(other.to_string()),
        })
    }
}

impl TryFrom<String> for NoticeType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<NoticeType> for String {
    fn from(t: NoticeType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for NoticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable dedup key derived from (type, key).
///
/// Ordering is by type name, then key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoticeIdentity {
    #[serde(rename = "type")]
    notice_type: String,
    key: String,
}

impl NoticeIdentity {
    pub fn new(notice_type: &NoticeType, key: impl Into<String>) -> Self {
        Self {
            notice_type: notice_type.as_str().to_string(),
            key: key.into(),
        }
    }

    pub fn notice_type(&self) -> &str {
        &self.notice_type
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for NoticeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.notice_type, self.key)
    }
}

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// A deduplicated, timestamped record of a recurring event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Notice {
    #[serde(rename = "type")]
    pub notice_type: NoticeType,

    /// Producer-supplied key identifying the logical event.
    pub key: String,

    /// Set once at creation.
    pub first_occurred: DateTime<Utc>,

    /// Advances on every observation.
    pub last_occurred: DateTime<Utc>,

    /// Advances only when an observation counts as a fresh repeat.
    pub last_repeated: DateTime<Utc>,

    /// Total number of observations.
    pub occurrences: u64,

    /// Minimum interval since `last_repeated` before an observation is a fresh repeat.
    pub repeat_after: Duration,

    /// Age past `last_occurred` after which the notice expires.
    pub expire_after: Duration,

    /// Payload from the most recent observation that carried one. Opaque.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl Notice {
    pub(crate) fn new(
        notice_type: NoticeType,
        key: String,
        now: DateTime<Utc>,
        repeat_after: Duration,
        expire_after: Duration,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            notice_type,
            key,
            first_occurred: now,
            last_occurred: now,
            last_repeated: now,
            occurrences: 1,
            repeat_after,
            expire_after,
            data: data.unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn identity(&self) -> NoticeIdentity {
        NoticeIdentity::new(&self.notice_type, self.key.clone())
    }

    /// Expired once `now - last_occurred` exceeds `expire_after`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_occurred) > delta(self.expire_after)
    }

    /// Whether the latest observation counted as a fresh repeat.
    pub fn is_pending(&self) -> bool {
        self.last_repeated == self.last_occurred
    }

    /// Register another observation. Returns true if it counts as a fresh repeat.
    ///
    /// `now` is clamped to `last_occurred` so a clock stepping backwards cannot
    /// break timestamp ordering.
    pub(crate) fn reoccur(&mut self, now: DateTime<Utc>, options: &NoticeOptions) -> bool {
        let now = now.max(self.last_occurred);

        if let Some(repeat_after) = options.repeat_after {
            self.repeat_after = repeat_after;
        }
        if let Some(expire_after) = options.expire_after {
            self.expire_after = expire_after;
        }
        if let Some(ref data) = options.data {
            self.data = data.clone();
        }

        self.last_occurred = now;
        self.occurrences = self.occurrences.saturating_add(1);

        let repeated = now.signed_duration_since(self.last_repeated) >= delta(self.repeat_after);
        if repeated {
            self.last_repeated = now;
        }
        repeated
    }

    /// Check the structural invariants every stored notice must satisfy.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.key.trim().is_empty() {
            return Err("empty key".into());
        }
        if self.occurrences == 0 {
            return Err("zero occurrences".into());
        }
        if !(self.first_occurred <= self.last_repeated && self.last_repeated <= self.last_occurred)
        {
            return Err(format!(
                "timestamps out of order: first-occurred {}, last-repeated {}, last-occurred {}",
                self.first_occurred, self.last_repeated, self.last_occurred
            ));
        }
        Ok(())
    }
}

/// Saturating conversion; an interval too large for `TimeDelta` never elapses.
pub(crate) fn delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-observation options for recording a notice.
#[derive(Debug, Clone, Default)]
pub struct NoticeOptions {
    pub(crate) repeat_after: Option<Duration>,
    pub(crate) expire_after: Option<Duration>,
    pub(crate) data: Option<serde_json::Value>,
}

impl NoticeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repeat_after(mut self, interval: Duration) -> Self {
        self.repeat_after = Some(interval);
        self
    }

    pub fn expire_after(mut self, age: Duration) -> Self {
        self.expire_after = Some(age);
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Query filter. Fields combine with AND; values within a field with OR.
/// Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct NoticeFilter {
    pub types: Vec<NoticeType>,
    pub keys: Vec<String>,
    pub identities: Vec<NoticeIdentity>,
    /// Only notices whose `last_occurred` is strictly after this instant.
    pub after: Option<DateTime<Utc>>,
    pub include_expired: bool,
}

impl NoticeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notice_type(mut self, notice_type: NoticeType) -> Self {
        self.types.push(notice_type);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn identity(mut self, identity: NoticeIdentity) -> Self {
        self.identities.push(identity);
        self
    }

    pub fn after(mut self, after: DateTime<Utc>) -> Self {
        self.after = Some(after);
        self
    }

    pub fn include_expired(mut self) -> Self {
        self.include_expired = true;
        self
    }

    /// Field matching only; expiry is decided by the store, which knows "now".
    pub fn matches(&self, notice: &Notice) -> bool {
        let type_match = self.types.is_empty()
            || self
                .types
                .iter()
                .any(|t| t.as_str() == notice.notice_type.as_str());
        let key_match = self.keys.is_empty() || self.keys.iter().any(|k| *k == notice.key);
        let identity_match = self.identities.is_empty()
            || self.identities.iter().any(|id| {
                id.notice_type() == notice.notice_type.as_str() && id.key() == notice.key
            });
        let after_match = self.after.is_none_or(|after| notice.last_occurred > after);
        type_match && key_match && identity_match && after_match
    }
}
