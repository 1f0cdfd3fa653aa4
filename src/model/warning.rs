//! Legacy warning view over `warning` notices.
//!
//! Warnings are no longer stored on their own. They are projected from
//! notices on the read path; the store never writes this shape.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::notice::{Notice, NoticeType};

/// Backward-compatible projection of a `warning` notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Warning {
    pub message: String,
    pub first_added: DateTime<Utc>,
    pub last_added: DateTime<Utc>,
    #[serde(with = "duration_string")]
    pub expire_after: Duration,
    #[serde(with = "duration_string")]
    pub repeat_after: Duration,
}

impl TryFrom<&Notice> for Warning {
    type Error = Error;

    fn try_from(notice: &Notice) -> Result<Self> {
        let fail = |reason: String| Error::Conversion {
            identity: notice.identity().to_string(),
            reason,
        };
        if notice.notice_type != NoticeType::Warning {
            return Err(fail(format!(
                "expected a warning notice, got type {:?}",
                notice.notice_type.as_str()
            )));
        }
        notice.validate().map_err(fail)?;

        Ok(Warning {
            message: notice.key.clone(),
            first_added: notice.first_occurred,
            last_added: notice.last_occurred,
            expire_after: notice.expire_after,
            repeat_after: notice.repeat_after,
        })
    }
}

// ---------------------------------------------------------------------------
// Duration strings
// ---------------------------------------------------------------------------

/// Legacy clients read intervals as duration strings such as `"672h0m0s"`.
mod duration_string {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    const NANOS_PER_SEC: u128 = 1_000_000_000;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    /// `1h2m3.5s`, `1m30s`, `45s`, `250ms`, `0s`.
    pub(super) fn format(duration: Duration) -> String {
        let nanos = duration.as_nanos();
        if nanos == 0 {
            return "0s".to_string();
        }
        if nanos < 1_000 {
            return format!("{nanos}ns");
        }
        if nanos < 1_000_000 {
            return format!("{}µs", fraction(nanos, 1_000));
        }
        if nanos < NANOS_PER_SEC {
            return format!("{}ms", fraction(nanos, 1_000_000));
        }

        let secs = duration.as_secs();
        let (hours, minutes) = (secs / 3600, secs % 3600 / 60);
        let sub_minute = u128::from(secs % 60) * NANOS_PER_SEC + u128::from(duration.subsec_nanos());
        let seconds = fraction(sub_minute, NANOS_PER_SEC);
        if hours > 0 {
            format!("{hours}h{minutes}m{seconds}s")
        } else if minutes > 0 {
            format!("{minutes}m{seconds}s")
        } else {
            format!("{seconds}s")
        }
    }

    /// `value / unit` as a decimal with trailing zeros dropped.
    fn fraction(value: u128, unit: u128) -> String {
        let (whole, rest) = (value / unit, value % unit);
        if rest == 0 {
            return whole.to_string();
        }
        let width = unit.ilog10() as usize;
        let digits = format!("{rest:0width$}");
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }

    pub(super) fn parse(raw: &str) -> Result<Duration, String> {
        let invalid = || format!("invalid duration {raw:?}");
        if raw == "0" {
            return Ok(Duration::ZERO);
        }
        if raw.is_empty() {
            return Err(invalid());
        }
        let mut rest = raw;
        let mut total: u128 = 0;
        while !rest.is_empty() {
            let number_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or_else(invalid)?;
            let (number, tail) = rest.split_at(number_len);
            let unit_len = tail
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_len);
            let scale: u128 = match unit {
                "ns" => 1,
                "us" | "µs" => 1_000,
                "ms" => 1_000_000,
                "s" => NANOS_PER_SEC,
                "m" => 60 * NANOS_PER_SEC,
                "h" => 3600 * NANOS_PER_SEC,
                _ => return Err(invalid()),
            };
            let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
            if whole.is_empty() && frac.is_empty() {
                return Err(invalid());
            }
            let whole: u128 = if whole.is_empty() {
                0
            } else {
                whole.parse().map_err(|_| invalid())?
            };
            let mut part = whole.checked_mul(scale).ok_or_else(invalid)?;
            if !frac.is_empty() {
                let frac = &frac[..frac.len().min(18)];
                let digits: u128 = frac.parse().map_err(|_| invalid())?;
                part += digits * scale / 10u128.pow(frac.len() as u32);
            }
            total = total.checked_add(part).ok_or_else(invalid)?;
            rest = tail;
        }

        let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid())?;
        Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Which warnings to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSelection {
    /// Every non-expired warning.
    All,
    /// Warnings whose latest observation counted as a fresh repeat.
    #[default]
    Pending,
}

impl WarningSelection {
    pub const ACCEPTED: &'static [&'static str] = &["all", "pending"];
}

impl FromStr for WarningSelection {
    type Err = Error;

    /// An empty value selects the default, `pending`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(WarningSelection::All),
            "pending" | "" => Ok(WarningSelection::Pending),
            other => Err(Error::invalid_filter("select", other, Self::ACCEPTED)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning_notice() -> Notice {
        let now: DateTime<Utc> = "2024-03-01T12:00:00Z".parse().unwrap();
        Notice::new(
            NoticeType::Warning,
            "disk full".into(),
            now,
            Duration::from_secs(24 * 3600),
            Duration::from_secs(28 * 24 * 3600),
            None,
        )
    }

    #[test]
    fn projects_fields() {
        let notice = warning_notice();
        let warning = Warning::try_from(&notice).unwrap();
        assert_eq!(warning.message, "disk full");
        assert_eq!(warning.first_added, notice.first_occurred);
        assert_eq!(warning.last_added, notice.last_occurred);
        assert_eq!(warning.repeat_after, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn rejects_other_types() {
        let mut notice = warning_notice();
        notice.notice_type = NoticeType::ChangeUpdate;
        let err = Warning::try_from(&notice).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn rejects_inconsistent_timestamps() {
        let mut notice = warning_notice();
        notice.first_occurred = notice.last_occurred + chrono::TimeDelta::seconds(1);
        let err = Warning::try_from(&notice).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
        assert!(!err.is_validation());
    }

    #[test]
    fn intervals_serialize_as_duration_strings() {
        let warning = Warning::try_from(&warning_notice()).unwrap();
        let encoded = serde_json::to_value(&warning).unwrap();
        assert_eq!(encoded["repeat-after"], "24h0m0s");
        assert_eq!(encoded["expire-after"], "672h0m0s");
        assert_eq!(encoded["first-added"], "2024-03-01T12:00:00Z");

        let decoded: Warning = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, warning);
    }

    #[test]
    fn duration_string_forms() {
        use duration_string::{format, parse};

        assert_eq!(format(Duration::ZERO), "0s");
        assert_eq!(format(Duration::from_secs(90)), "1m30s");
        assert_eq!(format(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format(Duration::from_millis(250)), "250ms");
        assert_eq!(format(Duration::from_secs(3723)), "1h2m3s");

        assert_eq!(parse("1h2m3s").unwrap(), Duration::from_secs(3723));
        assert_eq!(parse("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse("0").unwrap(), Duration::ZERO);
        assert!(parse("").is_err());
        assert!(parse("10").is_err());
        assert!(parse("5 days").is_err());
    }

    #[test]
    fn selection_parsing() {
        assert_eq!("".parse::<WarningSelection>().unwrap(), WarningSelection::Pending);
        assert_eq!("all".parse::<WarningSelection>().unwrap(), WarningSelection::All);
        let err = "bogus".parse::<WarningSelection>().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("\"all\" or \"pending\""));
    }
}
