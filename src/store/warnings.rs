//! Warning compatibility layer.
//!
//! Warnings are recorded as `warning` notices with warning-specific repeat and
//! expiry defaults, and projected back into the legacy [`Warning`] shape when
//! listed.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::{NoticeStore, Recorded, StoreReader, StoreWriter};
use crate::error::Result;
use crate::model::*;

/// A warning is surfaced again at most once a day.
pub const DEFAULT_WARNING_REPEAT_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// Warnings not seen for four weeks are forgotten.
pub const DEFAULT_WARNING_EXPIRE_AFTER: Duration = Duration::from_secs(28 * 24 * 60 * 60);

/// Fill `{}` placeholders in `template` with `args`, in order.
///
/// With no arguments the template is the message, verbatim.
pub fn format_template(template: &str, args: &[String]) -> String {
    if args.is_empty() {
        return template.to_string();
    }
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(arg),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

fn warning_options() -> NoticeOptions {
    NoticeOptions::new()
        .repeat_after(DEFAULT_WARNING_REPEAT_AFTER)
        .expire_after(DEFAULT_WARNING_EXPIRE_AFTER)
}

fn warnings_on(notices: Vec<Notice>, selection: WarningSelection) -> Result<Vec<Warning>> {
    notices
        .iter()
        .filter(|n| selection == WarningSelection::All || n.is_pending())
        .map(Warning::try_from)
        .collect()
}

fn warning_filter() -> NoticeFilter {
    NoticeFilter::new().notice_type(NoticeType::Warning)
}

impl StoreWriter<'_> {
    /// Record a warning message.
    ///
    /// Over-long messages are rejected like any other over-long key; they are
    /// not truncated.
    pub fn warn(&mut self, message: impl Into<String>) -> Result<Recorded> {
        let message = message.into();
        self.record(NoticeType::Warning, message, warning_options())
            .inspect_err(|e| warn!(error = %e, "warning not recorded"))
    }

    /// Record a warning from format arguments; see [`warnf!`](crate::warnf).
    pub fn warnf(&mut self, args: fmt::Arguments<'_>) -> Result<Recorded> {
        let message = match args.as_str() {
            Some(s) => s.to_string(),
            None => args.to_string(),
        };
        self.warn(message)
    }

    pub fn warnings(&self, selection: WarningSelection) -> Result<Vec<Warning>> {
        warnings_on(self.notices(&warning_filter()), selection)
    }
}

impl StoreReader<'_> {
    /// Non-expired warnings, projected into the legacy shape.
    ///
    /// A notice that cannot be projected is an internal error.
    pub fn warnings(&self, selection: WarningSelection) -> Result<Vec<Warning>> {
        warnings_on(self.notices(&warning_filter()), selection)
    }

    /// Count of warnings ready to show and the latest one's timestamp.
    ///
    /// Summary counting is disabled in favour of notice queries; this always
    /// reports no warnings.
    pub fn warnings_summary(&self) -> (usize, Option<DateTime<Utc>>) {
        (0, None)
    }
}

impl NoticeStore {
    /// Record a warning message, taking the write lock.
    pub fn warn(&self, message: impl Into<String>) -> Result<Recorded> {
        self.write()?.warn(message)
    }

    pub fn warnings(&self, selection: WarningSelection) -> Result<Vec<Warning>> {
        self.read()?.warnings(selection)
    }

    /// Acknowledge warnings. Acknowledgement is no longer tracked: this leaves
    /// the store alone and always reports zero acknowledged.
    pub fn acknowledge_warnings(&self, _up_to: Option<DateTime<Utc>>) -> usize {
        0
    }
}

/// Record a warning with `format!`-style arguments on a [`StoreWriter`].
///
/// ```ignore
/// let mut st = store.write()?;
/// warnf!(st, "cannot start service {}: {}", name, err)?;
/// ```
#[macro_export]
macro_rules! warnf {
    ($writer:expr, $($arg:tt)+) => {
        $writer.warnf(::std::format_args!($($arg)+))
    };
}
