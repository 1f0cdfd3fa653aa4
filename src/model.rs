//! Core data model.
//!
//! A notice is a deduplicated record of something that keeps happening. It has
//! identity (type + key), occurrence timestamps, and the throttling/expiry
//! intervals that govern how repeats are surfaced and when it is forgotten.

pub mod check;
pub mod notice;
pub mod warning;

pub use check::{CheckInfo, CheckLevel};
pub use notice::{Notice, NoticeFilter, NoticeIdentity, NoticeOptions, NoticeType};
pub use warning::{Warning, WarningSelection};
