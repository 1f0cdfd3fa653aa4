//! # noticeboard
//!
//! Notice and warning state engine for a service manager daemon.
//!
//! Records recurring operational signals as deduplicated notices, throttles
//! how often repeats are surfaced, ages them out, and answers filtered
//! queries, including the legacy warning view and health check listings.

pub mod api;
pub mod checks;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod snapshot;
pub mod store;
pub mod sweeper;
pub mod telemetry;
