//! Metric instrument factories.
//!
//! Instruments come from the `"noticeboard"` meter on the globally registered
//! `MeterProvider`; without one they are no-ops.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("noticeboard")
}

/// Counter: notice observations.
/// Labels: `type`, `result` ("new" | "repeat" | "absorbed").
pub fn notices_recorded() -> Counter<u64> {
    meter()
        .u64_counter("noticeboard.notices.recorded")
        .with_description("Number of notice observations recorded")
        .build()
}

/// Counter: notices removed by the expiry sweep.
pub fn notices_expired() -> Counter<u64> {
    meter()
        .u64_counter("noticeboard.notices.expired")
        .with_description("Number of notices removed after expiring")
        .build()
}

/// Counter: API requests handled.
/// Labels: `endpoint`, `status`.
pub fn api_requests() -> Counter<u64> {
    meter()
        .u64_counter("noticeboard.api.requests")
        .with_description("Number of API requests handled")
        .build()
}

/// Histogram: expiry sweep duration in milliseconds.
pub fn sweep_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("noticeboard.sweep.duration_ms")
        .with_description("Expiry sweep duration in milliseconds")
        .with_unit("ms")
        .build()
}
