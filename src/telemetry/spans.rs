//! Span helpers for store maintenance.

use tracing::Span;

/// Start a span for one expiry sweep.
///
/// `sweep.removed` is declared empty; fill it with [`record_sweep_result`].
pub fn start_sweep_span(notices: usize) -> Span {
    tracing::info_span!(
        "notices.sweep",
        "sweep.notices" = notices,
        "sweep.removed" = tracing::field::Empty,
    )
}

pub fn record_sweep_result(span: &Span, removed: usize) {
    span.record("sweep.removed", removed);
}
