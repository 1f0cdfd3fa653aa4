//! API-facing adapter.
//!
//! Turns raw query parameters into validated store/check queries, runs them
//! under the store lock and wraps the results in the daemon's sync response
//! envelope. Transport (HTTP routing, sockets) lives outside this crate.

mod checks;
mod error;
mod notices;
mod warnings;

pub use checks::{ChecksParams, ChecksQuery};
pub use error::{ApiError, ErrorResponse, ErrorResult};
pub use notices::{NoticesParams, NoticesQuery};
pub use warnings::{AckRequest, WarningsParams};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use serde::Serialize;
use tracing::warn;

use crate::checks::CheckSource;
use crate::store::{NoticeStore, StoreReader};
use crate::telemetry::metrics;

pub type ApiResult<T> = std::result::Result<SyncResponse<T>, ApiError>;

/// A successful response, carrying the warning summary alongside the result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SyncResponse<T> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status_code: u16,
    pub status: &'static str,
    pub result: T,
    #[serde(skip_serializing_if = "is_zero")]
    pub warning_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_timestamp: Option<DateTime<Utc>>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl<T> SyncResponse<T> {
    fn new(result: T, st: &StoreReader<'_>) -> Self {
        let (warning_count, warning_timestamp) = st.warnings_summary();
        Self {
            kind: "sync",
            status_code: 200,
            status: "OK",
            result,
            warning_count,
            warning_timestamp,
        }
    }
}

/// Request handlers over a notice store and a check source.
#[derive(Clone)]
pub struct Api {
    store: Arc<NoticeStore>,
    checks: Arc<dyn CheckSource>,
}

impl Api {
    pub fn new(store: Arc<NoticeStore>, checks: Arc<dyn CheckSource>) -> Self {
        Self { store, checks }
    }

    pub fn store(&self) -> &Arc<NoticeStore> {
        &self.store
    }
}

/// Split comma-separated values and drop empties.
pub(crate) fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Count the request and log rejected ones.
pub(crate) fn observe<T>(endpoint: &'static str, result: ApiResult<T>) -> ApiResult<T> {
    let status = match &result {
        Ok(rsp) => rsp.status_code,
        Err(e) => {
            warn!(endpoint, status = e.status_code(), error = %e.message(), "request rejected");
            e.status_code()
        }
    };
    metrics::api_requests().add(
        1,
        &[
            KeyValue::new("endpoint", endpoint),
            KeyValue::new("status", i64::from(status)),
        ],
    );
    result
}
