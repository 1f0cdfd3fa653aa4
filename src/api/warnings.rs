//! `GET /warnings` and `POST /warnings`

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{Api, ApiResult, SyncResponse, observe};
use crate::model::{Warning, WarningSelection};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WarningsParams {
    #[serde(default)]
    pub select: Option<String>,
}

/// Acknowledgement body. Accepted for compatibility and otherwise ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AckRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Api {
    /// List warnings; `select` is `all` or `pending` (the default).
    pub fn get_warnings(&self, params: &WarningsParams) -> ApiResult<Vec<Warning>> {
        observe("warnings", self.get_warnings_inner(params))
    }

    fn get_warnings_inner(&self, params: &WarningsParams) -> ApiResult<Vec<Warning>> {
        let selection: WarningSelection = params.select.as_deref().unwrap_or_default().parse()?;

        let st = self.store.read()?;
        let warnings = st.warnings(selection)?;
        Ok(SyncResponse::new(warnings, &st))
    }

    /// Acknowledge warnings. Always succeeds and reports zero.
    pub fn ack_warnings(&self, body: &AckRequest) -> ApiResult<usize> {
        observe("warnings-ack", self.ack_warnings_inner(body))
    }

    fn ack_warnings_inner(&self, body: &AckRequest) -> ApiResult<usize> {
        let acked = self.store.acknowledge_warnings(body.timestamp);
        let st = self.store.read()?;
        Ok(SyncResponse::new(acked, &st))
    }
}
