//! `GET /checks`

use serde::Deserialize;

use super::{Api, ApiError, ApiResult, SyncResponse, observe, split_list};
use crate::checks::filter_checks;
use crate::error::Result;
use crate::model::{CheckInfo, CheckLevel};

/// Raw query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChecksParams {
    #[serde(default)]
    pub level: Option<String>,
    /// Repeated and/or comma-separated names.
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksQuery {
    pub level: CheckLevel,
    pub names: Vec<String>,
}

impl ChecksQuery {
    pub fn parse(params: &ChecksParams) -> Result<Self> {
        Ok(Self {
            level: params.level.as_deref().unwrap_or_default().parse()?,
            names: split_list(&params.names),
        })
    }
}

impl Api {
    /// List health checks matching the level and name filters.
    pub fn get_checks(&self, params: &ChecksParams) -> ApiResult<Vec<CheckInfo>> {
        observe("checks", self.get_checks_inner(params))
    }

    fn get_checks_inner(&self, params: &ChecksParams) -> ApiResult<Vec<CheckInfo>> {
        let query = ChecksQuery::parse(params)?;
        let checks = self.checks.checks().map_err(|e| ApiError::InternalError(e.to_string()))?;
        let infos = filter_checks(checks, query.level, &query.names);

        let st = self.store.read()?;
        Ok(SyncResponse::new(infos, &st))
    }
}
