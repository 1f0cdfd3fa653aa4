//! Health check results consumed by the API.
//!
//! The check runner owns check execution and state; this module only defines
//! the boundary it reports through and the level/name filtering applied on
//! top of its unfiltered snapshot.

use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::{CheckInfo, CheckLevel};

/// Source of the current health check results. Returns every check; it does
/// no filtering of its own.
pub trait CheckSource: Send + Sync {
    fn checks(&self) -> Result<Vec<CheckInfo>>;
}

/// Keep checks matching `level` (unless unset) and `names` (unless empty),
/// preserving the source's order.
pub fn filter_checks(checks: Vec<CheckInfo>, level: CheckLevel, names: &[String]) -> Vec<CheckInfo> {
    checks
        .into_iter()
        .filter(|check| level.is_unset() || check.level == level)
        .filter(|check| names.is_empty() || names.iter().any(|n| *n == check.name))
        .collect()
}

/// In-memory check results, updated by whoever runs the checks.
#[derive(Debug, Default)]
pub struct CheckRegistry {
    checks: RwLock<Vec<CheckInfo>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_checks(checks: Vec<CheckInfo>) -> Self {
        Self {
            checks: RwLock::new(checks),
        }
    }

    /// Insert or replace the result for `info.name`.
    pub fn update(&self, info: CheckInfo) -> Result<()> {
        let mut checks = self
            .checks
            .write()
            .map_err(|e| Error::LockPoisoned(e.to_string()))?;
        match checks.iter_mut().find(|c| c.name == info.name) {
            Some(existing) => *existing = info,
            None => checks.push(info),
        }
        Ok(())
    }
}

impl CheckSource for CheckRegistry {
    fn checks(&self) -> Result<Vec<CheckInfo>> {
        let checks = self
            .checks
            .read()
            .map_err(|e| Error::LockPoisoned(e.to_string()))?;
        Ok(checks.clone())
    }
}
