//! Health check results, as reported by the check runner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which probe a check feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CheckLevel {
    #[default]
    Unset,
    Alive,
    Ready,
}

impl CheckLevel {
    pub const ACCEPTED: &'static [&'static str] = &["alive", "ready"];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckLevel::Unset => "",
            CheckLevel::Alive => "alive",
            CheckLevel::Ready => "ready",
        }
    }

    pub fn is_unset(&self) -> bool {
        *self == CheckLevel::Unset
    }
}

impl FromStr for CheckLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Ok(CheckLevel::Unset),
            "alive" => Ok(CheckLevel::Alive),
            "ready" => Ok(CheckLevel::Ready),
            other => Err(Error::invalid_filter("level", other, Self::ACCEPTED)),
        }
    }
}

impl TryFrom<String> for CheckLevel {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<CheckLevel> for String {
    fn from(level: CheckLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of one health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "CheckLevel::is_unset")]
    pub level: CheckLevel,
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub failures: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_details: String,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}
