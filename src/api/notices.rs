//! `GET /notices`

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{Api, ApiResult, SyncResponse, observe, split_list};
use crate::error::{Error, Result};
use crate::model::{Notice, NoticeFilter, NoticeType};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoticesParams {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub keys: Vec<String>,
    /// RFC 3339 lower bound (exclusive) on last occurrence.
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub include_expired: bool,
}

#[derive(Debug, Clone)]
pub struct NoticesQuery {
    pub filter: NoticeFilter,
}

impl NoticesQuery {
    pub fn parse(params: &NoticesParams) -> Result<Self> {
        let types = split_list(&params.types)
            .iter()
            .map(|t| t.parse::<NoticeType>())
            .collect::<Result<Vec<_>>>()?;
        let after = match params.after.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => Some(parse_after(s)?),
            None => None,
        };
        Ok(Self {
            filter: NoticeFilter {
                types,
                keys: split_list(&params.keys),
                identities: Vec::new(),
                after,
                include_expired: params.include_expired,
            },
        })
    }
}

fn parse_after(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| Error::InvalidFilter {
            param: "after",
            value: s.to_string(),
            accepted: "an RFC 3339 timestamp".into(),
        })
}

impl Api {
    /// List notices matching the type, key and time filters.
    pub fn get_notices(&self, params: &NoticesParams) -> ApiResult<Vec<Notice>> {
        observe("notices", self.get_notices_inner(params))
    }

    fn get_notices_inner(&self, params: &NoticesParams) -> ApiResult<Vec<Notice>> {
        let query = NoticesQuery::parse(params)?;
        let st = self.store.read()?;
        let notices = st.notices(&query.filter);
        Ok(SyncResponse::new(notices, &st))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lists_and_timestamp() {
        let query = NoticesQuery::parse(&NoticesParams {
            types: vec!["warning,custom".into()],
            keys: vec!["a".into(), "b".into()],
            after: Some("2024-01-01T10:00:00+02:00".into()),
            include_expired: false,
        })
        .unwrap();
        assert_eq!(query.filter.types, [NoticeType::Warning, NoticeType::Custom]);
        assert_eq!(query.filter.keys, ["a", "b"]);
        assert_eq!(
            query.filter.after.unwrap(),
            "2024-01-01T08:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn bad_timestamp_is_validation_error() {
        let err = NoticesQuery::parse(&NoticesParams {
            after: Some("yesterday".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("yesterday"));
    }
}
