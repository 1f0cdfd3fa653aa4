//! In-memory notice store.
//!
//! Single source of truth for notice state. One reader/writer lock covers the
//! whole set: mutation goes through a [`StoreWriter`], multi-step reads through
//! a [`StoreReader`]. The notice map is only reachable through those guards,
//! so a read without the lock held does not compile.

mod warnings;

pub use warnings::{
    DEFAULT_WARNING_EXPIRE_AFTER, DEFAULT_WARNING_REPEAT_AFTER, format_template,
};

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::model::*;
use crate::snapshot::Snapshot;
use crate::telemetry::metrics;

/// Longest accepted notice key, in bytes.
pub const MAX_NOTICE_KEY_LENGTH: usize = 256;

/// Expiry applied to notices recorded without an explicit `expire_after`.
pub const DEFAULT_NOTICE_EXPIRE_AFTER: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Engine defaults and limits.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub max_key_length: usize,
    /// Zero means every observation is a fresh repeat.
    pub default_repeat_after: Duration,
    pub default_expire_after: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_key_length: MAX_NOTICE_KEY_LENGTH,
            default_repeat_after: Duration::ZERO,
            default_expire_after: DEFAULT_NOTICE_EXPIRE_AFTER,
        }
    }
}

// ---------------------------------------------------------------------------
// Record outcome
// ---------------------------------------------------------------------------

/// How an observation was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// First observation of this identity.
    New,
    /// Repeat observation that passed the repeat-after throttle.
    Repeated,
    /// Repeat observation absorbed by the throttle.
    Absorbed,
}

impl Occurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Occurrence::New => "new",
            Occurrence::Repeated => "repeat",
            Occurrence::Absorbed => "absorbed",
        }
    }
}

/// What happened when a notice was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub identity: NoticeIdentity,
    pub occurrence: Occurrence,
}

impl Recorded {
    pub fn is_new(&self) -> bool {
        self.occurrence == Occurrence::New
    }

    /// New or throttled-through repeat: callers that surface repeats act on this.
    pub fn is_fresh(&self) -> bool {
        self.occurrence != Occurrence::Absorbed
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

type Notices = BTreeMap<NoticeIdentity, Notice>;

/// The notice store. Share it behind an `Arc`; all access takes the lock.
pub struct NoticeStore {
    notices: RwLock<Notices>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
}

/// Shared access to the notice set.
pub struct StoreReader<'a> {
    notices: RwLockReadGuard<'a, Notices>,
    store: &'a NoticeStore,
}

/// Exclusive access to the notice set.
pub struct StoreWriter<'a> {
    notices: RwLockWriteGuard<'a, Notices>,
    store: &'a NoticeStore,
}

impl NoticeStore {
    /// Create a store using wall-clock time.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            notices: RwLock::new(BTreeMap::new()),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Acquire the lock for reading.
    pub fn read(&self) -> Result<StoreReader<'_>> {
        let notices = self
            .notices
            .read()
            .map_err(|e| Error::LockPoisoned(e.to_string()))?;
        Ok(StoreReader {
            notices,
            store: self,
        })
    }

    /// Acquire the lock for writing.
    pub fn write(&self) -> Result<StoreWriter<'_>> {
        let notices = self
            .notices
            .write()
            .map_err(|e| Error::LockPoisoned(e.to_string()))?;
        Ok(StoreWriter {
            notices,
            store: self,
        })
    }

    // -----------------------------------------------------------------------
    // Single-call conveniences: each takes and releases the lock.
    // -----------------------------------------------------------------------

    /// Record one observation of (type, key).
    pub fn record(
        &self,
        notice_type: NoticeType,
        key: impl Into<String>,
        options: NoticeOptions,
    ) -> Result<Recorded> {
        self.write()?.record(notice_type, key, options)
    }

    /// Notices matching `filter`, ordered by last occurrence.
    pub fn notices(&self, filter: &NoticeFilter) -> Result<Vec<Notice>> {
        Ok(self.read()?.notices(filter))
    }

    /// Remove expired notices. Returns how many were removed.
    pub fn expire(&self) -> Result<usize> {
        Ok(self.write()?.expire())
    }

    /// Copy of every stored notice, expired or not.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.read()?.snapshot())
    }

    /// Replace the whole notice set from a checkpoint.
    pub fn restore(&self, snapshot: Snapshot) -> Result<usize> {
        self.write()?.restore(snapshot)
    }
}

impl std::fmt::Debug for NoticeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StoreReader<'_> {
    pub fn notices(&self, filter: &NoticeFilter) -> Vec<Notice> {
        query_on(&self.notices, filter, self.store.now())
    }

    /// Look up one notice. Expired notices are not returned.
    pub fn notice(&self, identity: &NoticeIdentity) -> Option<Notice> {
        get_on(&self.notices, identity, self.store.now())
    }

    /// Number of stored notices, including expired ones awaiting the sweep.
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        snapshot_on(&self.notices)
    }
}

impl StoreWriter<'_> {
    /// Record one observation of (type, key).
    ///
    /// Creates the notice on first observation; otherwise bumps its count and
    /// last occurrence, and advances `last_repeated` once `repeat_after` has
    /// elapsed since the previous fresh repeat.
    pub fn record(
        &mut self,
        notice_type: NoticeType,
        key: impl Into<String>,
        options: NoticeOptions,
    ) -> Result<Recorded> {
        let key = key.into();
        let notice_type = validate_identity(&self.store.config, &notice_type, &key)?;
        let now = self.store.now();
        let identity = NoticeIdentity::new(&notice_type, key.clone());

        // Expired notices the sweep has not reached yet are updated in place;
        // only the sweep removes notices.
        let occurrence = if let Some(existing) = self.notices.get_mut(&identity) {
            if existing.reoccur(now, &options) {
                Occurrence::Repeated
            } else {
                Occurrence::Absorbed
            }
        } else {
            let config = &self.store.config;
            let notice = Notice::new(
                notice_type.clone(),
                key,
                now,
                options.repeat_after.unwrap_or(config.default_repeat_after),
                options.expire_after.unwrap_or(config.default_expire_after),
                options.data,
            );
            self.notices.insert(identity.clone(), notice);
            Occurrence::New
        };

        debug!(
            notice = %identity,
            occurrence = occurrence.as_str(),
            "notice recorded"
        );
        metrics::notices_recorded().add(
            1,
            &[
                KeyValue::new("type", notice_type.as_str().to_string()),
                KeyValue::new("result", occurrence.as_str()),
            ],
        );

        Ok(Recorded {
            identity,
            occurrence,
        })
    }

    pub fn notices(&self, filter: &NoticeFilter) -> Vec<Notice> {
        query_on(&self.notices, filter, self.store.now())
    }

    pub fn notice(&self, identity: &NoticeIdentity) -> Option<Notice> {
        get_on(&self.notices, identity, self.store.now())
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Remove every notice whose last occurrence is older than its
    /// `expire_after`. This is the only way notices leave the store.
    pub fn expire(&mut self) -> usize {
        let now = self.store.now();
        let before = self.notices.len();
        self.notices.retain(|identity, notice| {
            let expired = notice.is_expired(now);
            if expired {
                debug!(notice = %identity, last_occurred = %notice.last_occurred, "notice expired");
            }
            !expired
        });
        let removed = before - self.notices.len();
        if removed > 0 {
            info!(removed, remaining = self.notices.len(), "expired notices removed");
            metrics::notices_expired().add(removed as u64, &[]);
        }
        removed
    }

    pub fn snapshot(&self) -> Snapshot {
        snapshot_on(&self.notices)
    }

    /// Replace the notice set with the contents of a checkpoint.
    ///
    /// Every record is validated first; on error the current set is untouched.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<usize> {
        let mut restored = Notices::new();
        for mut notice in snapshot.notices {
            notice.notice_type =
                validate_identity(&self.store.config, &notice.notice_type, &notice.key)?;
            let identity = notice.identity();
            notice.validate().map_err(|reason| Error::Conversion {
                identity: identity.to_string(),
                reason,
            })?;
            if restored.insert(identity.clone(), notice).is_some() {
                return Err(Error::Conversion {
                    identity: identity.to_string(),
                    reason: "duplicate notice in snapshot".into(),
                });
            }
        }
        let count = restored.len();
        *self.notices = restored;
        info!(count, "notices restored");
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Inner functions, shared by both guards.
// ---------------------------------------------------------------------------

fn validate_identity(config: &StoreConfig, notice_type: &NoticeType, key: &str) -> Result<NoticeType> {
    let notice_type = notice_type.normalized()?;
    if key.trim().is_empty() {
        return Err(Error::InvalidIdentity("notice key must not be empty".into()));
    }
    if key.len() > config.max_key_length {
        return Err(Error::InvalidIdentity(format!(
            "notice key is {} bytes, maximum is {}",
            key.len(),
            config.max_key_length
        )));
    }
    Ok(notice_type)
}

fn query_on(notices: &Notices, filter: &NoticeFilter, now: DateTime<Utc>) -> Vec<Notice> {
    let mut result: Vec<Notice> = notices
        .values()
        .filter(|n| filter.include_expired || !n.is_expired(now))
        .filter(|n| filter.matches(n))
        .cloned()
        .collect();
    result.sort_by(|a, b| {
        a.last_occurred
            .cmp(&b.last_occurred)
            .then_with(|| a.identity().cmp(&b.identity()))
    });
    result
}

fn get_on(notices: &Notices, identity: &NoticeIdentity, now: DateTime<Utc>) -> Option<Notice> {
    notices
        .get(identity)
        .filter(|n| !n.is_expired(now))
        .cloned()
}

fn snapshot_on(notices: &Notices) -> Snapshot {
    Snapshot {
        notices: notices.values().cloned().collect(),
    }
}
