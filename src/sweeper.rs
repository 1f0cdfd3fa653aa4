//! Periodic expiry sweep.
//!
//! The store never schedules its own maintenance. The sweeper ticks on an
//! interval, removes expired notices under the write lock and, if a
//! checkpoint path is set, saves the notice set afterwards.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::config::DEFAULT_SWEEP_INTERVAL;
use crate::error::Result;
use crate::store::NoticeStore;
use crate::telemetry::metrics;
use crate::telemetry::spans::{record_sweep_result, start_sweep_span};

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub interval: Duration,
    /// Where to checkpoint the notice set after each sweep and on shutdown.
    pub checkpoint: Option<PathBuf>,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            checkpoint: None,
        }
    }
}

#[derive(Clone)]
pub struct Sweeper {
    store: Arc<NoticeStore>,
    config: SweeperConfig,
    shutdown: Arc<Notify>,
}

impl Sweeper {
    pub fn new(store: Arc<NoticeStore>, config: SweeperConfig) -> Self {
        Self {
            store,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Signal the sweep loop to stop. Safe to call before `run` starts.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Run one sweep now. Returns the number of notices removed.
    pub fn sweep_once(&self) -> Result<usize> {
        let start = Instant::now();
        let removed = {
            let mut st = self.store.write()?;
            let span = start_sweep_span(st.len());
            let _enter = span.enter();
            let removed = st.expire();
            record_sweep_result(&span, removed);
            removed
        };
        metrics::sweep_duration_ms().record(start.elapsed().as_secs_f64() * 1000.0, &[]);

        if removed > 0 {
            self.checkpoint()?;
        }
        Ok(removed)
    }

    /// Save the notice set if a checkpoint path is configured.
    pub fn checkpoint(&self) -> Result<()> {
        if let Some(ref path) = self.config.checkpoint {
            let snapshot = self.store.snapshot()?;
            snapshot.save(path)?;
        }
        Ok(())
    }

    /// Sweep on every tick until shutdown, then write a final checkpoint.
    pub async fn run(&self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.config.interval.as_secs(), "sweeper started");

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("sweeper shutting down");
                    return self.checkpoint();
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once() {
                        error!("sweep error: {e}");
                    }
                }
            }
        }
    }
}
