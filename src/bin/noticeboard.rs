//! noticeboard CLI: run the sweeper daemon or inspect and update a notice
//! checkpoint file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;

use noticeboard::api::{AckRequest, Api, ApiResult, ChecksParams, NoticesParams, WarningsParams};
use noticeboard::checks::CheckRegistry;
use noticeboard::config::Config;
use noticeboard::model::{CheckInfo, NoticeOptions, NoticeType};
use noticeboard::snapshot::Snapshot;
use noticeboard::store::{NoticeStore, format_template};
use noticeboard::sweeper::{Sweeper, SweeperConfig};
use noticeboard::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "noticeboard", about = "Notice and warning state engine")]
struct Cli {
    /// Notice checkpoint file (overrides NOTICEBOARD_STATE_FILE)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the expiry sweeper until Ctrl-C, checkpointing the notice set
    Serve,
    /// Record one notice occurrence
    Notify {
        /// Notice type (e.g. "custom", "change-update")
        notice_type: String,
        /// Notice key
        key: String,
        /// JSON payload
        #[arg(long)]
        data: Option<String>,
        /// Minimum seconds between surfaced repeats
        #[arg(long)]
        repeat_after: Option<u64>,
        /// Seconds after the last occurrence before the notice expires
        #[arg(long)]
        expire_after: Option<u64>,
    },
    /// Record a warning; `{}` placeholders are filled from ARGS
    Warn { template: String, args: Vec<String> },
    /// List notices
    Notices {
        /// Filter by type (repeatable, or comma-separated)
        #[arg(long = "type")]
        types: Vec<String>,
        /// Filter by key (repeatable, or comma-separated)
        #[arg(long = "key")]
        keys: Vec<String>,
        /// Only notices that last occurred after this RFC 3339 time
        #[arg(long)]
        after: Option<String>,
        /// Include expired notices not yet swept
        #[arg(long)]
        include_expired: bool,
    },
    /// List warnings
    Warnings {
        /// "all" or "pending"
        #[arg(long)]
        select: Option<String>,
    },
    /// Acknowledge warnings (kept for compatibility; acknowledges nothing)
    Okay,
    /// List health checks from a JSON results file
    Checks {
        /// File holding a JSON array of check results
        #[arg(long)]
        file: PathBuf,
        /// "alive" or "ready"
        #[arg(long)]
        level: Option<String>,
        /// Check names (repeatable, or comma-separated)
        #[arg(long = "name")]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if cli.state.is_some() {
        config.state_file = cli.state;
    }

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "noticeboard".to_string(),
        default_filter: config.log_level.clone(),
    })?;

    let store = Arc::new(NoticeStore::new(config.store_config()));
    if let Some(ref path) = config.state_file {
        if let Some(snapshot) = Snapshot::load(path)? {
            store.restore(snapshot)?;
        }
    }

    match cli.command {
        Command::Serve => cmd_serve(store, &config).await,
        Command::Notify {
            notice_type,
            key,
            data,
            repeat_after,
            expire_after,
        } => {
            let mut options = NoticeOptions::new();
            if let Some(json) = data {
                options = options.data(serde_json::from_str(&json)?);
            }
            if let Some(secs) = repeat_after {
                options = options.repeat_after(Duration::from_secs(secs));
            }
            if let Some(secs) = expire_after {
                options = options.expire_after(Duration::from_secs(secs));
            }
            let path = state_path(&config)?;
            let notice_type: NoticeType = notice_type.parse()?;
            let recorded = store.record(notice_type, key, options)?;
            store.snapshot()?.save(path)?;
            println!("{} ({})", recorded.identity, recorded.occurrence.as_str());
            Ok(())
        }
        Command::Warn { template, args } => {
            let path = state_path(&config)?;
            let recorded = store.warn(format_template(&template, &args))?;
            store.snapshot()?.save(path)?;
            println!("{} ({})", recorded.identity, recorded.occurrence.as_str());
            Ok(())
        }
        Command::Notices {
            types,
            keys,
            after,
            include_expired,
        } => {
            let api = Api::new(store, Arc::new(CheckRegistry::new()));
            print_response(api.get_notices(&NoticesParams {
                types,
                keys,
                after,
                include_expired,
            }))
        }
        Command::Warnings { select } => {
            let api = Api::new(store, Arc::new(CheckRegistry::new()));
            print_response(api.get_warnings(&WarningsParams { select }))
        }
        Command::Okay => {
            let api = Api::new(store, Arc::new(CheckRegistry::new()));
            print_response(api.ack_warnings(&AckRequest::default()))
        }
        Command::Checks { file, level, names } => {
            let checks: Vec<CheckInfo> = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let api = Api::new(store, Arc::new(CheckRegistry::from_checks(checks)));
            print_response(api.get_checks(&ChecksParams { level, names }))
        }
    }
}

async fn cmd_serve(store: Arc<NoticeStore>, config: &Config) -> anyhow::Result<()> {
    let sweeper = Sweeper::new(
        store,
        SweeperConfig {
            interval: config.sweep_interval,
            checkpoint: config.state_file.clone(),
        },
    );

    let handle = sweeper.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        handle.shutdown();
    });

    sweeper.run().await?;
    Ok(())
}

/// Commands that record notices need somewhere to keep them.
fn state_path(config: &Config) -> anyhow::Result<&Path> {
    match config.state_file {
        Some(ref path) => Ok(path.as_path()),
        None => anyhow::bail!("no state file: pass --state or set NOTICEBOARD_STATE_FILE"),
    }
}

fn print_response<T: Serialize>(result: ApiResult<T>) -> anyhow::Result<()> {
    match result {
        Ok(rsp) => {
            println!("{}", serde_json::to_string_pretty(&rsp)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.to_response())?);
            Err(anyhow::Error::new(e))
        }
    }
}
