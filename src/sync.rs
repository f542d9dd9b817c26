//! Sync run orchestration.
//!
//! A run walks the feeds in order (products, inventory, prices). A failed pass
//! is logged and recorded in the [`SyncReport`]; it never stops the next pass.
//! Only errors outside the passes (feed download) abort the run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};

use crate::config::SyncConfig;
use crate::database_ops::db::Db;
use crate::database_ops::reconcile::{self, PassError, PassReport};
use crate::feeds::{source, FeedKind};

pub type PassOutcome = Result<PassReport, PassError>;

#[derive(Debug)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub passes: Vec<(FeedKind, PassOutcome)>,
}

impl SyncReport {
    pub fn outcome(&self, feed: FeedKind) -> Option<&PassOutcome> {
        self.passes
            .iter()
            .find(|(kind, _)| *kind == feed)
            .map(|(_, outcome)| outcome)
    }

    pub fn failed_feeds(&self) -> Vec<FeedKind> {
        self.passes
            .iter()
            .filter(|(_, outcome)| outcome.is_err())
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.passes.iter().all(|(_, outcome)| outcome.is_ok())
    }
}

#[instrument(skip_all)]
pub async fn run_sync(db: &Db, config: &SyncConfig) -> Result<SyncReport> {
    let started_at = Utc::now();
    let client = match config.feed_base_url {
        Some(_) => Some(source::http_client()?),
        None => None,
    };

    let mut passes = Vec::with_capacity(FeedKind::ALL.len());
    for feed in FeedKind::ALL {
        if let (Some(client), Some(url)) = (client.as_ref(), config.feed_url(feed)) {
            source::download_feed(client, &url, &config.feed_path(feed))
                .await
                .with_context(|| format!("downloading {feed} feed"))?;
        }

        let outcome = reconcile::run_pass(db, config, feed).await;
        if let Err(err) = &outcome {
            error!(feed = %feed, error = %err, "pass failed");
        }
        passes.push((feed, outcome));
    }

    let report = SyncReport {
        started_at,
        finished_at: Utc::now(),
        passes,
    };
    info!(
        failed = ?report.failed_feeds(),
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "sync run finished"
    );
    Ok(report)
}
