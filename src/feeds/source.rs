// Optional HTTP sourcing of feed files ahead of a pass.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, instrument};

pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .context("failed to build HTTP client")
}

/// Download `url` and replace the file at `dest` with its body.
#[instrument(skip(client))]
pub async fn download_feed(client: &reqwest::Client, url: &str, dest: &Path) -> Result<u64> {
    let body = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("feed server rejected {url}"))?
        .bytes()
        .await
        .with_context(|| format!("failed to read body of {url}"))?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(dest, &body)
        .await
        .with_context(|| format!("failed to write {}", dest.display()))?;

    info!(bytes = body.len(), "feed downloaded");
    Ok(body.len() as u64)
}
