//! `fetch` command: download raw bodies through the retrying fetcher

use clap::Args;
use futures_util::stream::{self, StreamExt};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cancel::CancelSignal;
use crate::fetcher::{FetchError, RetryingFetcher};
use crate::log::TracingLog;
use crate::output::path::ensure_output_dir;

use super::{Cli, CliError};

/// Maximum allowed concurrency
const MAX_CONCURRENCY: usize = 32;

fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Outcome of a batch: a lone failure is returned as is, several are summarized.
fn batch_result(
    failures: usize,
    total: usize,
    first_error: Option<FetchError>,
) -> Result<(), CliError> {
    match first_error {
        None => Ok(()),
        Some(e) if failures <= 1 => Err(e.into()),
        Some(first) => Err(CliError::FetchesFailed {
            failed: failures,
            total,
            first,
        }),
    }
}

/// Arguments of the `fetch` command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// URLs to fetch
    #[arg(required = true, num_args = 1..)]
    pub urls: Vec<String>,

    /// Save bodies as `response_<n>.json` in this directory instead of printing them
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Concurrent requests sharing the rate limit (default: 4, max: 32)
    #[arg(long, default_value = "4", value_parser = parse_concurrency)]
    pub concurrency: usize,
}

impl FetchArgs {
    /// Fetch every URL; fails if any fetch failed, after attempting all of them.
    pub async fn execute(&self, cli: &Cli, cancel: CancelSignal) -> Result<(), CliError> {
        let config = cli.fetch_config()?;
        let fetcher = Arc::new(RetryingFetcher::from_config(&config, TracingLog::shared())?);

        if let Some(dir) = &self.save_dir {
            ensure_output_dir(dir)?;
        }

        let results = stream::iter(self.urls.iter().enumerate())
            .map(|(index, url)| {
                let fetcher = Arc::clone(&fetcher);
                let cancel = cancel.clone();
                async move { (index, url, fetcher.fetch(url, &cancel).await) }
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut failures = 0usize;
        let mut first_error = None;
        for (index, url, result) in results {
            match result {
                Ok(body) => self.emit(index, url, &body)?,
                Err(e) => {
                    warn!("Fetch failed for {}: {}", url, e);
                    failures += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        batch_result(failures, self.urls.len(), first_error)
    }

    fn emit(&self, index: usize, url: &str, body: &[u8]) -> Result<(), CliError> {
        match &self.save_dir {
            Some(dir) => {
                let path = dir.join(format!("response_{index}.json"));
                std::fs::write(&path, body).map_err(|e| {
                    CliError::Io(format!("Failed to write {}: {}", path.display(), e))
                })?;
                info!("Saved {} ({} bytes) to {}", url, body.len(), path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(body)
                    .and_then(|_| stdout.write_all(b"\n"))
                    .map_err(|e| CliError::Io(format!("Failed to write to stdout: {}", e)))?;
            }
        }
        Ok(())
    }
}
