//! Top-level command line arguments

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::{FetchConfig, RateBudget, RetryPolicy, DEFAULT_USER_AGENT};
use crate::output::CollisionPolicy;

use super::export::ExportArgs;
use super::fetch::FetchArgs;
use super::CliError;

/// Command line interface
#[derive(Parser, Debug)]
#[command(name = "tabular-scraper")]
#[command(about = "Fetch JSON endpoints and export them as CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Maximum attempts per request (default: 3, range: 1-20)
    #[arg(long, global = true, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_attempts: u32,

    /// Requests per second, also used as the burst size
    #[arg(long, global = true, default_value = "2", value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub rate: u32,

    /// User-Agent header sent with every request
    #[arg(long, global = true, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Directory for exported files
    #[arg(long, global = true, default_value = "data")]
    pub output_dir: PathBuf,

    /// What to do when an export file name is taken: overwrite or suffix
    #[arg(long, global = true, default_value = "overwrite")]
    pub collision: CollisionPolicy,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Fetch configuration from the global flags.
    pub fn fetch_config(&self) -> Result<FetchConfig, CliError> {
        Ok(FetchConfig {
            user_agent: self.user_agent.clone(),
            retry: RetryPolicy::new(self.max_attempts)?,
            rate: RateBudget::per_second(self.rate)?,
        })
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one or more URLs and print or save the raw bodies
    Fetch(FetchArgs),

    /// Export a JSON array of objects (from a file or a URL) to CSV
    Export(ExportArgs),
}
