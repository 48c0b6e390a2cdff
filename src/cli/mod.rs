//! CLI command implementations

pub mod args;
pub mod error;
pub mod export;
pub mod fetch;

pub use args::{Cli, Commands};
pub use error::CliError;
pub use export::{ExportArgs, JsonRow, JsonTable};
pub use fetch::FetchArgs;
