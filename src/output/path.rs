//! Output path resolution and the file sink
//!
//! Files are named `<base>_<YYYY-MM-DD_HH-MM-SS>.csv` inside the output
//! directory, which is created on demand.
//!
//! # Usage Example
//!
//! ```no_run
//! use chrono::Local;
//! use std::io::Write;
//! use std::path::Path;
//! use tabular_scraper::output::{CollisionPolicy, FileSink};
//!
//! let mut sink = FileSink::open(Path::new("data"), "prices", Local::now(), CollisionPolicy::Overwrite)?;
//! sink.write_all(b"asset_id,usd_price\n")?;
//! let path = sink.close()?;
//! // Result: data/prices_2024-01-02_03-04-05.csv
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::{DateTime, Local};
use std::fs::{DirBuilder, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::{OutputError, OutputResult};

/// Capture timestamp format used in file names (second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// File extension of exported files
pub const EXTENSION: &str = "csv";

const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Upper bound on suffix probing before giving up.
const MAX_SUFFIX: u32 = 10_000;

/// What to do when the target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Truncate and reuse the existing file
    #[default]
    Overwrite,
    /// Pick `<base>_<ts>_1.csv`, `_2`, ... until a free name is found
    Suffix,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "suffix" => Ok(Self::Suffix),
            _ => Err(format!(
                "Invalid collision policy: {s}. Valid options: overwrite, suffix"
            )),
        }
    }
}

/// Compose `<base>_<timestamp>.csv`.
pub fn file_name(base_name: &str, timestamp: &DateTime<Local>) -> String {
    format!(
        "{}_{}.{}",
        base_name,
        timestamp.format(TIMESTAMP_FORMAT),
        EXTENSION
    )
}

/// Sanitize a base name for filesystem safety.
///
/// `..` becomes `__` and `/`, `\`, `:` become `_`, so a base name can never
/// escape the output directory.
pub fn sanitize_base_name(name: &str) -> String {
    name.trim().replace("..", "__").replace(['/', '\\', ':'], "_")
}

/// Create `dir` and its parents (0755 on Unix). Existing directories are fine.
pub fn ensure_output_dir(dir: &Path) -> OutputResult<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir).map_err(|e| {
        OutputError::Config(format!(
            "Failed to create output directory {}: {}",
            dir.display(),
            e
        ))
    })
}

/// Open output file for one export call.
///
/// Writes are buffered; [`FileSink::close`] flushes and syncs. Dropping the
/// sink without closing still releases the handle.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Resolve the path, create the directory and open the file.
    ///
    /// # Arguments
    /// * `output_dir` - Directory for the file (created if missing)
    /// * `base_name` - File name prefix, sanitized before use
    /// * `timestamp` - Capture time embedded in the name
    /// * `policy` - Behaviour when the name is already taken
    pub fn open(
        output_dir: &Path,
        base_name: &str,
        timestamp: DateTime<Local>,
        policy: CollisionPolicy,
    ) -> OutputResult<Self> {
        let base_name = sanitize_base_name(base_name);
        if base_name.is_empty() {
            return Err(OutputError::Config(
                "base name must not be empty".to_string(),
            ));
        }

        ensure_output_dir(output_dir)?;

        let (path, file) = match policy {
            CollisionPolicy::Overwrite => {
                let path = output_dir.join(file_name(&base_name, &timestamp));
                let file = File::create(&path).map_err(|e| open_error(&path, e))?;
                (path, file)
            }
            CollisionPolicy::Suffix => open_unique(output_dir, &base_name, &timestamp)?,
        };

        Ok(Self {
            path,
            writer: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file),
        })
    }

    /// Resolved file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered data, sync to disk and release the handle.
    pub fn close(self) -> OutputResult<PathBuf> {
        let file = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::Write(format!("Failed to flush file: {}", e.error())))?;

        file.sync_all()
            .map_err(|e| OutputError::Write(format!("Failed to sync file: {}", e)))?;

        Ok(self.path)
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

fn open_unique(
    output_dir: &Path,
    base_name: &str,
    timestamp: &DateTime<Local>,
) -> OutputResult<(PathBuf, File)> {
    let stamp = timestamp.format(TIMESTAMP_FORMAT).to_string();

    for n in 0..=MAX_SUFFIX {
        let name = if n == 0 {
            format!("{base_name}_{stamp}.{EXTENSION}")
        } else {
            format!("{base_name}_{stamp}_{n}.{EXTENSION}")
        };
        let path = output_dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(open_error(&path, e)),
        }
    }

    Err(OutputError::Config(format!(
        "No free file name for {base_name}_{stamp} after {MAX_SUFFIX} attempts"
    )))
}

fn open_error(path: &Path, e: io::Error) -> OutputError {
    OutputError::Config(format!("Failed to create file {}: {}", path.display(), e))
}
