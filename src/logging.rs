//! Logging to the console and to a log file

use env_logger::{Env, Target};
use log::{info, warn, SetLoggerError};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::config::LoggingConfig;

/// Where log output ended up
#[derive(Debug)]
pub struct LogSetup {
    pub path: PathBuf,
    /// Whether the log file could be opened; console output is always on
    pub file_enabled: bool,
}

/// Writes every record to stderr, and to the log file when there is one
struct Tee {
    console: io::Stderr,
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.console.write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            if file.write_all(buf).is_err() {
                // stop writing to a file that fails once, keep the console going
                self.file = None;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        self.console.flush()
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global logger
///
/// Records are formatted as `<timestamp> - <LEVEL> - <message>`. The level comes from `RUST_LOG`
/// when set, otherwise from the configuration.
pub fn setup_logging(config: &LoggingConfig) -> Result<LogSetup, SetLoggerError> {
    let file = open_log_file(&config.file);
    let file_enabled = file.is_ok();
    let (file, file_error) = match file {
        Ok(file) => (Some(file), None),
        Err(e) => (None, Some(e)),
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(config.level.as_str()))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(Tee {
            console: io::stderr(),
            file,
        })))
        .try_init()?;

    info!("Logging configured. Log path: {}", config.file.display());
    if let Some(e) = file_error {
        warn!("Could not open log file {}: {}", config.file.display(), e);
    }

    Ok(LogSetup {
        path: config.file.clone(),
        file_enabled,
    })
}
