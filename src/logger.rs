/// Log output for the `log` macros used throughout the crate.
///
/// The terminal is in raw mode on the alternate screen while the app runs,
/// so a `tracing-subscriber` fmt subscriber writes to a file instead of
/// stderr. `log` records reach it through the `tracing-log` bridge that
/// `try_init` installs. `QUESTMAP_LOG` overrides the configured level with
/// an env-filter directive string.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use log::LevelFilter;
use tracing_subscriber::fmt::{self, format};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

const ENV_OVERRIDE: &str = "QUESTMAP_LOG";

type FileSubscriber = fmt::Subscriber<format::DefaultFields, format::Format, EnvFilter, Mutex<File>>;

fn filter_for(level: LevelFilter) -> EnvFilter {
    EnvFilter::new(level.as_str().to_lowercase())
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn file_subscriber(filter: EnvFilter, file: File) -> FileSubscriber {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish()
}

/// Install the global subscriber. `LevelFilter::Off` skips opening the file.
pub fn init(cfg: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.level == LevelFilter::Off {
        return Ok(());
    }
    let filter = EnvFilter::try_from_env(ENV_OVERRIDE).unwrap_or_else(|_| filter_for(cfg.level));
    let file = open_append(&cfg.file)?;
    file_subscriber(filter, file).try_init()?;
    Ok(())
}
