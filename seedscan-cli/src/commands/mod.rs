//! CLI command implementations

pub mod check;
pub mod generate;
pub mod logs;
pub mod providers;
pub mod verify;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use seedscan_core::config::Config;
use seedscan_core::ports::LogEvent;
use seedscan_core::services::{EntryPoint, LoggingService};
use seedscan_core::{CancelFlag, ScanContext, WordCount};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the seedscan directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SEEDSCAN_DIR") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".seedscan"))
        .ok_or_else(|| anyhow!("Could not find home directory; set SEEDSCAN_DIR"))
}

/// Load settings from the data directory, creating it if needed
pub fn load_config() -> Result<(PathBuf, Config)> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create seedscan directory: {:?}", data_dir))?;
    let config = Config::load(&data_dir).context("Failed to load settings.json")?;
    Ok((data_dir, config))
}

/// Build the scan context with command-line adjustments applied to the settings
pub fn get_context(adjust: impl FnOnce(&mut Config)) -> Result<ScanContext> {
    let (data_dir, mut config) = load_config()?;
    adjust(&mut config);
    ScanContext::with_config(&data_dir, config, EntryPoint::Cli)
        .context("Failed to initialize seedscan context")
}

/// Parse a `--words` argument
pub fn parse_word_count(words: Option<usize>) -> Result<Option<WordCount>> {
    match words {
        None => Ok(None),
        Some(n) => WordCount::from_words(n)
            .map(Some)
            .ok_or_else(|| anyhow!("Unsupported phrase length {}; use 12, 15, 18, 21 or 24", n)),
    }
}

/// Cancellation flag that is raised on Ctrl-C
///
/// The signal is awaited on a helper thread with its own runtime. The first
/// Ctrl-C raises the flag: provider calls not yet started are skipped, the
/// phrase in flight is discarded and the batch ends. A second Ctrl-C exits
/// immediately with status 130.
pub fn cancel_on_ctrl_c() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();

    // If the watcher can't start, Ctrl-C keeps its default behavior
    let _ = std::thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(_) => return,
            };
            if runtime.block_on(tokio::signal::ctrl_c()).is_err() {
                return;
            }
            flag.cancel();
            eprintln!("Cancelling after in-flight requests; press Ctrl-C again to quit now");
            if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
                std::process::exit(130);
            }
        });

    cancel
}
