//! Tracing setup for the console binary.
//!
//! Log lines go to stderr, leaving stdout to the console prompt, and to a
//! size-rotated file under the platform config directory when it is
//! writable. Set `DEBUG_LOGGING` to raise the display crates to debug.

use std::path::{Path, PathBuf};

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "queue-display.log";
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
const DEBUG_DIRECTIVES: &str = "info,queue_display=debug,queue_display_core=debug";

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped, so hold it until
/// the console exits. `None` means only stderr is being written.
pub fn init() -> Option<WorkerGuard> {
    let debug_enabled = std::env::var_os("DEBUG_LOGGING").is_some();

    let log_file = dirs::config_dir()
        .ok_or_else(|| "no platform config directory".to_string())
        .and_then(|dir| open_log_file(&dir.join("queue-display")));

    let (file_writer, file_status) = match log_file {
        Ok((appender, path)) => (Some(tracing_appender::non_blocking(appender)), Ok(path)),
        Err(reason) => (None, Err(reason)),
    };
    let (writer, guard) = file_writer.unzip();
    let file_layer = writer.map(|w| fmt::layer().with_writer(w).with_ansi(false));

    tracing_subscriber::registry()
        .with(directives(debug_enabled))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    match file_status {
        Ok(path) => tracing::info!(log_file = %path.display(), debug = debug_enabled, "Logging initialized"),
        Err(reason) => tracing::warn!(%reason, "File logging unavailable, using stderr only"),
    }
    guard
}

fn directives(debug: bool) -> EnvFilter {
    EnvFilter::new(if debug { DEBUG_DIRECTIVES } else { "info" })
}

/// Open the rotating log file in `dir`, creating the directory first.
/// One rotated file is kept next to the live one.
fn open_log_file(dir: &Path) -> Result<(BasicRollingFileAppender, PathBuf), String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("{}: {}", dir.display(), e))?;
    let path = dir.join(LOG_FILE);
    let appender = BasicRollingFileAppender::new(
        &path,
        RollingConditionBasic::new().max_size(MAX_LOG_BYTES),
        1,
    )
    .map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok((appender, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_created_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs").join("display");

        let (_appender, path) = open_log_file(&nested).unwrap();
        assert_eq!(path, nested.join(LOG_FILE));
        assert!(nested.is_dir());
    }

    #[test]
    fn unwritable_location_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let err = open_log_file(&blocker.join("logs")).unwrap_err();
        assert!(err.contains("not-a-dir"));
    }
}
