//! Logging setup.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILE_NAME: &str = "trailbot.log";

/// Setup logging with the given level.
///
/// `RUST_LOG` overrides `level` when set. Console output is pretty or JSON.
/// With `file`, JSON lines are also written to a daily-rolling file next to
/// it; keep the returned guard alive until exit so buffered lines are flushed.
pub fn setup_logging(
    level: &str,
    json: bool,
    file: Option<&Path>,
) -> Result<Option<WorkerGuard>, TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match file {
        Some(path) => {
            let (dir, prefix) = file_target(path);
            let appender = tracing_appender::rolling::daily(dir, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer().pretty())
            .try_init()?;
    }

    Ok(guard)
}

/// Split a log path into the rolling appender's directory and file prefix.
fn file_target(path: &Path) -> (PathBuf, OsString) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from(DEFAULT_FILE_NAME));
    (dir, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_target() {
        let (dir, prefix) = file_target(Path::new("logs/trailbot.log"));
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(prefix, OsString::from("trailbot.log"));

        let (dir, prefix) = file_target(Path::new("bot.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(prefix, OsString::from("bot.log"));

        let (_, prefix) = file_target(Path::new("/"));
        assert_eq!(prefix, OsString::from(DEFAULT_FILE_NAME));
    }
}
