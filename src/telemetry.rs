use std::path::Path;

use anyhow::Context;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LogConfig;

/// Installs the global subscriber. Logs always go to stdout; with
/// `LOG_DIR` set they are copied to `usermanage.<date>.log` files as well.
///
/// The returned guard flushes the file writer on drop and must be held
/// until shutdown.
pub fn init_tracing(log: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let stdout = if log.json {
        fmt::layer().with_target(false).json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let (file, guard) = match &log.dir {
        Some(dir) => {
            let (writer, guard) = file_writer(dir)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(&log.filter))
        .with(stdout)
        .with(file)
        .try_init()
        .context("install tracing subscriber")?;

    if let Some(dir) = &log.dir {
        tracing::info!(dir = %dir.display(), "file logging enabled");
    }
    Ok(guard)
}

fn file_writer(dir: &Path) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("usermanage")
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("open log directory {}", dir.display()))?;
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_writer_creates_log_in_directory() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("log");

        let (mut writer, guard) = file_writer(&dir).unwrap();
        writer.write_all(b"user created\n").unwrap();
        drop(guard);

        let files: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("usermanage"));
        assert!(name.ends_with(".log"));
        let content = std::fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("user created"));
    }
}
