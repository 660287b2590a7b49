use std::path::PathBuf;

use directories::BaseDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "OLLA_LOG";

pub enum Sink {
    /// Daily rolling file; the full-screen interface owns the terminal.
    File,
    Stderr,
}

fn filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn log_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|b| b.data_dir().join("olla").join("logs"))
}

/// Install the global subscriber. Keep the returned guard alive until exit so buffered
/// file output is flushed.
pub fn init(verbose: bool, sink: Sink) -> Option<WorkerGuard> {
    match sink {
        Sink::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter(verbose))
                .with_writer(std::io::stderr)
                .without_time()
                .try_init()
                .ok();
            None
        }
        Sink::File => {
            let dir = log_dir()?;
            std::fs::create_dir_all(&dir).ok()?;
            let appender = tracing_appender::rolling::daily(dir, "olla.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter(verbose))
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .ok()?;
            Some(guard)
        }
    }
}
