//! commentdesk - a terminal client for the comment-generation service.
//!
//! Each invocation runs one command against the stored session: log in,
//! generate a comment, browse history, log out.

mod app;
mod command;
mod navigator;

use std::io;

use anyhow::Result;
use commentdesk_core::Config;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use command::Command;

/// Log file prefix inside the data directory
const LOG_FILE_PREFIX: &str = "commentdesk.log";

/// Initialize the tracing subscriber for logging.
///
/// Console output goes to stderr; when the data directory is known, a daily
/// rolling log file is written there as well. The returned guard must be
/// kept alive so buffered file output gets flushed.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match Config::default().data_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    info!(?command, "commentdesk starting");

    let mut app = App::new()?;
    app.run(command).await
}
