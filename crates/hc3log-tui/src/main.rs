//! `hc3log` — live terminal log viewer for the HC3 controller event stream.
//!
//! Built on [ratatui](https://ratatui.rs). The core pipeline lives in
//! `hc3log-core`: a long-poll session streams controller events, which are
//! normalized once and fed into the table through the action loop.
//!
//! Logs are written to a file (default `/tmp/hc3log.log`) to avoid
//! corrupting the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app
//! launch. Configuration priority: CLI flags > env vars > config file.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use hc3log_config::FileConfig;
use hc3log_core::{ConnectionConfig, LogSession};

use crate::app::App;

/// Live terminal log viewer for HC3 controller events.
#[derive(Parser, Debug)]
#[command(name = "hc3log", version, about)]
struct Cli {
    /// Controller host, IP or hostname (e.g. 192.168.1.57)
    #[arg(short = 'H', long, env = "HC3_HOST")]
    host: Option<String>,

    /// Basic-auth username
    #[arg(short, long, env = "HC3_USER")]
    user: Option<String>,

    /// Basic-auth password
    #[arg(short, long, env = "HC3_PASSWORD")]
    password: Option<String>,

    /// URL scheme: http (default) or https
    #[arg(long, env = "HC3_PROTOCOL")]
    protocol: Option<String>,

    /// Log file path (defaults to /tmp/hc3log.log)
    #[arg(long, default_value = "/tmp/hc3log.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hc3log={log_level}")));

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("hc3log.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Merge CLI flags over the file/env configuration.
fn merged_config(cli: &Cli) -> FileConfig {
    let mut config = hc3log_config::load_config_or_default();
    if cli.host.is_some() {
        config.host.clone_from(&cli.host);
    }
    if cli.user.is_some() {
        config.user.clone_from(&cli.user);
    }
    if cli.password.is_some() {
        config.password.clone_from(&cli.password);
    }
    if cli.protocol.is_some() {
        config.protocol.clone_from(&cli.protocol);
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    info!(
        host = cli.host.as_deref().unwrap_or("(not set)"),
        "starting hc3log"
    );

    // A bad config is a reported condition, never a crash: the app runs
    // and shows what is missing.
    let (session, config_error) = match merged_config(&cli).to_connection_config() {
        Ok(connection) => {
            let issue = connection.validate().err().map(|e| e.to_string());
            (LogSession::new(connection), issue)
        }
        Err(e) => (
            LogSession::new(ConnectionConfig::default()),
            Some(e.to_string()),
        ),
    };

    let mut app = App::new(session, config_error);
    app.run().await?;

    Ok(())
}
