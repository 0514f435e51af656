// Local crates
use crate::helpers::load_config::{LogFormat, LoggingConfig};

// External crates
use anyhow::{Context, Result};
use console_subscriber::ConsoleLayer;
use std::panic;
use tracing::error;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    Layer,
    filter::{Directive, EnvFilter},
    fmt,
    prelude::*,
    registry::Registry,
};

const LOG_FILE_PREFIX: &str = "pipeline_input.log";

/// Install the global subscriber. Logs go to stderr, stdout carries the
/// messages read by `run`. The returned guard flushes the optional log file
/// and must be held until exit.
pub fn init_tracing(cfg: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    if cfg.tokio_console {
        if let Ok(tokio_directive) = "tokio=trace".parse::<Directive>() {
            filter = filter.add_directive(tokio_directive);
        }
        if let Ok(runtime_directive) = "runtime=trace".parse::<Directive>() {
            filter = filter.add_directive(runtime_directive);
        }
    }

    let stderr_layer = match cfg.format {
        LogFormat::Pretty => fmt::layer()
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .boxed(),
    };

    let (file_layer, guard) = match &cfg.directory {
        Some(directory) => {
            let file_appender = rolling::daily(directory, LOG_FILE_PREFIX);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(non_blocking_writer)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(false)
                .with_timer(fmt::time::UtcTime::rfc_3339());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = cfg.tokio_console.then(|| ConsoleLayer::builder().spawn());

    let subscriber = Registry::default()
        .with(console_layer)
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global tracing subscriber")?;

    Ok(guard)
}

pub fn init_panic_handler() {
    panic::set_hook(Box::new(|panic_info| {
        let msg = match panic_info.payload().downcast_ref::<&str>() {
            Some(s) => (*s).to_string(),
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => s.clone(),
                None => "Unknown panic".to_string(),
            },
        };

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());

        error!(
            message = %msg,
            location = %location,
            "Application panicked!"
        );
    }));
}
