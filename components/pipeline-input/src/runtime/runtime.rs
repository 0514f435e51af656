// Local crates
use crate::{
    helpers::load_config::Config,
    input::input::{Input, new_input},
    instrumentation::tracing::{init_panic_handler, init_tracing},
    metrics::http::start_metrics_server,
    types::message::Message,
};

// External crates
use anyhow::{Context, Result};
use std::{future::Future, path::PathBuf};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    signal,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Pipeline input runtime: read the configured input and write every message
/// to stdout until the input closes.
pub async fn run_pipeline(config_path: PathBuf) -> Result<()> {
    let cfg = Config::load(&config_path)?;

    // Held until exit so the file sink flushes
    let _log_guard = init_tracing(&cfg.logging)?;
    init_panic_handler();

    info!(config = %config_path.display(), input = cfg.input.kind(), "Starting pipeline input");

    let global_cancel_token = CancellationToken::new();

    if cfg.metrics.enabled {
        let addr = cfg.metrics.listen_addr.clone();
        let cancel = global_cancel_token.clone();
        tokio::spawn(async move {
            if let Err(e) = start_metrics_server(&addr, cancel).await {
                tracing::error!(error = %e, "Metrics server failed");
            }
        });
    }

    let mut input = new_input(&cfg.input).context("Failed to create input")?;

    let mut stdout = tokio::io::stdout();
    let forwarded = write_messages(input.as_mut(), &mut stdout, async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C signal detected, closing input");
    })
    .await;
    info!(messages = forwarded, "Input closed, shutting down");

    let timeout = cfg.general.shutdown_timeout();
    input.close_async();
    if let Err(e) = input.wait_for_close(timeout).await {
        tracing::warn!(error = %e, "Input did not confirm close in time");
    }

    global_cancel_token.cancel();
    info!("Pipeline input successfully shutdown.");

    Ok(())
}

/// Write every message `input` produces to `out`, acknowledging each one
/// once written and rejecting it when the write fails. When `interrupt`
/// resolves the input is asked to close, which ends its stream, and
/// transactions it had not handed over yet are never written. Returns how
/// many messages were written.
#[instrument(
    name = "pipeline_input::runtime::write_messages",
    target = "runtime",
    skip_all,
    level = "debug"
)]
pub async fn write_messages<W, F>(input: &mut dyn Input, out: &mut W, interrupt: F) -> u64
where
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let mut interrupted = false;
    let mut written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut interrupt, if !interrupted => {
                interrupted = true;
                input.close_async();
                continue;
            }
            next = input.recv() => next,
        };
        let Some(tran) = next else {
            break;
        };

        let res = match write_message(out, &tran.payload).await {
            Ok(()) => {
                written += 1;
                tran.ack()
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to write message");
                tran.nack(e.to_string())
            }
        };
        if res.is_err() {
            tracing::debug!("Input stopped waiting for the response");
        }
    }

    written
}

async fn write_message<W: AsyncWrite + Unpin>(out: &mut W, msg: &Message) -> std::io::Result<()> {
    for (i, part) in msg.iter().enumerate() {
        if i > 0 {
            out.write_all(b"\n").await?;
        }
        out.write_all(part).await?;
    }
    out.write_all(b"\n").await?;
    out.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{input::InputConfig, memory::MemoryConfig};
    use std::time::Duration;

    fn memory(messages: &[&str]) -> InputConfig {
        InputConfig::Memory(MemoryConfig {
            messages: messages.iter().map(|m| m.to_string()).collect(),
        })
    }

    #[tokio::test]
    async fn test_write_messages_until_exhausted() {
        let mut input = new_input(&memory(&["foo", "bar"])).unwrap();
        let mut out = Vec::new();

        let written = write_messages(input.as_mut(), &mut out, std::future::pending()).await;

        assert_eq!(written, 2);
        assert_eq!(out, b"foo\nbar\n");
        input.wait_for_close(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_messages_interrupted_before_first_message() {
        let mut input = new_input(&memory(&["foo", "bar", "baz"])).unwrap();
        let mut out = Vec::new();

        let written = write_messages(input.as_mut(), &mut out, async {}).await;

        assert_eq!(written, 0);
        assert!(out.is_empty());
        input.wait_for_close(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_messages_interrupted_midway() {
        let mut input = new_input(&memory(&["foo", "bar", "baz"])).unwrap();
        let mut out = Vec::new();

        let first = input.recv().await.unwrap();
        write_message(&mut out, &first.payload).await.unwrap();
        first.ack().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let written = write_messages(input.as_mut(), &mut out, async {}).await;

        assert_eq!(written, 0);
        assert_eq!(out, b"foo\n");
        input.wait_for_close(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_multipart_message() {
        let mut out = Vec::new();
        let msg = Message::new(vec!["a".into(), "b".into()]);
        write_message(&mut out, &msg).await.unwrap();
        assert_eq!(out, b"a\nb\n");
    }
}
