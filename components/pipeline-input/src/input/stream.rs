//! Shared worker behind every stream backed input.
//!
//! A pump pulls messages from a stream and delivers each one as a
//! transaction, redelivering the same message until it is acknowledged:
//!
//! ```text
//! loop {
//!   ├─► next message from stream (None / Err → close)
//!   └─► loop {
//!         ├─► send Transaction downstream
//!         ├─► await Response
//!         ├─► ack            → next message
//!         └─► nack / dropped → redeliver
//!       }
//! }
//! ```
//!
//! Every suspension point races the close signal.

// Local crates
use crate::{
    error::{InputError, TimeoutError},
    helpers::shutdown::Shutdown,
    input::input::{Input, recv_until_close, runtime},
    metrics::metrics::{STREAM_REJECTED, STREAM_SENT},
    types::{message::Message, transaction::Transaction},
};

// External crates
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use std::time::Duration;
use tokio::{io::AsyncBufRead, io::AsyncBufReadExt, sync::mpsc};
use tokio_stream::wrappers::LinesStream;
use tracing::instrument;

/// Stream of messages a pump delivers, a read error ends the input
pub type MessageStream = BoxStream<'static, std::io::Result<Message>>;

/// Input driven by a [`MessageStream`]
#[derive(Debug)]
pub struct StreamInput {
    kind: &'static str,
    transactions: mpsc::Receiver<Transaction>,
    shutdown: Shutdown,
}

impl StreamInput {
    /// Spawn a pump for `messages` on the current runtime. `shutdown` is the
    /// controller the stream itself may already be observing.
    pub fn spawn(
        kind: &'static str,
        shutdown: Shutdown,
        messages: MessageStream,
    ) -> Result<Self, InputError> {
        let handle = runtime()?;
        let (output, transactions) = mpsc::channel(1);

        tracing::debug!(input = kind, "Spawning stream input pump");
        handle.spawn(pump(kind, messages, output, shutdown.clone()));

        Ok(Self {
            kind,
            transactions,
            shutdown,
        })
    }
}

#[async_trait]
impl Input for StreamInput {
    async fn recv(&mut self) -> Option<Transaction> {
        recv_until_close(&mut self.transactions, &self.shutdown).await
    }

    fn close_async(&self) {
        if self.shutdown.request_close() {
            tracing::debug!(input = self.kind, "Close requested for stream input");
        }
    }

    async fn wait_for_close(&self, timeout: Duration) -> Result<(), TimeoutError> {
        self.shutdown.wait_for_close(timeout).await
    }
}

impl Drop for StreamInput {
    fn drop(&mut self) {
        self.shutdown.request_close();
    }
}

#[instrument(
    name = "pipeline_input::stream::pump",
    target = "input::stream",
    skip_all,
    fields(input = kind),
    level = "debug"
)]
async fn pump(
    kind: &'static str,
    mut messages: MessageStream,
    output: mpsc::Sender<Transaction>,
    shutdown: Shutdown,
) {
    tracing::debug!("Starting stream input");

    'messages: loop {
        let msg = tokio::select! {
            biased;
            _ = shutdown.close_requested() => break,
            next = messages.next() => match next {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Failed to read message, closing input");
                    break;
                }
                None => {
                    tracing::debug!("Stream input has no more data");
                    break;
                }
            },
        };

        loop {
            let (tran, response) = Transaction::new(msg.clone());

            tokio::select! {
                biased;
                _ = shutdown.close_requested() => break 'messages,
                sent = output.send(tran) => {
                    if sent.is_err() {
                        tracing::debug!("Downstream receiver dropped, closing input");
                        break 'messages;
                    }
                }
            }
            STREAM_SENT.with_label_values(&[kind]).inc();

            let response = tokio::select! {
                biased;
                _ = shutdown.close_requested() => break 'messages,
                response = response => response,
            };

            match response {
                Ok(res) if res.is_ack() => break,
                Ok(res) => tracing::debug!(
                    error = res.error().unwrap_or_default(),
                    message_size = msg.size(),
                    "Message rejected downstream, redelivering"
                ),
                Err(_) => tracing::debug!(
                    message_size = msg.size(),
                    "Transaction dropped without a response, redelivering"
                ),
            }
            STREAM_REJECTED.with_label_values(&[kind]).inc();
        }
    }

    drop(output);
    shutdown.confirm_closed();
    tracing::debug!("Stream input closed");
}

/// Frame lines read from `reader` into messages. Without `multipart` every
/// line is a single part message, with it consecutive non-empty lines form
/// the parts of one message and an empty line ends the message.
pub fn frame_lines<R>(reader: R, multipart: bool) -> MessageStream
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let mut lines = LinesStream::new(reader.lines());

    if !multipart {
        return lines.map(|line| line.map(Message::from)).boxed();
    }

    Box::pin(async_stream::stream! {
        let mut parts = Vec::new();
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) if line.is_empty() => {
                    if !parts.is_empty() {
                        yield Ok(Message::new(std::mem::take(&mut parts)));
                    }
                }
                Ok(line) => parts.push(Bytes::from(line)),
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
        if !parts.is_empty() {
            yield Ok(Message::new(parts));
        }
    })
}
