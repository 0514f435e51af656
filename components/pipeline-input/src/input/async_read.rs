use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf, Result as IoResult};

/// This pattern abstracts "why reading stops" into a future, inputs use it to
/// turn a close request into an EOF on their underlying reader, so framing
/// code downstream of the reader only ever has to handle EOF.
///
/// See [this code](https://github.com/vectordotdev/vector/blob/master/src/async_read.rs)
pub trait StopReadExt: AsyncRead {
    /// Wrap the reader so it reports EOF once `until` resolves
    fn read_until_future<F>(self, until: F) -> StopOnFuture<Self, F>
    where
        Self: Sized,
        F: Future<Output = ()>,
    {
        StopOnFuture {
            reader: self,
            until,
        }
    }
}

impl<S> StopReadExt for S where S: AsyncRead {}

/// Reader returned by [`StopReadExt::read_until_future`]
#[pin_project]
#[derive(Debug)]
pub struct StopOnFuture<S, F> {
    #[pin]
    reader: S,
    #[pin]
    until: F,
}

impl<S, F> AsyncRead for StopOnFuture<S, F>
where
    S: AsyncRead,
    F: Future<Output = ()>,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<IoResult<()>> {
        let this = self.project();

        match this.until.poll(cx) {
            Poll::Ready(_) => Poll::Ready(Ok(())),
            Poll::Pending => this.reader.poll_read(cx, buf),
        }
    }
}
