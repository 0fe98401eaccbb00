//! The stream channel and the plumbing behind every producer task.
//!
//! A [`Stream`] is the receiving half of a bounded channel whose sending half
//! is owned by exactly one background task. The task starts as soon as the
//! stream is built, hands elements over one at a time and closes the channel
//! by returning. It stops early when the stream's cancellation token fires or
//! when the consumer drops the stream.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::core::config::StreamConfig;
use crate::core::error::{Error, Result};

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(0);

fn next_stream_id() -> u64 {
    NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed)
}

/// A cheap, cloneable reference to a stream.
///
/// Callbacks receive the handle of the stream they are reading, which lets
/// them stop it early.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    id: u64,
    token: CancellationToken,
}

impl StreamHandle {
    /// Process-unique stream id, also recorded on the producer's span
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop the stream's producer and every stream derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The cancellation token driving this stream
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// A lazily produced sequence of `T`.
///
/// Elements are read with [`Stream::next`] or through the
/// [`futures_core::Stream`] implementation. `None` means the producer closed
/// the stream; every later read returns `None` as well.
pub struct Stream<T> {
    rx: mpsc::Receiver<T>,
    handle: StreamHandle,
    config: StreamConfig,
}

impl<T> Stream<T> {
    /// Receive the next element, or `None` once the stream is closed
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn handle(&self) -> &StreamHandle {
        &self.handle
    }

    pub fn id(&self) -> u64 {
        self.handle.id
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Stop this stream's producer.
    ///
    /// Elements already handed over stay readable; streams derived from
    /// this one are cancelled too.
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.handle.token
    }
}

impl<T> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.handle.id)
            .field("cancelled", &self.handle.is_cancelled())
            .field("config", &self.config)
            .finish()
    }
}

impl<T> futures_core::Stream for Stream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// The sending side handed to a producer task.
///
/// Every wait a producer performs goes through the emitter so that
/// cancellation and a dropped consumer are noticed while blocked.
pub(crate) struct Emitter<T> {
    tx: mpsc::Sender<T>,
    token: CancellationToken,
}

impl<T: Send> Emitter<T> {
    /// Hand one element to the consumer
    pub(crate) async fn emit(&self, item: T) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            sent = self.tx.send(item) => sent.map_err(Error::from),
        }
    }

    /// Await `fut` unless the stream is cancelled or its consumer goes away
    pub(crate) async fn wait<F: Future>(&self, fut: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            _ = self.tx.closed() => Err(Error::ChannelClosed),
            output = fut => Ok(output),
        }
    }

    /// Receive the next upstream element.
    ///
    /// An upstream that closed because it was cancelled cancels this stream
    /// too, whichever input it is.
    pub(crate) async fn pull<U>(&self, upstream: &mut Stream<U>) -> Result<Option<U>> {
        match self.wait(upstream.next()).await? {
            None if upstream.handle().is_cancelled() => {
                self.token.cancel();
                Err(Error::Cancelled)
            }
            pulled => Ok(pulled),
        }
    }
}

/// Start a producer task and return the stream it feeds.
///
/// The new stream's token is a child of `parent`. The task ends when `body`
/// returns; an `Err` from `body` only records why it stopped early.
pub(crate) fn spawn<T, F, Fut>(
    op: &'static str,
    config: StreamConfig,
    parent: &CancellationToken,
    body: F,
) -> Stream<T>
where
    T: Send + 'static,
    F: FnOnce(Emitter<T>) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity());
    let token = parent.child_token();
    let id = next_stream_id();
    let task = body(Emitter {
        tx,
        token: token.clone(),
    });

    let span = tracing::trace_span!("stream", id, op);
    tokio::spawn(
        async move {
            tracing::trace!("producer started");
            match task.await {
                Ok(()) => tracing::trace!("producer closed"),
                Err(Error::Cancelled) => tracing::debug!("producer cancelled"),
                Err(Error::ChannelClosed) => tracing::debug!("consumer dropped"),
                Err(e) => tracing::warn!(error = %e, "producer failed"),
            }
        }
        .instrument(span),
    );

    Stream {
        rx,
        handle: StreamHandle { id, token },
        config,
    }
}
