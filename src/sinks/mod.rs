//! Terminal consumers.
//!
//! A [`Sink`] drains a stream to a final value. [`Stream::drain`] drives any
//! sink; [`Stream::list`], [`Stream::every`] and [`Stream::some`] are built
//! on the sinks here, and [`Stream::reduce`] folds in place.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::core::{Error, Result, Stream, StreamHandle};
use crate::util::CancellableExt;

/// Whether a sink wants more elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// A sink consumes the elements of a stream and produces one output.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use lazyweld::prelude::*;
///
/// struct Longest(usize);
///
/// #[async_trait]
/// impl Sink for Longest {
///     type Item = String;
///     type Output = usize;
///
///     async fn write(&mut self, item: String) -> Control {
///         self.0 = self.0.max(item.len());
///         Control::Continue
///     }
///
///     async fn finish(self) -> usize {
///         self.0
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let words = from_vec(vec!["a".to_string(), "abc".to_string()]);
/// assert_eq!(words.drain(Longest(0)).await, 3);
/// # });
/// ```
#[async_trait]
pub trait Sink: Send + Sized {
    /// The type of items this sink accepts
    type Item: Send + 'static;
    /// The final value produced once the stream is drained
    type Output: Send;

    /// Consume one item.
    ///
    /// Returning [`Control::Stop`] ends the drain early; the rest of the
    /// stream is dropped unread.
    async fn write(&mut self, item: Self::Item) -> Control;

    /// Called once no more items will be written
    async fn finish(self) -> Self::Output;
}

/// Collects every element in order
pub struct ListSink<T> {
    items: Vec<T>,
}

impl<T> ListSink<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Default for ListSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Sink for ListSink<T> {
    type Item = T;
    type Output = Vec<T>;

    async fn write(&mut self, item: T) -> Control {
        self.items.push(item);
        Control::Continue
    }

    async fn finish(self) -> Vec<T> {
        self.items
    }
}

/// True unless some element fails the predicate
pub struct EverySink<F, T> {
    predicate: F,
    handle: StreamHandle,
    index: usize,
    holds: bool,
    _phantom: PhantomData<fn(T)>,
}

impl<F, T> EverySink<F, T>
where
    F: FnMut(&T, usize, &StreamHandle) -> bool,
{
    pub fn new(predicate: F, handle: StreamHandle) -> Self {
        Self {
            predicate,
            handle,
            index: 0,
            holds: true,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T> Sink for EverySink<F, T>
where
    F: FnMut(&T, usize, &StreamHandle) -> bool + Send,
    T: Send + 'static,
{
    type Item = T;
    type Output = bool;

    async fn write(&mut self, item: T) -> Control {
        let passed = (self.predicate)(&item, self.index, &self.handle);
        self.index += 1;
        if passed {
            Control::Continue
        } else {
            self.holds = false;
            Control::Stop
        }
    }

    async fn finish(self) -> bool {
        self.holds
    }
}

/// True once some element satisfies the predicate
pub struct SomeSink<F, T> {
    predicate: F,
    handle: StreamHandle,
    index: usize,
    found: bool,
    _phantom: PhantomData<fn(T)>,
}

impl<F, T> SomeSink<F, T>
where
    F: FnMut(&T, usize, &StreamHandle) -> bool,
{
    pub fn new(predicate: F, handle: StreamHandle) -> Self {
        Self {
            predicate,
            handle,
            index: 0,
            found: false,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T> Sink for SomeSink<F, T>
where
    F: FnMut(&T, usize, &StreamHandle) -> bool + Send,
    T: Send + 'static,
{
    type Item = T;
    type Output = bool;

    async fn write(&mut self, item: T) -> Control {
        let matched = (self.predicate)(&item, self.index, &self.handle);
        self.index += 1;
        if matched {
            self.found = true;
            Control::Stop
        } else {
            Control::Continue
        }
    }

    async fn finish(self) -> bool {
        self.found
    }
}

/// The single-value answer of [`Stream::every`] or [`Stream::some`].
///
/// Resolves to `Err(Error::ChannelClosed)` if the stream was cancelled
/// before an answer was reached.
#[derive(Debug)]
pub struct Verdict {
    rx: oneshot::Receiver<bool>,
}

impl Future for Verdict {
    type Output = Result<bool>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map_err(Error::from)
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Feed every element to `sink` until it stops or the stream closes
    pub async fn drain<S: Sink<Item = T>>(mut self, mut sink: S) -> S::Output {
        while let Some(item) = self.next().await {
            if sink.write(item).await == Control::Stop {
                break;
            }
        }
        sink.finish().await
    }

    /// Collect every element; never returns on an infinite stream
    pub async fn list(self) -> Vec<T> {
        self.drain(ListSink::new()).await
    }

    /// Fold the stream from the left, starting from `initial`
    pub async fn reduce<F, A>(mut self, mut f: F, initial: A) -> A
    where
        F: FnMut(A, T) -> A,
    {
        let mut memo = initial;
        while let Some(item) = self.next().await {
            memo = f(memo, item);
        }
        memo
    }

    /// Decide whether every element satisfies `predicate`.
    ///
    /// Stops reading at the first failure.
    pub fn every<F>(self, predicate: F) -> Verdict
    where
        F: FnMut(&T, usize, &StreamHandle) -> bool + Send + 'static,
    {
        let sink = EverySink::new(predicate, self.handle().clone());
        self.decide("every", sink)
    }

    /// Decide whether some element satisfies `predicate`.
    ///
    /// Stops reading at the first match.
    pub fn some<F>(self, predicate: F) -> Verdict
    where
        F: FnMut(&T, usize, &StreamHandle) -> bool + Send + 'static,
    {
        let sink = SomeSink::new(predicate, self.handle().clone());
        self.decide("some", sink)
    }

    fn decide<S>(self, op: &'static str, sink: S) -> Verdict
    where
        S: Sink<Item = T, Output = bool> + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let token = self.token().clone();
        let span = tracing::trace_span!("verdict", id = self.id(), op);

        tokio::spawn(
            async move {
                let mut tx = tx;
                let decided = tokio::select! {
                    biased;
                    _ = tx.closed() => {
                        tracing::debug!("verdict dropped");
                        return;
                    }
                    decided = self.drain(sink).cancellable(token) => decided,
                };
                match decided {
                    Ok(answer) => {
                        tracing::trace!(answer, "verdict reached");
                        let _ = tx.send(answer);
                    }
                    Err(_) => tracing::debug!("verdict cancelled"),
                }
            }
            .instrument(span),
        );

        Verdict { rx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{count, from_vec};
    use crate::stream;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_list() {
        assert_eq!(stream![1, 2, 3].list().await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_reduce_sum() {
        let sum = from_vec(vec![0.1f64, 0.2, 0.3, 0.22])
            .reduce(|memo, x| memo + x, 0.0)
            .await;
        assert!((sum - 0.82).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_reduce_without_default() {
        struct Total(u32);

        let total = stream![1, 2, 3]
            .reduce(|Total(t), x| Total(t + x), Total(10))
            .await;
        assert_eq!(total.0, 16);
    }

    #[tokio::test]
    async fn test_reduce_empty_returns_initial() {
        let out = from_vec(Vec::<i32>::new())
            .reduce(|m, x| m + x, 42)
            .await;
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn test_every() {
        let even = |x: &i32, _: usize, _: &StreamHandle| x % 2 == 0;
        assert_eq!(stream![2, 4, 6, 8, 10].every(even).await, Ok(true));
        assert_eq!(stream![2, 3, 4].every(even).await, Ok(false));
        assert_eq!(from_vec(Vec::<i32>::new()).every(even).await, Ok(true));
    }

    #[tokio::test]
    async fn test_every_short_circuits_on_infinite_stream() {
        let verdict = count(0).every(|x, _, _| *x < 5).await;
        assert_eq!(verdict, Ok(false));
    }

    #[tokio::test]
    async fn test_some() {
        let even = |x: &i32, _: usize, _: &StreamHandle| x % 2 == 0;
        assert_eq!(stream![1, 2, 3, 4, 5].some(even).await, Ok(true));
        assert_eq!(stream![1, 3, 5].some(even).await, Ok(false));
    }

    #[tokio::test]
    async fn test_some_short_circuits_on_infinite_stream() {
        assert_eq!(count(0).some(|x, _, _| *x == 100).await, Ok(true));
    }

    #[tokio::test]
    async fn test_cancelled_verdict() {
        let stream = count(0);
        let handle = stream.handle().clone();
        let verdict = stream.every(|_, _, _| true);
        handle.cancel();
        assert_eq!(verdict.await, Err(Error::ChannelClosed));
    }

    #[tokio::test]
    async fn test_dropped_verdict_stops_upstream() {
        let last_seen = Arc::new(AtomicI64::new(-1));
        let seen = last_seen.clone();
        let verdict = count(0)
            .map(move |x, _, _| {
                seen.store(x, Ordering::SeqCst);
                x
            })
            .every(|_, _, _| true);
        drop(verdict);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let settled = last_seen.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(last_seen.load(Ordering::SeqCst), settled);
    }

    #[tokio::test]
    async fn test_custom_sink_stops_early() {
        struct FirstOver(i64);

        #[async_trait]
        impl Sink for FirstOver {
            type Item = i64;
            type Output = Option<i64>;

            async fn write(&mut self, item: i64) -> Control {
                if item > self.0 {
                    self.0 = item;
                    Control::Stop
                } else {
                    Control::Continue
                }
            }

            async fn finish(self) -> Option<i64> {
                Some(self.0)
            }
        }

        assert_eq!(count(0).drain(FirstOver(41)).await, Some(42));
    }
}
