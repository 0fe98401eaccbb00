//! Source generators.
//!
//! Sources have no upstream. Each call spawns one producer task that writes
//! its sequence and, for finite sequences, closes the stream.

use tokio_stream::StreamExt;

use crate::core::stream::{spawn, Emitter};
use crate::core::{Result, Scope, Stream};
use crate::value::Value;

/// Build a stream from a list of values, like `vec!`.
///
/// ```rust
/// use lazyweld::prelude::*;
///
/// # tokio_test::block_on(async {
/// let doubled = stream![1, 2, 3].map(|x, _, _| x * 2).list().await;
/// assert_eq!(doubled, vec![2, 4, 6]);
/// # });
/// ```
#[macro_export]
macro_rules! stream {
    ($($item:expr),* $(,)?) => {
        $crate::sources::from_vec(vec![$($item),*])
    };
}

/// Emit every item of `iter` in order, then close
pub fn from_iter<I>(iter: I) -> Stream<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    Scope::default().from_iter(iter)
}

/// Forward every item of an async stream, then close
pub fn from_stream<S>(source: S) -> Stream<S::Item>
where
    S: futures_core::Stream + Send + 'static,
    S::Item: Send + 'static,
{
    Scope::default().from_stream(source)
}

/// Emit every item of `items` in order, then close
pub fn from_vec<T: Send + 'static>(items: Vec<T>) -> Stream<T> {
    from_iter(items)
}

/// Emit a list of dynamically typed values
pub fn values<I, V>(items: I) -> Stream<Value>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    from_vec(items.into_iter().map(Into::into).collect())
}

/// Emit `start, start + 1, ...` forever
pub fn count(start: i64) -> Stream<i64> {
    Scope::default().count(start)
}

/// Emit `value` `times` times, or forever when `times` is `None`
pub fn repeat<T: Clone + Send + 'static>(value: T, times: Option<usize>) -> Stream<T> {
    Scope::default().repeat(value, times)
}

impl Scope {
    /// Emit every item of `iter` in order, then close
    pub fn from_iter<I>(&self, iter: I) -> Stream<I::Item>
    where
        I: IntoIterator,
        I::IntoIter: Send + 'static,
        I::Item: Send + 'static,
    {
        let items = iter.into_iter();
        spawn("from_iter", self.config().clone(), self.token(), |out| {
            run_iter(items, out)
        })
    }

    /// Forward every item of an async stream, then close
    pub fn from_stream<S>(&self, source: S) -> Stream<S::Item>
    where
        S: futures_core::Stream + Send + 'static,
        S::Item: Send + 'static,
    {
        spawn("from_stream", self.config().clone(), self.token(), |out| {
            run_stream(source, out)
        })
    }

    /// Emit `start, start + 1, ...` forever
    pub fn count(&self, start: i64) -> Stream<i64> {
        spawn("count", self.config().clone(), self.token(), move |out| {
            run_count(start, out)
        })
    }

    /// Emit `value` `times` times, or forever when `times` is `None`
    pub fn repeat<T: Clone + Send + 'static>(&self, value: T, times: Option<usize>) -> Stream<T> {
        spawn("repeat", self.config().clone(), self.token(), move |out| {
            run_repeat(value, times, out)
        })
    }
}

async fn run_iter<I>(items: I, out: Emitter<I::Item>) -> Result<()>
where
    I: Iterator,
    I::Item: Send,
{
    for item in items {
        out.emit(item).await?;
    }
    Ok(())
}

async fn run_stream<S>(source: S, out: Emitter<S::Item>) -> Result<()>
where
    S: futures_core::Stream,
    S::Item: Send,
{
    tokio::pin!(source);
    while let Some(item) = out.wait(source.next()).await? {
        out.emit(item).await?;
    }
    Ok(())
}

async fn run_count(start: i64, out: Emitter<i64>) -> Result<()> {
    let mut current = start;
    loop {
        out.emit(current).await?;
        current = current.wrapping_add(1);
    }
}

async fn run_repeat<T: Clone + Send>(value: T, times: Option<usize>, out: Emitter<T>) -> Result<()> {
    match times {
        Some(times) => {
            for _ in 0..times {
                out.emit(value.clone()).await?;
            }
            Ok(())
        }
        None => loop {
            out.emit(value.clone()).await?;
        },
    }
}
