//! Multi-input combinators.
//!
//! These read from several upstream streams on one producer task. The zip
//! family reads one element from each input per output step, always in
//! input order, and differs only in when it stops: [`zip`] and
//! [`multi_map`] stop at the first exhausted input (shortest wins),
//! [`zip_longest`] and [`multi_map_longest`] keep going until every input
//! is exhausted (longest wins).

use tokio_util::sync::CancellationToken;

use crate::core::stream::{spawn, Emitter};
use crate::core::{Result, Stream, StreamConfig};

/// Configuration and parent token for a stage fed by `streams`
fn lineage<T>(streams: &[Stream<T>]) -> (StreamConfig, CancellationToken) {
    match streams.first() {
        Some(first) => (first.config().clone(), first.token().clone()),
        None => (StreamConfig::default(), CancellationToken::new()),
    }
}

/// Concatenate `streams`, draining each before moving to the next
pub fn chain<T, I>(streams: I) -> Stream<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = Stream<T>>,
{
    let streams: Vec<_> = streams.into_iter().collect();
    let (config, parent) = lineage(&streams);
    spawn("chain", config, &parent, move |out| run_chain(streams, out))
}

/// Emit one row per step holding an element of each input; shortest wins.
///
/// Elements already read for a step that cannot be completed are dropped.
/// With no inputs the stream closes immediately.
pub fn zip<T, I>(streams: I) -> Stream<Vec<T>>
where
    T: Send + 'static,
    I: IntoIterator<Item = Stream<T>>,
{
    multi_map(streams, |row| row)
}

/// Emit one row per step until every input is exhausted.
///
/// Exhausted inputs contribute `None` and are not read again.
pub fn zip_longest<T, I>(streams: I) -> Stream<Vec<Option<T>>>
where
    T: Send + 'static,
    I: IntoIterator<Item = Stream<T>>,
{
    multi_map_longest(streams, |row| row)
}

/// Like [`zip`], but emits `f(row)` instead of the row
pub fn multi_map<T, U, I, F>(streams: I, f: F) -> Stream<U>
where
    T: Send + 'static,
    U: Send + 'static,
    I: IntoIterator<Item = Stream<T>>,
    F: FnMut(Vec<T>) -> U + Send + 'static,
{
    let streams: Vec<_> = streams.into_iter().collect();
    let (config, parent) = lineage(&streams);
    spawn("zip", config, &parent, move |out| run_zip(streams, out, f))
}

/// Like [`zip_longest`], but emits `f(row)` instead of the row
pub fn multi_map_longest<T, U, I, F>(streams: I, f: F) -> Stream<U>
where
    T: Send + 'static,
    U: Send + 'static,
    I: IntoIterator<Item = Stream<T>>,
    F: FnMut(Vec<Option<T>>) -> U + Send + 'static,
{
    let streams: Vec<_> = streams.into_iter().collect();
    let (config, parent) = lineage(&streams);
    spawn("zip_longest", config, &parent, move |out| {
        run_zip_longest(streams, out, f)
    })
}

/// Pair up two streams of different element types; shortest wins
pub fn zip2<A, B>(left: Stream<A>, right: Stream<B>) -> Stream<(A, B)>
where
    A: Send + 'static,
    B: Send + 'static,
{
    let config = left.config().clone();
    let parent = left.token().clone();
    spawn("zip2", config, &parent, move |out| run_zip2(left, right, out))
}

impl<T: Send + 'static> Stream<T> {
    /// Emit this stream, then `other`
    pub fn chain(self, other: Stream<T>) -> Stream<T> {
        chain([self, other])
    }

    /// Pair this stream with `other`; shortest wins
    pub fn zip<U: Send + 'static>(self, other: Stream<U>) -> Stream<(T, U)> {
        zip2(self, other)
    }
}

async fn run_chain<T: Send>(streams: Vec<Stream<T>>, out: Emitter<T>) -> Result<()> {
    for mut upstream in streams {
        while let Some(item) = out.pull(&mut upstream).await? {
            out.emit(item).await?;
        }
    }
    Ok(())
}

async fn run_zip<T, U, F>(mut streams: Vec<Stream<T>>, out: Emitter<U>, mut f: F) -> Result<()>
where
    T: Send,
    U: Send,
    F: FnMut(Vec<T>) -> U,
{
    if streams.is_empty() {
        return Ok(());
    }

    loop {
        let mut row = Vec::with_capacity(streams.len());
        for upstream in streams.iter_mut() {
            match out.pull(upstream).await? {
                Some(item) => row.push(item),
                None => return Ok(()),
            }
        }
        out.emit(f(row)).await?;
    }
}

async fn run_zip_longest<T, U, F>(
    mut streams: Vec<Stream<T>>,
    out: Emitter<U>,
    mut f: F,
) -> Result<()>
where
    T: Send,
    U: Send,
    F: FnMut(Vec<Option<T>>) -> U,
{
    let mut exhausted = vec![false; streams.len()];

    loop {
        let mut row = Vec::with_capacity(streams.len());
        for (upstream, done) in streams.iter_mut().zip(exhausted.iter_mut()) {
            if *done {
                row.push(None);
                continue;
            }
            let item = out.pull(upstream).await?;
            *done = item.is_none();
            row.push(item);
        }

        // Also covers the no-input case
        if exhausted.iter().all(|done| *done) {
            return Ok(());
        }
        out.emit(f(row)).await?;
    }
}

async fn run_zip2<A, B>(mut left: Stream<A>, mut right: Stream<B>, out: Emitter<(A, B)>) -> Result<()>
where
    A: Send,
    B: Send,
{
    loop {
        let Some(a) = out.pull(&mut left).await? else {
            return Ok(());
        };
        let Some(b) = out.pull(&mut right).await? else {
            return Ok(());
        };
        out.emit((a, b)).await?;
    }
}
