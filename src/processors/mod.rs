//! Unary stream transforms.
//!
//! Each transform consumes one upstream stream and spawns one producer task
//! feeding the returned stream. Callbacks run on that task and receive the
//! element, its zero-based index in this traversal, and the upstream's
//! [`StreamHandle`].

pub mod combinators;

use std::ops::{Range, RangeFrom};

use crate::core::stream::{spawn, Emitter};
use crate::core::{Result, Stream, StreamHandle};

/// Elements that [`Stream::starmap`] can spread into an argument list.
///
/// A `Vec` (such as the rows produced by [`zip`](combinators::zip)) spreads
/// into its items.
pub trait StarArgs {
    /// The type of a single argument
    type Arg;

    /// Split this element into the arguments of a starmap call
    fn into_args(self) -> Vec<Self::Arg>;
}

impl<A> StarArgs for Vec<A> {
    type Arg = A;

    fn into_args(self) -> Vec<A> {
        self
    }
}

/// Bounds for [`Stream::slice`].
///
/// Converts from `start`, `(start, stop)`, `(start, stop, step)`,
/// `start..stop` and `start..`. In the tuple forms a `stop` of zero means
/// "no stop"; a `step` of zero is treated as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBounds {
    pub start: usize,
    pub stop: Option<usize>,
    pub step: usize,
}

impl SliceBounds {
    pub fn new(start: usize, stop: Option<usize>, step: usize) -> Self {
        Self {
            start,
            stop,
            step: step.max(1),
        }
    }

    fn selects(&self, index: usize) -> bool {
        index >= self.start && (index - self.start) % self.step == 0
    }

    fn exhausted_at(&self, index: usize) -> bool {
        self.stop.is_some_and(|stop| index >= stop)
    }
}

impl Default for SliceBounds {
    fn default() -> Self {
        Self::new(0, None, 1)
    }
}

impl From<usize> for SliceBounds {
    fn from(start: usize) -> Self {
        Self::new(start, None, 1)
    }
}

impl From<(usize, usize)> for SliceBounds {
    fn from((start, stop): (usize, usize)) -> Self {
        Self::new(start, (stop > 0).then_some(stop), 1)
    }
}

impl From<(usize, usize, usize)> for SliceBounds {
    fn from((start, stop, step): (usize, usize, usize)) -> Self {
        Self::new(start, (stop > 0).then_some(stop), step)
    }
}

impl From<Range<usize>> for SliceBounds {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, Some(range.end), 1)
    }
}

impl From<RangeFrom<usize>> for SliceBounds {
    fn from(range: RangeFrom<usize>) -> Self {
        Self::new(range.start, None, 1)
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Map every element through `f`
    pub fn map<F, U>(self, f: F) -> Stream<U>
    where
        F: FnMut(T, usize, &StreamHandle) -> U + Send + 'static,
        U: Send + 'static,
    {
        let config = self.config().clone();
        let parent = self.token().clone();
        spawn("map", config, &parent, move |out| run_map(self, out, f))
    }

    /// Keep the elements for which `predicate` holds
    pub fn filter<F>(self, predicate: F) -> Stream<T>
    where
        F: FnMut(&T, usize, &StreamHandle) -> bool + Send + 'static,
    {
        let config = self.config().clone();
        let parent = self.token().clone();
        spawn("filter", config, &parent, move |out| {
            run_filter(self, out, predicate)
        })
    }

    /// Emit elements while `predicate` holds, then close.
    ///
    /// The first failing element is discarded along with everything after it.
    pub fn take_while<F>(self, predicate: F) -> Stream<T>
    where
        F: FnMut(&T, usize, &StreamHandle) -> bool + Send + 'static,
    {
        let config = self.config().clone();
        let parent = self.token().clone();
        spawn("take_while", config, &parent, move |out| {
            run_take_while(self, out, predicate)
        })
    }

    /// Skip the leading run of elements for which `predicate` holds.
    ///
    /// Once an element fails the predicate it is emitted along with every
    /// later element, without evaluating the predicate again.
    pub fn drop_while<F>(self, predicate: F) -> Stream<T>
    where
        F: FnMut(&T, usize, &StreamHandle) -> bool + Send + 'static,
    {
        let config = self.config().clone();
        let parent = self.token().clone();
        spawn("drop_while", config, &parent, move |out| {
            run_drop_while(self, out, predicate)
        })
    }

    /// Take a forward-only slice of the stream.
    ///
    /// ```rust
    /// use lazyweld::prelude::*;
    ///
    /// # tokio_test::block_on(async {
    /// let picked = count(0).slice((3, 11, 3)).list().await;
    /// assert_eq!(picked, vec![3, 6, 9]);
    /// # });
    /// ```
    pub fn slice(self, bounds: impl Into<SliceBounds>) -> Stream<T> {
        let bounds = bounds.into();
        let config = self.config().clone();
        let parent = self.token().clone();
        spawn("slice", config, &parent, move |out| {
            run_slice(self, out, bounds)
        })
    }

    /// Call `f` with each element spread into an argument list
    pub fn starmap<F, U>(self, f: F) -> Stream<U>
    where
        T: StarArgs,
        T::Arg: Send,
        F: FnMut(Vec<T::Arg>) -> U + Send + 'static,
        U: Send + 'static,
    {
        let config = self.config().clone();
        let parent = self.token().clone();
        spawn("starmap", config, &parent, move |out| {
            run_starmap(self, out, f)
        })
    }

    /// Emit the stream, then replay it forever.
    ///
    /// Every element is kept in memory; on an infinite upstream the replay
    /// never starts. An empty upstream gives an empty stream.
    pub fn cycle(self) -> Stream<T>
    where
        T: Clone,
    {
        let config = self.config().clone();
        let parent = self.token().clone();
        spawn("cycle", config, &parent, move |out| run_cycle(self, out))
    }
}

async fn run_map<T, U, F>(mut upstream: Stream<T>, out: Emitter<U>, mut f: F) -> Result<()>
where
    U: Send,
    F: FnMut(T, usize, &StreamHandle) -> U,
{
    let handle = upstream.handle().clone();
    let mut index = 0;
    while let Some(item) = out.pull(&mut upstream).await? {
        out.emit(f(item, index, &handle)).await?;
        index += 1;
    }
    Ok(())
}

async fn run_filter<T, F>(mut upstream: Stream<T>, out: Emitter<T>, mut predicate: F) -> Result<()>
where
    T: Send,
    F: FnMut(&T, usize, &StreamHandle) -> bool,
{
    let handle = upstream.handle().clone();
    let mut index = 0;
    while let Some(item) = out.pull(&mut upstream).await? {
        if predicate(&item, index, &handle) {
            out.emit(item).await?;
        }
        index += 1;
    }
    Ok(())
}

async fn run_take_while<T, F>(
    mut upstream: Stream<T>,
    out: Emitter<T>,
    mut predicate: F,
) -> Result<()>
where
    T: Send,
    F: FnMut(&T, usize, &StreamHandle) -> bool,
{
    let handle = upstream.handle().clone();
    let mut index = 0;
    while let Some(item) = out.pull(&mut upstream).await? {
        if !predicate(&item, index, &handle) {
            break;
        }
        out.emit(item).await?;
        index += 1;
    }
    Ok(())
}

async fn run_drop_while<T, F>(
    mut upstream: Stream<T>,
    out: Emitter<T>,
    mut predicate: F,
) -> Result<()>
where
    T: Send,
    F: FnMut(&T, usize, &StreamHandle) -> bool,
{
    let handle = upstream.handle().clone();
    let mut index = 0;
    while let Some(item) = out.pull(&mut upstream).await? {
        if !predicate(&item, index, &handle) {
            out.emit(item).await?;
            break;
        }
        index += 1;
    }

    while let Some(item) = out.pull(&mut upstream).await? {
        out.emit(item).await?;
    }
    Ok(())
}

async fn run_slice<T: Send>(mut upstream: Stream<T>, out: Emitter<T>, bounds: SliceBounds) -> Result<()> {
    let mut index = 0;
    // The element at `stop` is never pulled
    while !bounds.exhausted_at(index) {
        let Some(item) = out.pull(&mut upstream).await? else {
            break;
        };
        if bounds.selects(index) {
            out.emit(item).await?;
        }
        index += 1;
    }
    Ok(())
}

async fn run_starmap<T, U, F>(mut upstream: Stream<T>, out: Emitter<U>, mut f: F) -> Result<()>
where
    T: StarArgs,
    T::Arg: Send,
    U: Send,
    F: FnMut(Vec<T::Arg>) -> U,
{
    while let Some(item) = out.pull(&mut upstream).await? {
        out.emit(f(item.into_args())).await?;
    }
    Ok(())
}

async fn run_cycle<T: Clone + Send>(mut upstream: Stream<T>, out: Emitter<T>) -> Result<()> {
    let mut seen = Vec::new();
    while let Some(item) = out.pull(&mut upstream).await? {
        seen.push(item.clone());
        out.emit(item).await?;
    }
    drop(upstream);

    if seen.is_empty() {
        return Ok(());
    }
    loop {
        for i in 0..seen.len() {
            let item = seen[i].clone();
            out.emit(item).await?;
        }
    }
}
