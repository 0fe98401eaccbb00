//! Fan-out: splitting one stream into several independent streams.
//!
//! A tee reads its upstream once per element and lets every output consume
//! at its own pace. Elements live in one shared log; each output keeps a
//! cursor into it, and the head of the log is trimmed as soon as every live
//! output has moved past it. Memory use is therefore the distance between
//! the fastest and the slowest output, optionally capped with
//! [`StreamConfig::max_tee_lag`](crate::core::StreamConfig::max_tee_lag).

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use crate::core::stream::{spawn, Emitter};
use crate::core::{Result, Stream, StreamConfig};

/// The shared element log
struct TeeLog<T> {
    items: VecDeque<T>,
    /// Absolute position of `items[0]`
    base: usize,
    /// Absolute read position per output; `None` once the output is gone
    cursors: Vec<Option<usize>>,
    exhausted: bool,
}

impl<T: Clone> TeeLog<T> {
    fn new(outputs: usize) -> Self {
        Self {
            items: VecDeque::new(),
            base: 0,
            cursors: vec![Some(0); outputs],
            exhausted: false,
        }
    }

    fn tail(&self) -> usize {
        self.base + self.items.len()
    }

    fn has_pending(&self, slot: usize) -> bool {
        self.cursors[slot].is_some_and(|cursor| cursor < self.tail())
    }

    /// Take the next element for `slot`, if one is buffered
    fn take(&mut self, slot: usize) -> Option<T> {
        let cursor = self.cursors[slot]?;
        let item = self.items.get(cursor - self.base)?.clone();
        self.cursors[slot] = Some(cursor + 1);
        self.trim();
        Some(item)
    }

    fn release(&mut self, slot: usize) {
        self.cursors[slot] = None;
        self.trim();
    }

    /// Drop elements every live output has already read
    fn trim(&mut self) {
        let oldest = self
            .cursors
            .iter()
            .flatten()
            .min()
            .copied()
            .unwrap_or_else(|| self.tail());
        while self.base < oldest {
            self.items.pop_front();
            self.base += 1;
        }
    }
}

struct TeeShared<T> {
    log: Mutex<TeeLog<T>>,
    /// Held by whichever output is pulling the next element
    upstream: Mutex<Stream<T>>,
    /// Signalled whenever an output advances or leaves
    advanced: Notify,
    max_lag: Option<usize>,
}

impl<T: Clone + Send> TeeShared<T> {
    /// Next element for `slot`, pulling from upstream when it is caught up.
    ///
    /// Returns `None` once upstream is exhausted and the slot has read
    /// everything before that.
    async fn next_for(&self, slot: usize, out: &Emitter<T>) -> Result<Option<T>> {
        loop {
            {
                let mut log = self.log.lock().await;
                if let Some(item) = log.take(slot) {
                    drop(log);
                    self.advanced.notify_waiters();
                    return Ok(Some(item));
                }
                if log.exhausted {
                    return Ok(None);
                }
            }

            let mut upstream = out.wait(self.upstream.lock()).await?;

            // Another output may have pulled while we waited for the lock
            let log = self.log.lock().await;
            if log.has_pending(slot) || log.exhausted {
                continue;
            }

            if let Some(max_lag) = self.max_lag {
                if log.items.len() >= max_lag {
                    let advanced = self.advanced.notified();
                    drop(log);
                    drop(upstream);
                    out.wait(advanced).await?;
                    continue;
                }
            }
            drop(log);

            let pulled = out.pull(&mut upstream).await?;
            let mut log = self.log.lock().await;
            match pulled {
                Some(item) => log.items.push_back(item),
                None => log.exhausted = true,
            }
        }
    }

    async fn release(&self, slot: usize) {
        self.log.lock().await.release(slot);
        self.advanced.notify_waiters();
    }
}

impl<T: Clone + Send + 'static> Stream<T> {
    /// Split this stream into `n` streams that each yield every element.
    ///
    /// ```rust
    /// use lazyweld::prelude::*;
    ///
    /// # tokio_test::block_on(async {
    /// let mut outputs = stream![3, 4, 5].tee(3);
    /// for output in outputs.drain(..) {
    ///     assert_eq!(output.list().await, vec![3, 4, 5]);
    /// }
    /// # });
    /// ```
    pub fn tee(self, n: usize) -> Vec<Stream<T>> {
        if n == 0 {
            return Vec::new();
        }
        let tee = Tee::new(self, n);
        (0..n).map(|slot| tee.output(slot)).collect()
    }

    /// Split this stream in two
    pub fn tee2(self) -> (Stream<T>, Stream<T>) {
        let tee = Tee::new(self, 2);
        (tee.output(0), tee.output(1))
    }
}

/// Shared state plus what every output inherits from the upstream
struct Tee<T> {
    shared: Arc<TeeShared<T>>,
    config: StreamConfig,
    parent: CancellationToken,
}

impl<T: Clone + Send + 'static> Tee<T> {
    fn new(upstream: Stream<T>, outputs: usize) -> Self {
        let config = upstream.config().clone();
        let parent = upstream.token().clone();
        let shared = Arc::new(TeeShared {
            log: Mutex::new(TeeLog::new(outputs)),
            upstream: Mutex::new(upstream),
            advanced: Notify::new(),
            max_lag: config.max_tee_lag,
        });
        Self {
            shared,
            config,
            parent,
        }
    }

    /// Spawn the task feeding output `slot`
    fn output(&self, slot: usize) -> Stream<T> {
        let shared = self.shared.clone();
        spawn("tee", self.config.clone(), &self.parent, move |out| {
            run_tee(shared, slot, out)
        })
    }
}

async fn run_tee<T: Clone + Send>(shared: Arc<TeeShared<T>>, slot: usize, out: Emitter<T>) -> Result<()> {
    let outcome = feed_tee(&shared, slot, &out).await;
    shared.release(slot).await;
    outcome
}

async fn feed_tee<T: Clone + Send>(shared: &TeeShared<T>, slot: usize, out: &Emitter<T>) -> Result<()> {
    while let Some(item) = shared.next_for(slot, out).await? {
        out.emit(item).await?;
    }
    Ok(())
}
