//! Parallel per-frame scheduling
//!
//! [`FramePool`] runs one task per frame index on a rayon thread pool and hands
//! results to a sink strictly in frame-index order, through a
//! [`ReorderBuffer`]. Cancellation is cooperative: a [`CancelToken`] is
//! checked before a frame starts, never in the middle of one.

use crate::{JobError, JobResult, Stage};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use tracing::debug;

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; frames already running finish
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(JobError::Cancelled)` once cancelled
    pub fn check(&self) -> JobResult<()> {
        if self.is_cancelled() {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Releases items in increasing index order, whatever order they arrive in
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: u32,
    pending: BTreeMap<u32, T>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    /// Buffer expecting index 0 first
    pub fn new() -> Self {
        ReorderBuffer {
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Store an item
    ///
    /// Returns `false`, dropping the item, if `index` was already released
    /// or is already pending.
    pub fn insert(&mut self, index: u32, item: T) -> bool {
        if index < self.next || self.pending.contains_key(&index) {
            return false;
        }
        self.pending.insert(index, item);
        true
    }

    /// Take the next item if it has arrived
    pub fn pop_ready(&mut self) -> Option<(u32, T)> {
        let item = self.pending.remove(&self.next)?;
        let index = self.next;
        self.next += 1;
        Some((index, item))
    }

    /// Index that will be released next
    pub fn next_index(&self) -> u32 {
        self.next
    }

    /// Number of items waiting for an earlier index
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Thread pool for per-frame work
pub struct FramePool {
    pool: rayon::ThreadPool,
}

impl FramePool {
    /// Create a pool with `workers` threads, or one per core when `None`
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Validation`] for zero workers and
    /// [`JobError::Collaborator`] if the threads cannot be started.
    pub fn new(workers: Option<usize>) -> JobResult<Self> {
        let n = match workers {
            Some(0) => return Err(JobError::validation("workers", "must be at least 1")),
            Some(n) => n,
            None => std::thread::available_parallelism().map_or(1, |n| n.get()),
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("vrstereo-frame-{}", i))
            .build()
            .map_err(|e| JobError::collaborator(Stage::Synthesize, e.to_string()))?;
        Ok(FramePool { pool })
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `work` on every index in `0..count` in parallel, feeding `sink`
    /// in index order
    ///
    /// `work` loads its own frame, so only frames being worked on are in
    /// memory.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of frames
    /// * `cancel` - Checked before each frame starts
    /// * `work` - Per-frame task; runs on pool threads
    /// * `sink` - Receives `(index, result)` on the calling thread, in
    ///   strictly increasing index order
    ///
    /// # Errors
    ///
    /// The first error of `work` or `sink` stops the run: frames not yet
    /// started are skipped and the error is returned once running frames
    /// finish. A cancelled run returns [`JobError::Cancelled`].
    pub fn run_ordered<R, W, S>(
        &self,
        count: usize,
        cancel: &CancelToken,
        work: W,
        mut sink: S,
    ) -> JobResult<()>
    where
        R: Send,
        W: Fn(u32) -> JobResult<R> + Sync,
        S: FnMut(u32, R) -> JobResult<()>,
    {
        let stop = AtomicBool::new(false);
        let mut first_err: Option<JobError> = None;
        let mut buffer = ReorderBuffer::new();

        self.pool.in_place_scope(|scope| {
            let (tx, rx) = mpsc::channel::<(u32, Option<JobResult<R>>)>();
            for index in 0..count as u32 {
                let tx = tx.clone();
                let (work, stop) = (&work, &stop);
                scope.spawn(move |_| {
                    let result = if stop.load(Ordering::SeqCst) || cancel.is_cancelled() {
                        None
                    } else {
                        let r = work(index);
                        if r.is_err() {
                            stop.store(true, Ordering::SeqCst);
                        }
                        Some(r)
                    };
                    let _ = tx.send((index, result));
                });
            }
            drop(tx);

            for (index, result) in rx {
                match result {
                    Some(Ok(value)) if first_err.is_none() => {
                        buffer.insert(index, value);
                        while let Some((i, v)) = buffer.pop_ready() {
                            if let Err(e) = sink(i, v) {
                                stop.store(true, Ordering::SeqCst);
                                first_err = Some(e);
                                break;
                            }
                        }
                    }
                    Some(Err(e)) if first_err.is_none() => {
                        debug!(frame = index, error = %e, "frame failed");
                        stop.store(true, Ordering::SeqCst);
                        first_err = Some(e);
                    }
                    _ => {}
                }
            }
        });

        if let Some(e) = first_err {
            return Err(e);
        }
        cancel.check()?;
        debug_assert_eq!(buffer.next_index() as usize, count);
        Ok(())
    }
}
