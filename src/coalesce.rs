//! Write coalescing: a single-slot queue in front of one background writer.
//!
//! Mutations hand fully serialized snapshots to [`WriteCoalescer::submit`].
//! The writer thread performs at most one disk write at a time; snapshots
//! submitted while a write is in flight collapse into the single queued slot,
//! latest wins. A later snapshot always contains the effect of every earlier
//! one, so dropping the older queued bytes loses nothing: the file still
//! converges to the most recent submitted state, and memory held for queued
//! work stays bounded at one snapshot no matter how fast callers burst.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// A snapshot waiting to be written, plus everyone waiting on it.
struct Job {
    snapshot: Vec<u8>,
    waiters: Vec<Arc<ReceiptState>>,
}

/// Coalescer state machine. Idle: no job queued, nothing writing. Writing:
/// the writer thread is flushing a snapshot. Writing with a queued job: the
/// next write is already decided, later submissions only replace its bytes.
struct Slot {
    queued: Option<Job>,
    writing: bool,
    writes: u64,
    shutdown: bool,
}

struct Shared {
    slot: Mutex<Slot>,
    work: Condvar,
}

/// Serializes disk writes and collapses bursts into the latest snapshot.
///
/// Construct with [`start`](Self::start), passing the closure that performs
/// one full-file write. Dropping the coalescer signals the writer, drains any
/// queued snapshot, and joins the thread, which may block for one write.
pub struct WriteCoalescer {
    shared: Arc<Shared>,
    handle: Option<thread::JoinHandle<()>>,
}

impl WriteCoalescer {
    /// Spawn the writer thread. `write_fn` performs one complete write of a
    /// snapshot; an `Err` from it fails that write's receipts and is not
    /// retried.
    pub fn start<F>(write_fn: F) -> Self
    where
        F: Fn(&[u8]) -> Result<()> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                queued: None,
                writing: false,
                writes: 0,
                shutdown: false,
            }),
            work: Condvar::new(),
        });
        let thread_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || run_writer(&thread_shared, write_fn));
        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Queue `snapshot` for persistence and return a receipt for it.
    ///
    /// If a snapshot is already queued it is replaced; its receipts carry
    /// over to the new snapshot, which supersedes it.
    pub fn submit(&self, snapshot: Vec<u8>) -> WriteReceipt {
        let state = Arc::new(ReceiptState::new());
        let mut slot = self.shared.slot.lock();
        match slot.queued.as_mut() {
            Some(job) => {
                job.snapshot = snapshot;
                job.waiters.push(Arc::clone(&state));
            }
            None => {
                slot.queued = Some(Job {
                    snapshot,
                    waiters: vec![Arc::clone(&state)],
                });
                self.shared.work.notify_one();
            }
        }
        WriteReceipt { state }
    }

    /// Drop the queued snapshot, if any, without writing it. Its receipts
    /// resolve with [`Error::Discarded`]. Returns how many receipts were
    /// failed. A write already in flight is not affected.
    pub fn discard_queued(&self) -> usize {
        let job = self.shared.slot.lock().queued.take();
        match job {
            Some(job) => {
                let dropped = job.waiters.len();
                for waiter in job.waiters {
                    waiter.complete(Err(Error::Discarded));
                }
                dropped
            }
            None => 0,
        }
    }

    /// Number of disk writes started so far.
    pub fn write_count(&self) -> u64 {
        self.shared.slot.lock().writes
    }

    /// `true` when no write is in flight and nothing is queued.
    pub fn is_idle(&self) -> bool {
        let slot = self.shared.slot.lock();
        !slot.writing && slot.queued.is_none()
    }
}

impl Drop for WriteCoalescer {
    fn drop(&mut self) {
        {
            let mut slot = self.shared.slot.lock();
            slot.shutdown = true;
            self.shared.work.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for WriteCoalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.shared.slot.lock();
        f.debug_struct("WriteCoalescer")
            .field("writing", &slot.writing)
            .field("queued", &slot.queued.is_some())
            .field("writes", &slot.writes)
            .finish()
    }
}

fn run_writer<F>(shared: &Shared, write_fn: F)
where
    F: Fn(&[u8]) -> Result<()>,
{
    let mut slot = shared.slot.lock();
    loop {
        while slot.queued.is_none() && !slot.shutdown {
            shared.work.wait(&mut slot);
        }
        // On shutdown a still-queued snapshot gets one final write before
        // the thread exits, so accepted work is never abandoned.
        let Some(job) = slot.queued.take() else {
            break;
        };
        slot.writing = true;
        slot.writes += 1;
        drop(slot);

        let result = write_fn(&job.snapshot);
        if let Err(e) = &result {
            tracing::error!(error = %e, "background write failed");
        }

        slot = shared.slot.lock();
        if slot.queued.is_none() {
            slot.writing = false;
        }
        for waiter in job.waiters {
            waiter.complete(result.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

struct ReceiptState {
    outcome: Mutex<Option<Result<()>>>,
    done: Condvar,
}

impl ReceiptState {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn complete(&self, result: Result<()>) {
        let mut outcome = self.outcome.lock();
        *outcome = Some(result);
        self.done.notify_all();
    }
}

/// Completion handle for one mutation's persistence request.
///
/// Resolves `Ok(())` once a write containing the mutation (or a later state
/// that supersedes it) has reached disk, `Err` if that write failed or a
/// reload discarded it first. Because requests coalesce, several receipts
/// routinely resolve off the same physical write. Dropping a receipt is fine;
/// the write still happens.
pub struct WriteReceipt {
    state: Arc<ReceiptState>,
}

impl WriteReceipt {
    /// Block until the write resolves and return its outcome.
    pub fn wait(&self) -> Result<()> {
        let mut outcome = self.state.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.state.done.wait(&mut outcome);
        }
    }

    /// Block up to `timeout`. `None` means the write is still outstanding.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<()>> {
        let deadline = Instant::now() + timeout;
        let mut outcome = self.state.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return Some(result.clone());
            }
            if self.state.done.wait_until(&mut outcome, deadline).timed_out() {
                return outcome.clone();
            }
        }
    }

    /// Current outcome without blocking.
    pub fn try_wait(&self) -> Option<Result<()>> {
        self.state.outcome.lock().clone()
    }
}

impl std::fmt::Debug for WriteReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteReceipt")
            .field("resolved", &self.try_wait().is_some())
            .finish()
    }
}
