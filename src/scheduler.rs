//! # Update Scheduler
//!
//! At most one recomputation is ever outstanding. Arming a new update
//! replaces the previous one: the old token is cancelled before the new
//! timer starts, so a burst of reschedules (config change racing a day
//! boundary, say) coalesces into a single pending callback instead of a
//! backlog of stale ones.
//!
//! The real scheduler parks a worker thread on a channel with a timeout:
//! a timeout means the delay elapsed and the callback runs; a message or a
//! hangup means the token was cancelled and the worker exits without
//! running anything. [`FakeScheduler`] records the same traffic for tests
//! that need to fire or inspect updates deterministically.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use tracing::trace;

use crate::Timing;

/// Deferred recomputation callback.
pub type BoxedUpdate = Box<dyn FnOnce() + Send + 'static>;

/// Arms a callback to run once after a delay.
pub trait Scheduler {
    fn schedule(&self, delay: Duration, callback: BoxedUpdate) -> CancelToken;
}

/// Handle to one armed callback.
///
/// Cancelling (or just dropping) the token prevents the callback from
/// running; a token whose callback already fired is inert. Hold the token
/// for as long as the update should stay armed.
pub struct CancelToken {
    cancel: Option<BoxedUpdate>,
}

impl CancelToken {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        CancelToken {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A token with nothing behind it.
    pub fn inert() -> Self {
        CancelToken { cancel: None }
    }

    /// Cancel the armed callback. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for CancelToken {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Scheduler backed by one short-lived thread per armed update.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, callback: BoxedUpdate) -> CancelToken {
        let (tx, rx) = channel::<()>();
        thread::spawn(move || match rx.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => callback(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                trace!("armed update cancelled before firing");
            }
        });
        // The token keeps the sender alive; cancelling wakes the parked
        // worker, which exits without running the callback.
        CancelToken::new(move || {
            let _ = tx.send(());
        })
    }
}

/// The single pending update, with replace semantics.
pub struct UpdateChain<S> {
    scheduler: S,
    pending: Option<CancelToken>,
}

impl<S: Scheduler> UpdateChain<S> {
    pub fn new(scheduler: S) -> Self {
        UpdateChain {
            scheduler,
            pending: None,
        }
    }

    /// Arm `callback` after `delay`, cancelling whatever was pending.
    pub fn arm(&mut self, delay: Duration, callback: BoxedUpdate) {
        self.disarm();
        self.pending = Some(self.scheduler.schedule(delay, callback));
    }

    /// Cancel the pending update without arming a replacement.
    ///
    /// Dropping the chain has the same effect: the held token cancels on
    /// drop, so a dying chain never leaves a live timer behind.
    pub fn disarm(&mut self) {
        if let Some(mut pending) = self.pending.take() {
            pending.cancel();
        }
    }
}

/// Time until the next recomputation boundary: the first event strictly
/// after `now`, or the next civil midnight when every event has passed
/// (the window rolls forward there).
pub fn delay_until_next_boundary(now: DateTime<FixedOffset>, timings: &[Timing]) -> Duration {
    let next = timings
        .iter()
        .map(|t| t.value)
        .filter(|value| *value > now)
        .min();
    let target = next.unwrap_or_else(|| next_midnight(now));
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

fn next_midnight(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    now.date_naive()
        .succ_opt()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| naive.and_local_timezone(*now.offset()).single())
        .unwrap_or_else(|| now + chrono::Duration::hours(24))
}

/// Test double: records every schedule request and lets a test fire or
/// inspect them without waiting on wall time. Clones share state, so the
/// instance handed to an [`UpdateChain`] can still be queried afterwards.
#[derive(Clone, Default)]
pub struct FakeScheduler {
    state: Arc<Mutex<Vec<FakeEntry>>>,
}

struct FakeEntry {
    delay: Duration,
    callback: Option<BoxedUpdate>,
    cancelled: Arc<AtomicBool>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every schedule request ever made, fired or not.
    pub fn scheduled_count(&self) -> usize {
        self.state.lock().unwrap().len()
    }

    /// Delays of the entries still armed.
    pub fn pending_delays(&self) -> Vec<Duration> {
        self.state
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.callback.is_some() && !e.cancelled.load(Ordering::SeqCst))
            .map(|e| e.delay)
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_delays().len()
    }

    /// Run every armed callback, consuming it. Returns how many ran.
    pub fn fire_all(&self) -> usize {
        let callbacks: Vec<BoxedUpdate> = {
            let mut state = self.state.lock().unwrap();
            state
                .iter_mut()
                .filter(|e| !e.cancelled.load(Ordering::SeqCst))
                .filter_map(|e| e.callback.take())
                .collect()
        };
        let fired = callbacks.len();
        for callback in callbacks {
            callback();
        }
        fired
    }
}

impl Scheduler for FakeScheduler {
    fn schedule(&self, delay: Duration, callback: BoxedUpdate) -> CancelToken {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.state.lock().unwrap().push(FakeEntry {
            delay,
            callback: Some(callback),
            cancelled: Arc::clone(&cancelled),
        });
        CancelToken::new(move || cancelled.store(true, Ordering::SeqCst))
    }
}
