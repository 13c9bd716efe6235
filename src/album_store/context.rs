//! Per-call deadline and cancellation for store operations.
//!
//! A [`CallContext`] bounds three phases of a call: before the pool is
//! touched, while waiting for a pooled connection, and while a statement is
//! running on the borrowed connection.

use super::error::{OpLabel, StoreError};
use r2d2::{ManageConnection, Pool, PooledConnection};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Longest single wait on the pool before cancellation is re-checked.
const CHECKOUT_SLICE: Duration = Duration::from_millis(50);

/// Polling interval of the in-flight watcher.
const WATCH_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone, Debug, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl CallContext {
    /// A context with no deadline that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().with_deadline(Instant::now() + timeout)
    }

    /// Sets the deadline, keeping an earlier one if already present.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// The error a call labelled `op` should return if this context has been
    /// aborted, cancellation taking precedence over the deadline.
    pub(crate) fn abort_error(&self, op: &OpLabel) -> Option<StoreError> {
        if self.is_cancelled() {
            Some(op.cancelled())
        } else if self.is_expired() {
            Some(op.deadline_exceeded())
        } else {
            None
        }
    }

    pub(crate) fn check(&self, op: &OpLabel) -> Result<(), StoreError> {
        match self.abort_error(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Replaces `err` with the abort error when the context was cancelled or
    /// expired while the call was running.
    pub(crate) fn resolve(&self, op: &OpLabel, err: StoreError) -> StoreError {
        self.abort_error(op).unwrap_or(err)
    }

    /// Borrows a connection from `pool`, waiting at most `acquire_timeout`
    /// and never past the deadline.
    pub(crate) fn checkout<M: ManageConnection>(
        &self,
        pool: &Pool<M>,
        op: &OpLabel,
        acquire_timeout: Duration,
    ) -> Result<PooledConnection<M>, StoreError> {
        self.check(op)?;

        let mut give_up = Instant::now() + acquire_timeout;
        if let Some(deadline) = self.deadline {
            give_up = give_up.min(deadline);
        }

        loop {
            let slice = give_up
                .saturating_duration_since(Instant::now())
                .min(CHECKOUT_SLICE);
            match pool.get_timeout(slice) {
                Ok(conn) => return Ok(conn),
                Err(err) => {
                    self.check(op)?;
                    if Instant::now() >= give_up {
                        return Err(op.connection(err));
                    }
                }
            }
        }
    }

    /// Starts a watcher that runs `interrupt` once if the context is cancelled
    /// or expires before the returned guard is dropped.
    ///
    /// Returns `None` for contexts that can never abort.
    pub(crate) fn watch<F>(&self, op: &OpLabel, interrupt: F) -> Option<InterruptWatcher>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.deadline.is_none() && self.cancel.is_none() {
            return None;
        }
        InterruptWatcher::spawn(self.clone(), op.op(), interrupt)
    }
}

/// Guard for a running statement; dropping it stops the watcher thread.
///
/// Drop the guard before returning the connection to the pool, so an
/// interrupt can never reach the connection's next borrower.
pub(crate) struct InterruptWatcher {
    done: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl InterruptWatcher {
    fn spawn<F>(ctx: CallContext, op: &'static str, interrupt: F) -> Option<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let mut interrupt = Some(interrupt);

        let spawned = thread::Builder::new()
            .name(format!("{op}-watch"))
            .spawn(move || loop {
                let wait = ctx
                    .remaining()
                    .map_or(WATCH_INTERVAL, |left| left.min(WATCH_INTERVAL));
                match done_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {
                        if ctx.is_cancelled() || ctx.is_expired() {
                            debug!("Interrupting {} in flight", op);
                            if let Some(interrupt) = interrupt.take() {
                                interrupt();
                            }
                            return;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            });

        match spawned {
            Ok(handle) => Some(InterruptWatcher {
                done: Some(done_tx),
                handle: Some(handle),
            }),
            Err(err) => {
                warn!("Failed to spawn watcher for {}: {}", op, err);
                None
            }
        }
    }
}

impl Drop for InterruptWatcher {
    fn drop(&mut self) {
        drop(self.done.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
