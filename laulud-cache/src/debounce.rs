//! Cancellable timers and trailing-edge debouncing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Handle to a scheduled callback. Cancelling or dropping it before the
/// deadline prevents the callback from running.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `f` once after `delay`.
pub fn schedule<F>(delay: Duration, f: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    let deadline = Instant::now() + delay;
    TimerHandle {
        task: tokio::spawn(async move {
            sleep_until(deadline).await;
            f();
        }),
    }
}

/// Trailing-edge debouncer: a value is published only once `delay` has
/// passed without another push. Every push cancels the pending timer.
pub struct Debouncer<T> {
    delay: Duration,
    tx: Arc<watch::Sender<T>>,
    pending: Option<TimerHandle>,
}

impl<T: Send + Sync + 'static> Debouncer<T> {
    pub fn new(delay: Duration, initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            delay,
            tx: Arc::new(tx),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Receiver of settled values.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn push(&mut self, value: T) {
        self.cancel();
        let tx = Arc::clone(&self.tx);
        self.pending = Some(schedule(self.delay, move || {
            tx.send_replace(value);
        }));
    }

    /// Publish `value` now, dropping anything pending.
    pub fn flush(&mut self, value: T) {
        self.cancel();
        self.tx.send_replace(value);
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }
}

impl<T: Clone + Send + Sync + 'static> Debouncer<T> {
    /// Last published value.
    pub fn settled(&self) -> T {
        self.tx.borrow().clone()
    }
}
