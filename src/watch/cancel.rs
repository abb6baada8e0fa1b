use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation signal shared between a caller and its sessions
///
/// Clones observe the same signal. Sessions sleep between ticks in
/// [`CancellationToken::wait_timeout`], so cancelling wakes them at once.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation and wake every waiter
    pub fn cancel(&self) {
        let (lock, condvar) = &*self.inner;
        *lock.lock() = true;
        condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Sleep for `timeout` unless cancelled first
    /// Returns `true` if the token is cancelled
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, condvar) = &*self.inner;
        let mut cancelled = lock.lock();
        if !*cancelled {
            // Spurious wakeups only shorten a tick
            let _timed_out = condvar.wait_for(&mut cancelled, timeout);
        }
        *cancelled
    }

    /// Block until cancelled
    pub fn wait(&self) {
        let (lock, condvar) = &*self.inner;
        let mut cancelled = lock.lock();
        while !*cancelled {
            condvar.wait(&mut cancelled);
        }
    }
}
