use std::cell::Cell;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use super::CancellationToken;
use crate::clipboard::SharedBackend;

/// One-shot "was my write overwritten" signal returned by a write
///
/// A background monitor samples the change counter until it moves past the
/// post-write baseline, the optional timeout runs out, or the signal is
/// abandoned. Dropping the signal abandons it.
#[derive(Debug)]
pub struct ChangeSignal {
    rx: Receiver<()>,
    cancel: CancellationToken,
    fired: Cell<bool>,
}

impl ChangeSignal {
    /// Block until the monitor ends
    /// Returns `true` if the clipboard changed after the write
    pub fn wait(&self) -> bool {
        if self.rx.recv().is_ok() {
            self.fired.set(true);
        }
        self.fired.get()
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`
    /// Returns `None` while the monitor is still running
    pub fn wait_timeout(&self, timeout: Duration) -> Option<bool> {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                self.fired.set(true);
                Some(true)
            }
            Err(RecvTimeoutError::Timeout) => self.fired.get().then_some(true),
            Err(RecvTimeoutError::Disconnected) => Some(self.fired.get()),
        }
    }

    /// Non-blocking check
    pub fn is_overwritten(&self) -> bool {
        match self.rx.try_recv() {
            Ok(()) => self.fired.set(true),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => {}
        }
        self.fired.get()
    }

    /// Stop the monitor without waiting for a change
    pub fn abandon(self) {
        // Drop does the work
    }
}

impl Drop for ChangeSignal {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start a write monitor comparing against `baseline`
pub(crate) fn spawn(
    backend: Arc<SharedBackend>,
    baseline: i64,
    interval: Duration,
    timeout: Option<Duration>,
) -> ChangeSignal {
    let (tx, rx) = mpsc::sync_channel(1);
    let cancel = CancellationToken::new();
    let monitor_cancel = cancel.clone();
    let deadline = timeout.map(|timeout| Instant::now() + timeout);

    let spawned = thread::Builder::new()
        .name("clipwatch-monitor".to_string())
        .spawn(move || {
            loop {
                if monitor_cancel.wait_timeout(interval) {
                    log::trace!("Write monitor abandoned");
                    return;
                }
                let current = backend.change_count();
                if current != baseline {
                    log::debug!("Written content replaced (count {} -> {})", baseline, current);
                    let _ = tx.try_send(());
                    return;
                }
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    log::debug!("Write monitor timed out at count {}", baseline);
                    return;
                }
            }
        });
    if let Err(e) = spawned {
        log::error!("Failed to spawn write monitor: {}", e);
    }

    ChangeSignal {
        rx,
        cancel,
        fired: Cell::new(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{Format, MemoryBackend};

    const TICK: Duration = Duration::from_millis(5);

    fn shared() -> (Arc<MemoryBackend>, Arc<SharedBackend>) {
        let memory = Arc::new(MemoryBackend::new());
        let shared = Arc::new(SharedBackend::new(Box::new(Arc::clone(&memory))));
        (memory, shared)
    }

    #[test]
    fn test_fires_once_on_change() {
        let (memory, shared) = shared();
        let signal = spawn(Arc::clone(&shared), shared.change_count(), TICK, None);

        memory.bump();
        assert!(signal.wait());
        // Channel is closed after firing, the answer sticks
        assert!(signal.wait());
        assert_eq!(signal.wait_timeout(TICK), Some(true));
    }

    #[test]
    fn test_timeout_ends_without_firing() {
        let (_memory, shared) = shared();
        let signal = spawn(
            Arc::clone(&shared),
            shared.change_count(),
            TICK,
            Some(Duration::from_millis(20)),
        );

        assert!(!signal.wait());
        assert!(!signal.is_overwritten());
    }

    #[test]
    fn test_abandon_stops_monitor() {
        let (memory, shared) = shared();
        let signal = spawn(
            Arc::clone(&shared),
            shared.change_count(),
            Duration::from_secs(60),
            None,
        );

        let start = Instant::now();
        signal.abandon();
        // The monitor thread held the only other Arc; once it is gone the
        // count drops back to one
        while Arc::strong_count(&shared) > 1 {
            assert!(start.elapsed() < Duration::from_secs(5), "monitor leaked");
            thread::sleep(TICK);
        }
        memory.copy(Format::Text, "late");
    }
}
