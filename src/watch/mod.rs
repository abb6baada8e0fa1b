//! Change detection on top of a polled clipboard counter
//!
//! Each watch session runs on its own thread, sleeps between ticks on its
//! [`CancellationToken`] and emits into a single-slot channel. Emitting never
//! blocks: while the slot is full new events are dropped, so a slow consumer
//! sees the oldest unconsumed event, not the latest one.

pub mod cancel;
pub mod double_submit;
pub mod monitor;
pub mod options;
pub mod watcher;

use std::sync::mpsc::{SyncSender, TrySendError};

pub use cancel::CancellationToken;
pub use double_submit::DoubleSubmitDetector;
pub use monitor::ChangeSignal;
pub use options::{DoubleSubmitOptions, WatchOptions};
pub use watcher::{ChangeWatcher, Poll};

/// Outcome of a non-blocking emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Emit {
    Sent,
    /// Slot still occupied, event discarded
    Dropped,
    /// Receiver gone, the session should end
    Closed,
}

pub(crate) fn emit<T>(tx: &SyncSender<T>, value: T) -> Emit {
    match tx.try_send(value) {
        Ok(()) => Emit::Sent,
        Err(TrySendError::Full(_)) => Emit::Dropped,
        Err(TrySendError::Disconnected(_)) => Emit::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_emit_keeps_oldest_when_full() {
        let (tx, rx) = mpsc::sync_channel(1);
        assert_eq!(emit(&tx, 1), Emit::Sent);
        assert_eq!(emit(&tx, 2), Emit::Dropped);
        assert_eq!(rx.recv().unwrap(), 1);

        drop(rx);
        assert_eq!(emit(&tx, 3), Emit::Closed);
    }
}
