use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use std::time::Duration;

use super::{CancellationToken, Emit, emit};
use crate::clipboard::{Format, SharedBackend};

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// Counter unchanged, nothing was read
    Unchanged,
    /// Counter moved and the new payload was read
    Changed(Vec<u8>),
    /// Counter moved but the format was absent or the read failed
    Unreadable,
}

/// Detects counter changes for one format and reads each change once
#[derive(Debug)]
pub struct ChangeWatcher {
    format: Format,
    last_count: i64,
}

impl ChangeWatcher {
    /// Create a watcher, capturing the current counter as the baseline
    pub fn new(backend: &SharedBackend, format: Format) -> Self {
        ChangeWatcher {
            format,
            last_count: backend.change_count(),
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn last_count(&self) -> i64 {
        self.last_count
    }

    /// Sample the counter and read the payload if it moved
    ///
    /// The baseline advances on every detected change, readable or not, so
    /// an unreadable change is reported once and not retried.
    pub fn poll(&mut self, backend: &SharedBackend) -> Poll {
        let current = backend.change_count();
        if current == self.last_count {
            return Poll::Unchanged;
        }

        log::trace!(
            "{} counter moved {} -> {}",
            self.format,
            self.last_count,
            current
        );
        self.last_count = current;

        match backend.read(self.format) {
            Ok(Some(payload)) => Poll::Changed(payload),
            Ok(None) => {
                log::debug!("{} changed but is absent, skipping", self.format);
                Poll::Unreadable
            }
            Err(e) => {
                log::debug!("{} changed but read failed: {}", self.format, e);
                Poll::Unreadable
            }
        }
    }
}

/// Start a raw watch session on its own thread
/// The stream closes once `cancel` fires or the receiver is dropped
pub(crate) fn spawn(
    backend: Arc<SharedBackend>,
    cancel: CancellationToken,
    format: Format,
    interval: Duration,
) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::sync_channel(1);
    let watcher = ChangeWatcher::new(&backend, format);

    let spawned = thread::Builder::new()
        .name(format!("clipwatch-{format}"))
        .spawn(move || run(&backend, &cancel, watcher, interval, &tx));
    if let Err(e) = spawned {
        log::error!("Failed to spawn {} watcher: {}", format, e);
    }
    rx
}

fn run(
    backend: &SharedBackend,
    cancel: &CancellationToken,
    mut watcher: ChangeWatcher,
    interval: Duration,
    tx: &SyncSender<Vec<u8>>,
) {
    log::info!(
        "Watching {} clipboard every {:?} from count {}",
        watcher.format(),
        interval,
        watcher.last_count()
    );

    while !cancel.wait_timeout(interval) {
        let Poll::Changed(payload) = watcher.poll(backend) else {
            continue;
        };

        let len = payload.len();
        match emit(tx, payload) {
            Emit::Sent => log::trace!("Emitted {} bytes {}", len, watcher.format()),
            Emit::Dropped => log::debug!("Consumer busy, dropped {} change", watcher.format()),
            Emit::Closed => {
                log::debug!("{} receiver dropped", watcher.format());
                break;
            }
        }
    }

    log::info!("Stopped watching {} clipboard", watcher.format());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryBackend;
    use std::sync::mpsc::RecvTimeoutError;

    fn shared() -> (Arc<MemoryBackend>, Arc<SharedBackend>) {
        let memory = Arc::new(MemoryBackend::new());
        let shared = Arc::new(SharedBackend::new(Box::new(Arc::clone(&memory))));
        (memory, shared)
    }

    #[test]
    fn test_no_read_while_counter_unchanged() {
        let (memory, shared) = shared();
        memory.copy(Format::Text, "already there");
        let mut watcher = ChangeWatcher::new(&shared, Format::Text);

        for _ in 0..10 {
            assert_eq!(watcher.poll(&shared), Poll::Unchanged);
        }
        assert_eq!(memory.read_calls(), 0);
    }

    #[test]
    fn test_one_read_per_counter_change() {
        let (memory, shared) = shared();
        let mut watcher = ChangeWatcher::new(&shared, Format::Text);

        // Several increments between polls still cost a single read
        memory.copy(Format::Text, "a");
        memory.copy(Format::Text, "b");
        memory.copy(Format::Text, "c");
        assert_eq!(watcher.poll(&shared), Poll::Changed(b"c".to_vec()));
        assert_eq!(watcher.poll(&shared), Poll::Unchanged);
        assert_eq!(memory.read_calls(), 1);

        memory.copy(Format::Text, "d");
        assert_eq!(watcher.poll(&shared), Poll::Changed(b"d".to_vec()));
        assert_eq!(watcher.poll(&shared), Poll::Unchanged);
        assert_eq!(memory.read_calls(), 2);
        assert_eq!(watcher.last_count(), 4);
    }

    #[test]
    fn test_unreadable_change_advances_baseline() {
        let (memory, shared) = shared();
        let mut watcher = ChangeWatcher::new(&shared, Format::Text);

        memory.copy(Format::Image, vec![1, 2, 3]);
        assert_eq!(watcher.poll(&shared), Poll::Unreadable);
        // Not retried on the next tick
        assert_eq!(watcher.poll(&shared), Poll::Unchanged);
        assert_eq!(memory.read_calls(), 1);
    }

    #[test]
    fn test_failed_read_is_not_fatal() {
        let (memory, shared) = shared();
        let mut watcher = ChangeWatcher::new(&shared, Format::Text);

        memory.set_fail_reads(true);
        memory.copy(Format::Text, "lost");
        assert_eq!(watcher.poll(&shared), Poll::Unreadable);

        memory.set_fail_reads(false);
        memory.copy(Format::Text, "found");
        assert_eq!(watcher.poll(&shared), Poll::Changed(b"found".to_vec()));
    }

    #[test]
    fn test_empty_payload_is_a_change() {
        let (memory, shared) = shared();
        let mut watcher = ChangeWatcher::new(&shared, Format::Text);

        memory.set_content(Format::Text, Some(Vec::new()));
        assert_eq!(watcher.poll(&shared), Poll::Changed(Vec::new()));
    }

    #[test]
    fn test_slow_consumer_keeps_oldest_event() {
        let (memory, shared) = shared();
        let cancel = CancellationToken::new();
        let events = spawn(
            Arc::clone(&shared),
            cancel.clone(),
            Format::Text,
            Duration::from_millis(5),
        );

        memory.copy(Format::Text, "oldest");
        thread::sleep(Duration::from_millis(60));
        memory.copy(Format::Text, "newer");
        thread::sleep(Duration::from_millis(60));

        assert_eq!(events.recv().unwrap(), b"oldest".to_vec());
        assert_eq!(
            events.recv_timeout(Duration::from_millis(60)),
            Err(RecvTimeoutError::Timeout)
        );

        cancel.cancel();
        assert_eq!(
            events.recv_timeout(Duration::from_secs(5)),
            Err(RecvTimeoutError::Disconnected)
        );
    }

    #[test]
    fn test_cancelled_before_start_closes_stream() {
        let (_memory, shared) = shared();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let events = spawn(shared, cancel, Format::Image, Duration::from_secs(60));
        assert!(events.recv_timeout(Duration::from_secs(5)).is_err());
    }
}
