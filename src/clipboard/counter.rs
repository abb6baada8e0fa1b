use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Change counter advanced by a host event source
///
/// A listener calls [`EventCounter::bump`] once per clipboard ownership
/// change, so copying identical content again still moves the counter.
#[derive(Debug, Default)]
pub struct EventCounter {
    count: Mutex<i64>,
    changed: Condvar,
}

impl EventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> i64 {
        *self.count.lock()
    }

    /// Record one change and wake waiters
    pub fn bump(&self) -> i64 {
        let mut count = self.count.lock();
        *count += 1;
        self.changed.notify_all();
        *count
    }

    /// Block until the counter moves past `seen` or `timeout` runs out
    /// Returns the value at that point
    pub fn wait_past(&self, seen: i64, timeout: Duration) -> i64 {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count == seen {
            if self.changed.wait_until(&mut count, deadline).timed_out() {
                break;
            }
        }
        *count
    }
}

/// Synthesized counter for hosts without change events
///
/// It moves only when the content fingerprint moves. Another application
/// copying identical content is invisible to it; writes made through the
/// backend are counted explicitly with [`record_write`](Self::record_write).
#[derive(Debug, Default)]
pub struct FingerprintCounter {
    last: Option<Option<u64>>,
    count: i64,
}

impl FingerprintCounter {
    /// Record a sampled fingerprint and return the counter value
    /// The first sample only establishes the baseline
    pub fn observe(&mut self, fingerprint: Option<u64>) -> i64 {
        match self.last {
            Some(last) if last == fingerprint => {}
            Some(_) => {
                self.count += 1;
                self.last = Some(fingerprint);
            }
            None => self.last = Some(fingerprint),
        }
        self.count
    }

    /// Count a write of our own, even when the content did not change
    pub fn record_write(&mut self, fingerprint: Option<u64>) -> i64 {
        self.count += 1;
        self.last = Some(fingerprint);
        self.count
    }

    pub fn count(&self) -> i64 {
        self.count
    }
}
