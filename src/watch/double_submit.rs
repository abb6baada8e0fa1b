//! Double-copy confirmation for text
//!
//! A single copy is ambiguous. Copying the same text twice within a short
//! window is read as an intentional gesture, and only that is emitted. The
//! detector also owns the poll cadence of its session: fast while the
//! clipboard is active, slower after a streak of idle ticks.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use super::{CancellationToken, ChangeWatcher, DoubleSubmitOptions, Emit, Poll, emit};
use crate::clipboard::{Format, SharedBackend};

/// Per-session double-submit state machine
#[derive(Debug, Clone)]
pub struct DoubleSubmitDetector {
    options: DoubleSubmitOptions,
    /// Pending candidate, empty when there is none
    last_text: String,
    last_emit: Option<Instant>,
    miss_streak: u32,
    interval: Duration,
}

impl DoubleSubmitDetector {
    pub fn new(options: DoubleSubmitOptions) -> Self {
        let interval = options.fast_interval;
        DoubleSubmitDetector {
            options,
            last_text: String::new(),
            last_emit: None,
            miss_streak: 0,
            interval,
        }
    }

    /// Check if `text` may be fed to [`observe`](Self::observe)
    /// Empty and oversized candidates are filtered out
    pub fn accepts(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self.options.max_text_len {
            Some(max) => text.chars().count() <= max,
            None => true,
        }
    }

    /// Feed a detected text change observed at `now`
    /// Returns the text when it confirms the pending candidate
    pub fn observe(&mut self, text: String, now: Instant) -> Option<String> {
        let within_window = self
            .last_emit
            .is_some_and(|last| now.saturating_duration_since(last) < self.options.confirm_window);

        let confirmed = if within_window && text == self.last_text {
            // Cleared so a third identical copy starts over
            self.last_text.clear();
            Some(text)
        } else {
            self.last_text = text;
            None
        };

        self.last_emit = Some(now);
        self.miss_streak = 0;
        self.interval = self.options.fast_interval;
        confirmed
    }

    /// Record a tick without any change
    pub fn idle(&mut self) {
        self.miss_streak += 1;
        if self.miss_streak == self.options.backoff_streak
            || self.miss_streak > self.options.backoff_ceiling
        {
            if self.interval != self.options.slow_interval {
                log::debug!(
                    "No clipboard activity for {} ticks, polling every {:?}",
                    self.miss_streak,
                    self.options.slow_interval
                );
            }
            self.interval = self.options.slow_interval;
            self.miss_streak = 0;
        }
    }

    /// Delay before the next tick
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn miss_streak(&self) -> u32 {
        self.miss_streak
    }

    /// The candidate waiting for its confirming copy, if any
    pub fn pending(&self) -> Option<&str> {
        (!self.last_text.is_empty()).then_some(self.last_text.as_str())
    }
}

/// Start a confirmed-text watch session on its own thread
/// `map` converts each confirmed string into the stream's item type
pub(crate) fn spawn<T: Send + 'static>(
    backend: Arc<SharedBackend>,
    cancel: CancellationToken,
    options: DoubleSubmitOptions,
    map: fn(String) -> T,
) -> Receiver<T> {
    let (tx, rx) = mpsc::sync_channel(1);
    let watcher = ChangeWatcher::new(&backend, Format::Text);
    let detector = DoubleSubmitDetector::new(options);

    let spawned = thread::Builder::new()
        .name("clipwatch-text".to_string())
        .spawn(move || run(&backend, &cancel, watcher, detector, &tx, map));
    if let Err(e) = spawned {
        log::error!("Failed to spawn text watcher: {}", e);
    }
    rx
}

fn run<T>(
    backend: &SharedBackend,
    cancel: &CancellationToken,
    mut watcher: ChangeWatcher,
    mut detector: DoubleSubmitDetector,
    tx: &SyncSender<T>,
    map: fn(String) -> T,
) {
    log::info!(
        "Watching text clipboard for double copies from count {}",
        watcher.last_count()
    );

    while !cancel.wait_timeout(detector.interval()) {
        let payload = match watcher.poll(backend) {
            Poll::Unchanged => {
                detector.idle();
                continue;
            }
            Poll::Unreadable => continue,
            Poll::Changed(payload) => payload,
        };

        let Ok(text) = String::from_utf8(payload) else {
            log::debug!("Ignoring non UTF-8 text change");
            continue;
        };
        if !detector.accepts(&text) {
            log::trace!("Ignoring text candidate of {} bytes", text.len());
            continue;
        }

        let Some(confirmed) = detector.observe(text, Instant::now()) else {
            continue;
        };

        log::debug!("Confirmed double copy of {} bytes", confirmed.len());
        match emit(tx, map(confirmed)) {
            Emit::Sent => {}
            Emit::Dropped => log::debug!("Consumer busy, dropped confirmed text"),
            Emit::Closed => {
                log::debug!("Text receiver dropped");
                break;
            }
        }
    }

    log::info!("Stopped watching text clipboard");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn detector() -> DoubleSubmitDetector {
        DoubleSubmitDetector::new(DoubleSubmitOptions::default())
    }

    #[test]
    fn test_second_copy_confirms_third_does_not() {
        let t0 = Instant::now();
        let mut detector = detector();

        assert_eq!(detector.observe("42".to_string(), t0), None);
        assert_eq!(detector.pending(), Some("42"));

        assert_eq!(
            detector.observe("42".to_string(), t0 + ms(300)),
            Some("42".to_string())
        );
        assert_eq!(detector.pending(), None);

        assert_eq!(detector.observe("42".to_string(), t0 + ms(310)), None);
        assert_eq!(detector.pending(), Some("42"));
    }

    #[test]
    fn test_different_text_breaks_coincidence() {
        let t0 = Instant::now();
        let mut detector = detector();

        assert_eq!(detector.observe("42".to_string(), t0), None);
        assert_eq!(detector.observe("43".to_string(), t0 + ms(100)), None);
        assert_eq!(detector.pending(), Some("43"));
    }

    #[test]
    fn test_slow_second_copy_becomes_new_candidate() {
        let t0 = Instant::now();
        let mut detector = detector();

        assert_eq!(detector.observe("42".to_string(), t0), None);
        assert_eq!(detector.observe("42".to_string(), t0 + ms(900)), None);
        assert_eq!(detector.pending(), Some("42"));

        // The late copy restarted the window
        assert_eq!(
            detector.observe("42".to_string(), t0 + ms(1200)),
            Some("42".to_string())
        );
    }

    #[test]
    fn test_window_is_exclusive() {
        let t0 = Instant::now();
        let mut detector = detector();

        detector.observe("x".to_string(), t0);
        assert_eq!(detector.observe("x".to_string(), t0 + ms(500)), None);
    }

    #[test]
    fn test_backoff_after_idle_streak() {
        let mut detector = detector();
        assert_eq!(detector.interval(), ms(100));

        for _ in 0..49 {
            detector.idle();
        }
        assert_eq!(detector.interval(), ms(100));
        assert_eq!(detector.miss_streak(), 49);

        detector.idle();
        assert_eq!(detector.interval(), ms(200));
        assert_eq!(detector.miss_streak(), 0);

        // Staying idle keeps the slow cadence
        for _ in 0..120 {
            detector.idle();
        }
        assert_eq!(detector.interval(), ms(200));
    }

    #[test]
    fn test_change_resets_to_fast_interval() {
        let mut detector = detector();
        for _ in 0..50 {
            detector.idle();
        }
        assert_eq!(detector.interval(), ms(200));

        for _ in 0..10 {
            detector.idle();
        }
        detector.observe("hello".to_string(), Instant::now());
        assert_eq!(detector.interval(), ms(100));
        assert_eq!(detector.miss_streak(), 0);
    }

    #[test]
    fn test_ceiling_forces_backoff() {
        let mut detector = DoubleSubmitDetector::new(DoubleSubmitOptions {
            backoff_streak: 1000,
            backoff_ceiling: 3,
            ..DoubleSubmitOptions::default()
        });

        for _ in 0..3 {
            detector.idle();
        }
        assert_eq!(detector.interval(), ms(100));
        detector.idle();
        assert_eq!(detector.interval(), ms(200));
    }

    #[test]
    fn test_accepts_filters_candidates() {
        let limited = DoubleSubmitDetector::new(DoubleSubmitOptions {
            max_text_len: Some(5),
            ..DoubleSubmitOptions::default()
        });

        assert!(!limited.accepts(""));
        assert!(limited.accepts("héllo"));
        assert!(!limited.accepts("hello!"));
        assert!(detector().accepts(&"x".repeat(10_000)));
    }
}
