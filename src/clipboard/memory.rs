use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::backend::ClipboardBackend;
use super::{ClipboardError, Format};

/// In-process clipboard with a real change counter
/// Used by tests and by `--backend memory`; the `copy`/`bump` helpers
/// simulate another application touching the clipboard
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    reads: AtomicUsize,
    supports_images: bool,
}

#[derive(Default)]
struct MemoryState {
    count: i64,
    text: Option<Vec<u8>>,
    image: Option<Vec<u8>>,
    fail_reads: bool,
}

impl MemoryState {
    fn slot_mut(&mut self, format: Format) -> &mut Option<Vec<u8>> {
        match format {
            Format::Text => &mut self.text,
            Format::Image => &mut self.image,
        }
    }

    /// A copy replaces the whole clipboard, not just one format
    fn replace(&mut self, format: Format, content: Option<Vec<u8>>) {
        self.text = None;
        self.image = None;
        *self.slot_mut(format) = content;
        self.count += 1;
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty clipboard supporting text and images
    pub fn new() -> Self {
        MemoryBackend {
            state: Mutex::new(MemoryState::default()),
            reads: AtomicUsize::new(0),
            supports_images: true,
        }
    }

    /// Create an empty clipboard that rejects image operations
    pub fn text_only() -> Self {
        MemoryBackend {
            supports_images: false,
            ..Self::new()
        }
    }

    /// Simulate an external copy of `data`
    pub fn copy(&self, format: Format, data: impl Into<Vec<u8>>) {
        self.state.lock().replace(format, Some(data.into()));
    }

    /// Simulate an external change that leaves `format` with `content`
    /// (`None` makes the format absent)
    pub fn set_content(&self, format: Format, content: Option<Vec<u8>>) {
        self.state.lock().replace(format, content);
    }

    /// Advance the counter without touching content
    pub fn bump(&self) {
        self.state.lock().count += 1;
    }

    /// Make subsequent reads fail at the backend level
    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Number of `read` calls served so far
    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ClipboardBackend for MemoryBackend {
    fn change_count(&self) -> i64 {
        self.state.lock().count
    }

    fn read(&self, format: Format) -> Result<Option<Vec<u8>>, ClipboardError> {
        if format == Format::Image && !self.supports_images {
            return Err(ClipboardError::unsupported(format.name()));
        }

        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        if state.fail_reads {
            return Err(ClipboardError::backend("simulated read failure"));
        }
        Ok(state.slot_mut(format).clone())
    }

    fn write(&self, format: Format, data: &[u8]) -> Result<(), ClipboardError> {
        if format == Format::Image && !self.supports_images {
            return Err(ClipboardError::unsupported(format.name()));
        }

        let content = if data.is_empty() {
            None
        } else {
            Some(data.to_vec())
        };
        self.state.lock().replace(format, content);
        log::debug!("Wrote {} bytes {} to memory clipboard", data.len(), format);
        Ok(())
    }

    fn supports_images(&self) -> bool {
        self.supports_images
    }

    fn name(&self) -> &'static str {
        "Memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_bumps_counter_and_replaces_content() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.change_count(), 0);

        backend.copy(Format::Image, vec![1, 2, 3]);
        backend.copy(Format::Text, "hello");

        assert_eq!(backend.change_count(), 2);
        assert_eq!(backend.read(Format::Text).unwrap(), Some(b"hello".to_vec()));
        assert_eq!(backend.read(Format::Image).unwrap(), None);
        assert_eq!(backend.read_calls(), 2);
    }

    #[test]
    fn test_empty_write_clears_format() {
        let backend = MemoryBackend::new();
        backend.write(Format::Text, b"abc").unwrap();
        backend.write(Format::Text, b"").unwrap();

        assert_eq!(backend.read(Format::Text).unwrap(), None);
        assert_eq!(backend.change_count(), 2);
    }

    #[test]
    fn test_text_only_rejects_images() {
        let backend = MemoryBackend::text_only();
        assert!(!backend.supports_images());
        assert!(matches!(
            backend.write(Format::Image, &[0]),
            Err(ClipboardError::Unsupported { .. })
        ));
    }
}
