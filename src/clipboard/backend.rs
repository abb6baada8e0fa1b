use super::{ClipboardError, Format};

/// Trait for clipboard backend abstraction
/// Wraps the host clipboard: a change counter plus typed read/write
/// Implementations are NOT assumed safe for concurrent calls; all access
/// goes through `SharedBackend`, which serializes it
pub trait ClipboardBackend: Send + Sync {
    /// Current value of the host change counter
    /// Must be cheap and side-effect free, it is sampled on every tick
    fn change_count(&self) -> i64;

    /// Read the current payload for `format`
    /// `Ok(None)` means the format is absent, `Ok(Some(vec![]))` means present but empty
    fn read(&self, format: Format) -> Result<Option<Vec<u8>>, ClipboardError>;

    /// Replace the clipboard content with `data`
    /// An empty payload clears the format
    fn write(&self, format: Format, data: &[u8]) -> Result<(), ClipboardError>;

    /// Check if this backend supports image operations
    fn supports_images(&self) -> bool;

    /// Get the backend name (for logging/debugging)
    fn name(&self) -> &'static str;
}

impl<B: ClipboardBackend + ?Sized> ClipboardBackend for std::sync::Arc<B> {
    fn change_count(&self) -> i64 {
        (**self).change_count()
    }

    fn read(&self, format: Format) -> Result<Option<Vec<u8>>, ClipboardError> {
        (**self).read(format)
    }

    fn write(&self, format: Format, data: &[u8]) -> Result<(), ClipboardError> {
        (**self).write(format, data)
    }

    fn supports_images(&self) -> bool {
        (**self).supports_images()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
