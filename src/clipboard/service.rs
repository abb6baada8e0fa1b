use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use super::backend::ClipboardBackend;
use super::guard::SerialAccessGuard;
use super::{ClipboardError, Format};
use crate::watch::{self, CancellationToken, ChangeSignal, WatchOptions};

/// A backend together with the guard that serializes access to it
///
/// Every component that touches the clipboard holds an `Arc<SharedBackend>`;
/// there is no other path to the backend.
pub struct SharedBackend {
    backend: Box<dyn ClipboardBackend>,
    guard: SerialAccessGuard,
}

impl SharedBackend {
    pub fn new(backend: Box<dyn ClipboardBackend>) -> Self {
        SharedBackend {
            backend,
            guard: SerialAccessGuard::new(),
        }
    }

    /// Sample the change counter
    pub fn change_count(&self) -> i64 {
        self.guard.with(|| self.backend.change_count())
    }

    /// Read raw backend content, `Ok(None)` when the format is absent
    pub fn read(&self, format: Format) -> Result<Option<Vec<u8>>, ClipboardError> {
        self.check_format(format)?;
        self.guard.with(|| self.backend.read(format))
    }

    /// Write `data` and return the counter value observed right after
    /// The counter is sampled before access is released, so no other
    /// caller can slip a change in between
    pub fn write(&self, format: Format, data: &[u8]) -> Result<i64, ClipboardError> {
        self.check_format(format)?;
        let _access = self.guard.acquire();
        self.backend.write(format, data)?;
        Ok(self.backend.change_count())
    }

    pub fn guard(&self) -> &SerialAccessGuard {
        &self.guard
    }

    pub fn name(&self) -> &'static str {
        self.backend.name()
    }

    /// Check if the backend can handle `format` at all
    pub fn supports(&self, format: Format) -> bool {
        format != Format::Image || self.backend.supports_images()
    }

    fn check_format(&self, format: Format) -> Result<(), ClipboardError> {
        if !self.supports(format) {
            return Err(ClipboardError::unsupported(format.name()));
        }
        Ok(())
    }
}

/// Clipboard access with change detection
pub struct Clipboard {
    shared: Arc<SharedBackend>,
    options: WatchOptions,
}

impl Clipboard {
    /// Wrap `backend` using the default watch options
    pub fn new(backend: Box<dyn ClipboardBackend>) -> Self {
        Self::with_options(backend, WatchOptions::default())
    }

    pub fn with_options(backend: Box<dyn ClipboardBackend>, options: WatchOptions) -> Self {
        log::debug!("Clipboard using {} backend, {:?}", backend.name(), options);
        Clipboard {
            shared: Arc::new(SharedBackend::new(backend)),
            options,
        }
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    pub fn backend(&self) -> &Arc<SharedBackend> {
        &self.shared
    }

    /// Current content of `format`
    ///
    /// Returns `Unavailable` when the format has no content and an empty
    /// vector when it is present but zero-length.
    pub fn read(&self, format: Format) -> Result<Vec<u8>, ClipboardError> {
        match self.shared.read(format) {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(ClipboardError::Unavailable),
            Err(e) => Err(e.into_public(format)),
        }
    }

    /// Current text content, invalid UTF-8 replaced
    pub fn read_text(&self) -> Result<String, ClipboardError> {
        let data = self.read(Format::Text)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Replace the content of `format` with `data`
    ///
    /// The returned signal fires once the clipboard changes after this
    /// write, telling the writer its content was overwritten. Dropping the
    /// signal stops the background monitor.
    pub fn write(&self, format: Format, data: &[u8]) -> Result<ChangeSignal, ClipboardError> {
        let baseline = self
            .shared
            .write(format, data)
            .map_err(|e| e.into_public(format))?;
        log::debug!(
            "Wrote {} bytes {}, monitoring from count {}",
            data.len(),
            format,
            baseline
        );

        Ok(watch::monitor::spawn(
            Arc::clone(&self.shared),
            baseline,
            self.options.monitor_interval,
            self.options.monitor_timeout,
        ))
    }

    pub fn write_text(&self, text: &str) -> Result<ChangeSignal, ClipboardError> {
        self.write(Format::Text, text.as_bytes())
    }

    /// Watch `format` until `cancel` fires
    ///
    /// Text streams carry confirmed double-copy events only; other formats
    /// stream every readable change.
    pub fn watch(&self, cancel: &CancellationToken, format: Format) -> Receiver<Vec<u8>> {
        match format {
            Format::Text => watch::double_submit::spawn(
                Arc::clone(&self.shared),
                cancel.clone(),
                self.options.double_submit.clone(),
                String::into_bytes,
            ),
            Format::Image => self.watch_raw(cancel, format),
        }
    }

    /// Stream every readable change of `format` until `cancel` fires
    ///
    /// A format the backend cannot handle yields an already closed stream.
    pub fn watch_raw(&self, cancel: &CancellationToken, format: Format) -> Receiver<Vec<u8>> {
        if !self.shared.supports(format) {
            log::warn!("{} backend cannot watch {}", self.shared.name(), format);
            let (_, rx) = mpsc::sync_channel(0);
            return rx;
        }

        watch::watcher::spawn(
            Arc::clone(&self.shared),
            cancel.clone(),
            format,
            self.options.tick_interval,
        )
    }

    /// Stream confirmed double-copy text events until `cancel` fires
    pub fn watch_text(&self, cancel: &CancellationToken) -> Receiver<String> {
        watch::double_submit::spawn(
            Arc::clone(&self.shared),
            cancel.clone(),
            self.options.double_submit.clone(),
            std::convert::identity,
        )
    }

    /// Raw host change counter, for diagnostics
    pub fn change_count(&self) -> i64 {
        self.shared.change_count()
    }
}
