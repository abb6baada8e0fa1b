use parking_lot::Mutex;
use std::borrow::Cow;
use std::io::Cursor;
#[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
use std::sync::Arc;
#[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
use std::time::Duration;

use super::backend::ClipboardBackend;
#[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
use super::counter::EventCounter;
use super::counter::FingerprintCounter;
use super::{ClipboardError, Format};

/// How long a write waits for its own ownership change to be counted
#[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
const OWN_WRITE_SETTLE: Duration = Duration::from_millis(250);

/// Where the change counter comes from
enum ChangeSource {
    /// `NSPasteboard.changeCount`
    #[cfg(target_os = "macos")]
    Pasteboard,
    /// `GetClipboardSequenceNumber`
    #[cfg(windows)]
    SequenceNumber,
    /// XFixes selection owner events
    #[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
    Selection {
        counter: Arc<EventCounter>,
        _listener: super::x11::SelectionListener,
    },
    /// Text fingerprints; identical re-copies by other applications are missed
    #[cfg_attr(any(target_os = "macos", windows), allow(dead_code))]
    Fingerprint(Mutex<FingerprintCounter>),
}

impl ChangeSource {
    #[cfg(target_os = "macos")]
    fn detect() -> Self {
        ChangeSource::Pasteboard
    }

    #[cfg(windows)]
    fn detect() -> Self {
        ChangeSource::SequenceNumber
    }

    #[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
    fn detect() -> Self {
        let counter = Arc::new(EventCounter::new());
        match super::x11::SelectionListener::spawn(Arc::clone(&counter)) {
            Ok(listener) => ChangeSource::Selection {
                counter,
                _listener: listener,
            },
            Err(e) => {
                log::warn!("No X11 selection events ({}), falling back to content fingerprints", e);
                Self::fingerprint()
            }
        }
    }

    #[cfg(not(any(target_os = "macos", windows, all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))))]
    fn detect() -> Self {
        Self::fingerprint()
    }

    #[cfg_attr(any(target_os = "macos", windows), allow(dead_code))]
    fn fingerprint() -> Self {
        log::warn!(
            "Clipboard changes are detected by content only; \
             copying the same text twice cannot be confirmed on this host"
        );
        ChangeSource::Fingerprint(Mutex::new(FingerprintCounter::default()))
    }

    fn name(&self) -> &'static str {
        match self {
            #[cfg(target_os = "macos")]
            ChangeSource::Pasteboard => "pasteboard",
            #[cfg(windows)]
            ChangeSource::SequenceNumber => "sequence number",
            #[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
            ChangeSource::Selection { .. } => "xfixes",
            ChangeSource::Fingerprint(_) => "fingerprint",
        }
    }
}

/// Host clipboard backend using arboard
///
/// The change counter comes from the host where it has one: the pasteboard
/// change count on macOS, the clipboard sequence number on Windows and
/// XFixes selection events on X11 (and Xwayland). Elsewhere it is derived
/// from a fingerprint of the clipboard text.
pub struct NativeBackend {
    // Kept alive for the backend's lifetime: on X11/Wayland the copied
    // content is served by this handle
    clipboard: Mutex<arboard::Clipboard>,
    source: ChangeSource,
}

impl NativeBackend {
    /// Open the host clipboard
    pub fn new() -> Result<Self, ClipboardError> {
        let clipboard = arboard::Clipboard::new().map_err(ClipboardError::backend)?;
        let source = ChangeSource::detect();

        log::debug!("NativeBackend initialized, change counter from {}", source.name());
        Ok(NativeBackend {
            clipboard: Mutex::new(clipboard),
            source,
        })
    }

    fn read_text(&self) -> Result<Option<Vec<u8>>, ClipboardError> {
        match self.clipboard.lock().get_text() {
            Ok(text) => Ok(Some(text.into_bytes())),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(ClipboardError::backend(e)),
        }
    }

    fn read_image(&self) -> Result<Option<Vec<u8>>, ClipboardError> {
        let image = match self.clipboard.lock().get_image() {
            Ok(image) => image,
            Err(arboard::Error::ContentNotAvailable) => return Ok(None),
            Err(e) => return Err(ClipboardError::backend(e)),
        };
        if image.width == 0 || image.height == 0 {
            return Ok(Some(Vec::new()));
        }
        encode_png(&image).map(Some)
    }

    fn write_content(&self, format: Format, data: &[u8]) -> Result<(), ClipboardError> {
        let mut clipboard = self.clipboard.lock();

        if data.is_empty() {
            clipboard.clear().map_err(ClipboardError::backend)?;
            log::debug!("Cleared {} clipboard", format);
            return Ok(());
        }

        match format {
            Format::Text => {
                let text = text_payload(data)?;
                clipboard.set_text(text).map_err(ClipboardError::backend)?;
                log::debug!("Wrote {} bytes text to clipboard", data.len());
            }
            Format::Image => {
                let image = decode_png(data)?;
                clipboard.set_image(image).map_err(ClipboardError::backend)?;
                log::debug!("Wrote {} bytes image to clipboard", data.len());
            }
        }
        Ok(())
    }
}

impl ClipboardBackend for NativeBackend {
    fn change_count(&self) -> i64 {
        match &self.source {
            #[cfg(target_os = "macos")]
            ChangeSource::Pasteboard => macos::pasteboard_change_count().unwrap_or_default(),
            #[cfg(windows)]
            ChangeSource::SequenceNumber => windows::clipboard_sequence_number(),
            #[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
            ChangeSource::Selection { counter, .. } => counter.get(),
            ChangeSource::Fingerprint(counter) => {
                let fingerprint = text_fingerprint(&mut self.clipboard.lock());
                counter.lock().observe(fingerprint)
            }
        }
    }

    fn read(&self, format: Format) -> Result<Option<Vec<u8>>, ClipboardError> {
        match format {
            Format::Text => self.read_text(),
            Format::Image => self.read_image(),
        }
    }

    fn write(&self, format: Format, data: &[u8]) -> Result<(), ClipboardError> {
        match &self.source {
            // Ownership events arrive asynchronously; wait for ours so the
            // caller's post-write count already includes it
            #[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
            ChangeSource::Selection { counter, .. } => {
                let before = counter.get();
                self.write_content(format, data)?;
                if counter.wait_past(before, OWN_WRITE_SETTLE) == before {
                    log::debug!("No selection event for our own write within {:?}", OWN_WRITE_SETTLE);
                }
                Ok(())
            }
            ChangeSource::Fingerprint(counter) => {
                self.write_content(format, data)?;
                let fingerprint = match format {
                    Format::Text if !data.is_empty() => text_payload(data).ok().map(fingerprint_text),
                    _ => None,
                };
                counter.lock().record_write(fingerprint);
                Ok(())
            }
            #[allow(unreachable_patterns)]
            _ => self.write_content(format, data),
        }
    }

    fn supports_images(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "Native"
    }
}

/// Text payloads must be valid UTF-8, they are never repaired
fn text_payload(data: &[u8]) -> Result<&str, ClipboardError> {
    std::str::from_utf8(data).map_err(|e| ClipboardError::backend(format!("text is not UTF-8: {e}")))
}

/// Encode arboard RGBA pixels as PNG
fn encode_png(image: &arboard::ImageData<'_>) -> Result<Vec<u8>, ClipboardError> {
    let rgba = image::RgbaImage::from_raw(
        image.width as u32,
        image.height as u32,
        image.bytes.to_vec(),
    )
    .ok_or_else(|| ClipboardError::backend("image buffer does not match its dimensions"))?;

    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(rgba).write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}

/// Decode PNG bytes into arboard RGBA pixels
fn decode_png(data: &[u8]) -> Result<arboard::ImageData<'static>, ClipboardError> {
    let rgba = image::load_from_memory_with_format(data, image::ImageFormat::Png)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(arboard::ImageData {
        width: width as usize,
        height: height as usize,
        bytes: Cow::Owned(rgba.into_raw()),
    })
}

fn fingerprint_text(text: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Fingerprint of the current text, `None` when there is none
/// Images are never pulled here: a pixel buffer per tick is too expensive
fn text_fingerprint(clipboard: &mut arboard::Clipboard) -> Option<u64> {
    clipboard.get_text().ok().map(|text| fingerprint_text(&text))
}

#[cfg(target_os = "macos")]
mod macos {
    use objc::runtime::{Class, Object};
    use objc::{msg_send, sel, sel_impl};

    // Brings NSPasteboard into reach of the class resolver
    #[link(name = "AppKit", kind = "framework")]
    unsafe extern "C" {}

    pub(super) fn pasteboard_change_count() -> Option<i64> {
        let class = Class::get("NSPasteboard")?;
        // SAFETY: generalPasteboard is a class method returning a shared,
        // autoreleased instance; nil is checked below
        let pasteboard: *mut Object = unsafe { msg_send![class, generalPasteboard] };
        if pasteboard.is_null() {
            log::warn!("NSPasteboard generalPasteboard returned nil");
            return None;
        }
        // SAFETY: pasteboard is a non-nil NSPasteboard, changeCount takes no arguments
        let count: isize = unsafe { msg_send![pasteboard, changeCount] };
        Some(count as i64)
    }
}

#[cfg(windows)]
mod windows {
    #[link(name = "user32")]
    unsafe extern "system" {
        fn GetClipboardSequenceNumber() -> u32;
    }

    pub(super) fn clipboard_sequence_number() -> i64 {
        // SAFETY: takes no arguments and only reads a per-session counter
        i64::from(unsafe { GetClipboardSequenceNumber() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_round_trip_keeps_pixels() {
        let pixels = vec![255u8, 0, 0, 255, 0, 255, 0, 128];
        let image = arboard::ImageData {
            width: 2,
            height: 1,
            bytes: Cow::Owned(pixels.clone()),
        };

        let png = encode_png(&image).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = decode_png(&png).unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 1));
        assert_eq!(decoded.bytes.as_ref(), pixels.as_slice());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_png(b"not a png"),
            Err(ClipboardError::Image { .. })
        ));
    }

    #[test]
    fn test_text_payload_rejects_invalid_utf8() {
        assert_eq!(text_payload(b"plain").unwrap(), "plain");
        assert!(matches!(
            text_payload(&[0x66, 0xff, 0x6f]),
            Err(ClipboardError::Backend { .. })
        ));
    }

    #[test]
    fn test_text_fingerprint_is_stable() {
        assert_eq!(fingerprint_text("42"), fingerprint_text("42"));
        assert_ne!(fingerprint_text("42"), fingerprint_text("43"));
    }
}
