use anyhow::{Context, Result};

use crate::clipboard::Clipboard;
use crate::convert::{Conversion, ConvertError, Converter};
use crate::notification::Notifier;
use crate::storage::Config;
use crate::watch::CancellationToken;

/// The conversion daemon: watches for confirmed copies and converts them
pub struct App {
    clipboard: Clipboard,
    converter: Converter,
    notifier: Box<dyn Notifier>,
    write_back: bool,
}

impl App {
    pub fn new(clipboard: Clipboard, config: &Config, notifier: Box<dyn Notifier>) -> Self {
        App {
            clipboard,
            converter: Converter::new(config.convert.clone()),
            notifier,
            write_back: config.convert.write_back_timestamp,
        }
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Handle one confirmed copy
    /// Returns the conversion when the text was recognized
    pub fn handle(&self, text: &str) -> Option<Conversion> {
        let conversion = match self.converter.convert(text) {
            Ok(conversion) => conversion,
            Err(ConvertError::TooLong { len, .. }) => {
                log::debug!("Ignoring {} character copy", len);
                return None;
            }
            Err(e) => {
                log::debug!("Not converting: {}", e);
                return None;
            }
        };

        match conversion.clipboard_text() {
            Some(timestamp) if self.write_back => match self.copy_back(&timestamp) {
                Ok(()) => {
                    self.notifier
                        .notify(&format!("{} - copied to clipboard", timestamp));
                }
                Err(e) => {
                    log::warn!("{:#}", e);
                    self.notifier.notify(&timestamp);
                }
            },
            _ => self.notifier.notify(&conversion.display()),
        }

        log::info!("Converted {:?} to {}", text.trim(), conversion.display());
        Some(conversion)
    }

    fn copy_back(&self, timestamp: &str) -> Result<()> {
        // Nothing waits on the overwrite signal; dropping it stops the monitor
        let _signal = self
            .clipboard
            .write_text(timestamp)
            .context("Failed to copy timestamp to clipboard")?;
        Ok(())
    }

    /// Convert confirmed copies until `cancel` fires
    pub fn run(&self, cancel: &CancellationToken) {
        log::info!(
            "Watching the {} clipboard for double copies",
            self.clipboard.backend().name()
        );

        for text in self.clipboard.watch_text(cancel) {
            self.handle(&text);
        }

        log::info!("Stopped watching");
    }
}
