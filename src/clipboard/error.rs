use super::Format;

/// Errors surfaced by clipboard operations
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// The requested format has no content, or the backend call failed
    #[error("clipboard unavailable")]
    Unavailable,

    /// The format is unknown or the backend does not implement it
    #[error("unsupported format: {format}")]
    Unsupported { format: String },

    /// Native backend failure with its original message
    #[error("clipboard backend error: {message}")]
    Backend { message: String },

    /// PNG encode/decode failure
    #[error("image conversion failed: {source}")]
    Image {
        #[from]
        source: image::ImageError,
    },
}

impl ClipboardError {
    pub fn unsupported(format: impl Into<String>) -> Self {
        ClipboardError::Unsupported {
            format: format.into(),
        }
    }

    pub fn backend(message: impl std::fmt::Display) -> Self {
        ClipboardError::Backend {
            message: message.to_string(),
        }
    }

    /// Fold backend-level failures into `Unavailable`.
    /// `Unsupported` is a caller error and is kept as-is.
    pub fn into_public(self, format: Format) -> Self {
        match self {
            ClipboardError::Backend { .. } | ClipboardError::Image { .. } => {
                log::debug!("{} clipboard call failed: {}", format, self);
                ClipboardError::Unavailable
            }
            other => other,
        }
    }

    /// Check if this is the `Unavailable` variant
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ClipboardError::Unavailable)
    }
}
