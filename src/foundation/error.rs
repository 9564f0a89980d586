/// Result alias used across the crate.
pub type ReelResult<T> = Result<T, ReelError>;

/// Errors produced while preparing, running, capturing or exporting a run.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid sizes, frame rates or style values.
    #[error("validation error: {0}")]
    Validation(String),

    /// None of the preferred encodings is supported by the media backend.
    #[error("unsupported format: none of [{}] is supported", tried.join(", "))]
    UnsupportedFormat {
        /// Mime types that were probed, in preference order.
        tried: Vec<String>,
    },

    /// The capture device could not be opened.
    #[error("capture init error: {0}")]
    CaptureInit(String),

    /// Recorder failure while a session is live.
    #[error("capture error: {0}")]
    Capture(String),

    /// Surface or text layout failure.
    #[error("render error: {0}")]
    Render(String),

    /// Export sink failure.
    #[error("export error: {0}")]
    Export(String),

    /// Anything else, usually an I/O error with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::CaptureInit`].
    pub fn capture_init(msg: impl Into<String>) -> Self {
        Self::CaptureInit(msg.into())
    }

    /// Build a [`ReelError::Capture`].
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`ReelError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Export`].
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ReelError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ReelError::capture_init("x")
                .to_string()
                .contains("capture init error:")
        );
        assert!(ReelError::capture("x").to_string().contains("capture error:"));
        assert!(ReelError::render("x").to_string().contains("render error:"));
        assert!(ReelError::export("x").to_string().contains("export error:"));
    }

    #[test]
    fn unsupported_format_lists_candidates() {
        let err = ReelError::UnsupportedFormat {
            tried: vec!["video/webm".to_string(), "video/mp4".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unsupported format: none of [video/webm, video/mp4] is supported"
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ReelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
