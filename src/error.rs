//! Error types for the file-converter library.
//!
//! A single enum, [`ConvertError`], covers every way a conversion attempt can
//! end without a result. Each variant belongs to one of four groups:
//!
//! * **Input**: the local file could not be found or read.
//! * **Routing**: the file's category is not supported, or the requested
//!   target is not listed for its media type.
//! * **Stage**: a converter failed while decoding/parsing the source or
//!   encoding/serialising the target.
//! * **Session**: the state machine refused the call (nothing selected, a
//!   conversion already running, the attempt was abandoned).
//!
//! Every error is fatal to the current attempt and none is retried. The
//! session stores [`ConvertError::user_message`] in its `Error` state; the
//! full [`Display`](std::fmt::Display) text is meant for logs.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown for any image decode or encode failure.
pub const IMAGE_FAILURE_MESSAGE: &str = "Failed to convert image";
/// Message shown for any text parse or serialise failure.
pub const TEXT_FAILURE_MESSAGE: &str = "Failed to convert text file";
/// Message shown when text content cannot be read as UTF-8.
pub const READ_FAILURE_MESSAGE: &str = "Failed to read file";

/// All errors returned by the file-converter library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the input file.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Routing errors ────────────────────────────────────────────────────
    /// The media type belongs to a category this version cannot convert.
    ///
    /// `message` is a fixed sentence shown to the user verbatim.
    #[error("{message}")]
    UnsupportedCategory {
        media_type: String,
        message: &'static str,
    },

    /// The target format is not listed for the source media type.
    #[error("Cannot convert '{media_type}' to '{target}'")]
    IncompatibleTarget { media_type: String, target: String },

    // ── Stage errors ──────────────────────────────────────────────────────
    /// The byte stream could not be interpreted as an image.
    #[error("Image decode failed: {detail}")]
    Decode { detail: String },

    /// The target container rejected the decoded pixel buffer.
    #[error("Image encode to '{format}' failed: {detail}")]
    Encode { format: String, detail: String },

    /// Text input was not valid UTF-8.
    #[error("Text read failed: {detail}")]
    Read { detail: String },

    /// JSON could not be parsed, or CSV had no header line.
    #[error("Parse failed: {detail}")]
    Parse { detail: String },

    /// Parsed input does not have the shape the target format needs.
    #[error("Serialise failed: {detail}")]
    Serialize { detail: String },

    // ── Session errors ────────────────────────────────────────────────────
    /// `convert()` was called with no file selected.
    #[error("No file selected")]
    NoFileSelected,

    /// `convert()` was called with no target format selected.
    #[error("No target format selected")]
    NoFormatSelected,

    /// The call is only valid outside the `Converting` state.
    #[error("A conversion is already in progress")]
    Busy,

    /// `convert()` was called from a finished state; select a file or format first.
    #[error("Conversion already finished; select a file or format to start again")]
    NotIdle,

    /// The file was removed or replaced while the conversion was running.
    #[error("Conversion abandoned: the selected file was removed or replaced")]
    Aborted,

    /// `download()` was called with no completed result.
    #[error("No converted file is available for download")]
    NoResult,

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the downloaded file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Human-readable message for the session's `Error` state and the
    /// failure notification.
    ///
    /// Stage failures collapse to a generic sentence naming the stage;
    /// unsupported categories keep their fixed explanation.
    pub fn user_message(&self) -> String {
        match self {
            ConvertError::UnsupportedCategory { message, .. } => (*message).to_string(),
            ConvertError::Decode { .. } | ConvertError::Encode { .. } => {
                IMAGE_FAILURE_MESSAGE.to_string()
            }
            ConvertError::Parse { .. } | ConvertError::Serialize { .. } => {
                TEXT_FAILURE_MESSAGE.to_string()
            }
            ConvertError::Read { .. } => READ_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// True for failures raised by a converter stage.
    pub fn is_stage_error(&self) -> bool {
        matches!(
            self,
            ConvertError::Decode { .. }
                | ConvertError::Encode { .. }
                | ConvertError::Read { .. }
                | ConvertError::Parse { .. }
                | ConvertError::Serialize { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_is_verbatim() {
        let e = ConvertError::UnsupportedCategory {
            media_type: "video/mp4".into(),
            message: "Video and audio conversions are not supported in this version.",
        };
        assert_eq!(
            e.user_message(),
            "Video and audio conversions are not supported in this version."
        );
        assert_eq!(e.to_string(), e.user_message());
    }

    #[test]
    fn stage_errors_collapse_to_generic_messages() {
        let decode = ConvertError::Decode {
            detail: "bad magic".into(),
        };
        assert_eq!(decode.user_message(), IMAGE_FAILURE_MESSAGE);
        assert!(decode.to_string().contains("bad magic"));

        let serialize = ConvertError::Serialize {
            detail: "not an array".into(),
        };
        assert_eq!(serialize.user_message(), TEXT_FAILURE_MESSAGE);

        let read = ConvertError::Read {
            detail: "invalid utf-8".into(),
        };
        assert_eq!(read.user_message(), READ_FAILURE_MESSAGE);
    }

    #[test]
    fn incompatible_target_display() {
        let e = ConvertError::IncompatibleTarget {
            media_type: "image/png".into(),
            target: "csv".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("image/png"), "got: {msg}");
        assert!(msg.contains("csv"), "got: {msg}");
        assert!(!e.is_stage_error());
    }

    #[test]
    fn stage_error_classification() {
        assert!(ConvertError::Parse { detail: String::new() }.is_stage_error());
        assert!(!ConvertError::Busy.is_stage_error());
        assert!(!ConvertError::Aborted.is_stage_error());
    }
}
