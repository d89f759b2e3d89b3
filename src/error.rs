//! Error types for the medidiagnose library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`MediDiagnoseError`] — **Fatal** for the operation that returned it
//!   (unreadable input file, unsupported media type, store I/O, PDF
//!   serialisation). Returned as `Err(MediDiagnoseError)` from library calls.
//!
//! * [`ProcessingError`] — **Transient**: a diagnosis run stopped (the OCR
//!   service said no, the diagnosis call failed). It lives in the session's
//!   `Failed` state so the presentation layer can show it next to a retry
//!   action. It is never persisted.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown for every failed diagnosis run; the cause goes in `details`.
pub const PROCESSING_FAILED_MESSAGE: &str = "An error occurred during processing";

/// All fatal errors returned by the medidiagnose library.
#[derive(Debug, Error)]
pub enum MediDiagnoseError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Report file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file is neither an accepted image type nor a PDF.
    #[error(
        "Unsupported file type '{media_type}' for '{name}'\n\
Accepted: .jpg .jpeg .png .gif .bmp .tiff .webp .pdf"
    )]
    UnsupportedFileType { name: String, media_type: String },

    // ── Session errors ────────────────────────────────────────────────────
    /// A file was submitted while the session could not accept one.
    #[error("Cannot submit a report while the session is {state}")]
    SubmissionRejected { state: String },

    /// A diagnosis run stopped; the session is now `Failed`.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    // ── Store errors ──────────────────────────────────────────────────────
    /// Writing a result to the store failed.
    #[error("Failed to store result '{id}': {reason}")]
    StoreWriteFailed { id: String, reason: String },

    /// Reading a result from the store failed (I/O, not absence).
    #[error("Failed to read result '{id}': {reason}")]
    StoreReadFailed { id: String, reason: String },

    /// A stored result exists but cannot be decoded.
    #[error("Stored result '{id}' is corrupt: {detail}")]
    CorruptResult { id: String, detail: String },

    // ── Report errors ─────────────────────────────────────────────────────
    /// printpdf rejected the laid-out report.
    #[error("Report rendering failed: {0}")]
    ReportRenderFailed(String),

    /// The snapshot capture could not be decoded or assembled.
    #[error("Snapshot rendering failed: {0}")]
    SnapshotFailed(String),

    /// `POST /generate-pdf` did not return a document.
    #[error("Failed to generate PDF: {0}")]
    RemoteReportFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
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
}

/// Why a diagnosis run stopped.
///
/// Held in [`crate::session::ProcessingState::Failed`] until the user retries.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[error("{message}{}", details_suffix(.details))]
pub struct ProcessingError {
    /// Headline shown to the user.
    pub message: String,
    /// The underlying cause, usually the remote service's error text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ProcessingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    /// A failed run with `details` describing the cause.
    pub fn run_failed(details: impl Into<String>) -> Self {
        Self {
            message: PROCESSING_FAILED_MESSAGE.to_string(),
            details: Some(details.into()),
        }
    }
}

fn details_suffix(details: &Option<String>) -> String {
    details.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}
