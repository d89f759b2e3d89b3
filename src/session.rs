//! The upload/processing state machine.
//!
//! ```text
//!            process_file                 extraction ok          diagnosis ok + stored
//!   Idle ───────────────▶ Extracting ───────────────▶ Diagnosing ──────────────────▶ Done{id}
//!    ▲                        │                           │                              │
//!    │                        └──────────┬────────────────┘                              │
//!    │                                   ▼                                               │
//!    └──────── retry ─────────── Failed(ProcessingError)                navigation() ─▶ /results/{id}
//! ```
//!
//! Calls are strictly sequential: diagnosis is never attempted before
//! extraction has returned. A failure at any step is terminal for the run;
//! nothing is persisted and nothing is retried until the caller invokes
//! [`DiagnosisSession::retry`].

use crate::api::DiagnosisBackend;
use crate::config::ClientConfig;
use crate::error::{MediDiagnoseError, ProcessingError};
use crate::model::PersistedResult;
use crate::progress::ProgressCallback;
use crate::routes::Route;
use crate::store::{ResultId, ResultIdClock, ResultStore};
use crate::upload::{MediaKind, UploadFile};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Number of progress steps shown while a run is active.
pub const TOTAL_STEPS: u8 = 3;

/// Where a session is in its run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingState {
    /// Waiting for a file.
    Idle,
    /// Step 1: the file is with the OCR or PDF-extraction service.
    Extracting { kind: MediaKind },
    /// Step 2: extracted text is with the diagnosis service.
    Diagnosing,
    /// Step 3: the result is stored under `id`.
    Done { id: ResultId },
    /// The run stopped; waiting for [`DiagnosisSession::retry`].
    Failed(ProcessingError),
}

impl ProcessingState {
    /// Progress step (0 = idle … 3 = done); `None` once failed.
    pub fn step(&self) -> Option<u8> {
        match self {
            ProcessingState::Idle => Some(0),
            ProcessingState::Extracting { .. } => Some(1),
            ProcessingState::Diagnosing => Some(2),
            ProcessingState::Done { .. } => Some(3),
            ProcessingState::Failed(_) => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            ProcessingState::Extracting { .. } | ProcessingState::Diagnosing
        )
    }

    pub fn error(&self) -> Option<&ProcessingError> {
        match self {
            ProcessingState::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Short lowercase name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingState::Idle => "idle",
            ProcessingState::Extracting { .. } => "extracting",
            ProcessingState::Diagnosing => "diagnosing",
            ProcessingState::Done { .. } => "done",
            ProcessingState::Failed(_) => "failed",
        }
    }

    /// Progress text for the current step.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingState::Idle => "Waiting for a medical report",
            ProcessingState::Extracting {
                kind: MediaKind::Image,
            } => "Extracting text with OCR",
            ProcessingState::Extracting {
                kind: MediaKind::Pdf,
            } => "Extracting text from PDF",
            ProcessingState::Diagnosing => "Analyzing with AI model",
            ProcessingState::Done { .. } => "Generating diagnosis report",
            ProcessingState::Failed(_) => crate::error::PROCESSING_FAILED_MESSAGE,
        }
    }
}

/// Drives one file at a time through extraction, diagnosis and persistence.
pub struct DiagnosisSession {
    backend: Arc<dyn DiagnosisBackend>,
    store: Arc<dyn ResultStore>,
    clock: ResultIdClock,
    progress: Option<ProgressCallback>,
    state: ProcessingState,
}

impl DiagnosisSession {
    /// A fresh session in `Idle`, writing results to `store`.
    pub fn new(config: &ClientConfig, store: Arc<dyn ResultStore>) -> Self {
        Self {
            backend: config.resolve_backend(),
            store,
            clock: ResultIdClock::new(),
            progress: config.progress_callback.clone(),
            state: ProcessingState::Idle,
        }
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    /// Whether a new file may be submitted now.
    pub fn accepts_submission(&self) -> bool {
        matches!(
            self.state,
            ProcessingState::Idle | ProcessingState::Done { .. }
        )
    }

    /// The view to show after a completed run.
    pub fn navigation(&self) -> Option<Route> {
        match self.state {
            ProcessingState::Done { id } => Some(Route::Results(id)),
            _ => None,
        }
    }

    /// Clear any error and return to `Idle`. Issues no network call.
    pub fn retry(&mut self) {
        debug!("Session reset from {}", self.state.name());
        self.transition(ProcessingState::Idle);
    }

    /// Run `file` through extraction → diagnosis → persistence.
    ///
    /// # Errors
    /// * [`MediDiagnoseError::SubmissionRejected`] — a run is in flight or a
    ///   failure has not been acknowledged with [`retry`](Self::retry). The
    ///   state is left untouched.
    /// * [`MediDiagnoseError::Processing`] — the run failed; the session is now
    ///   [`ProcessingState::Failed`] holding the same error.
    pub async fn process_file(&mut self, file: UploadFile) -> Result<ResultId, MediDiagnoseError> {
        if !self.accepts_submission() {
            return Err(MediDiagnoseError::SubmissionRejected {
                state: self.state.name().to_string(),
            });
        }

        let start = Instant::now();
        let kind = file.kind();
        info!(
            "Processing '{}' ({}, {} path)",
            file.name,
            file.media_type,
            kind.as_str()
        );
        if let Some(ref cb) = self.progress {
            cb.on_run_start(&file.name, kind);
        }

        match self.run(&file).await {
            Ok(id) => {
                info!(
                    "Diagnosis {} stored in {}ms",
                    id,
                    start.elapsed().as_millis()
                );
                self.transition(ProcessingState::Done { id });
                if let Some(ref cb) = self.progress {
                    cb.on_run_complete(id);
                }
                Ok(id)
            }
            Err(e) => {
                error!("Processing error: {}", e);
                self.transition(ProcessingState::Failed(e.clone()));
                if let Some(ref cb) = self.progress {
                    cb.on_run_failed(&e);
                }
                Err(e.into())
            }
        }
    }

    async fn run(&mut self, file: &UploadFile) -> Result<ResultId, ProcessingError> {
        // ── Step 1: extract text ─────────────────────────────────────────
        let kind = file.kind();
        self.transition(ProcessingState::Extracting { kind });

        let extracted_text = match kind {
            MediaKind::Pdf => {
                let r = self.backend.extract_text_from_pdf(file).await;
                if !r.success {
                    return Err(remote_failure(r.error, "PDF processing failed"));
                }
                r.best_text().to_string()
            }
            MediaKind::Image => {
                let r = self.backend.extract_text_from_image(file).await;
                if !r.success {
                    return Err(remote_failure(r.error, "OCR processing failed"));
                }
                r.text
            }
        };
        debug!("Extracted {} chars of text", extracted_text.len());

        // ── Step 2: diagnose ─────────────────────────────────────────────
        self.transition(ProcessingState::Diagnosing);

        let diagnosis = self.backend.diagnose(&extracted_text).await;
        if !diagnosis.success {
            return Err(remote_failure(diagnosis.error, "Diagnosis processing failed"));
        }

        // ── Step 3: persist ──────────────────────────────────────────────
        let id = self.clock.next_id();
        let result = PersistedResult {
            diagnosis_data: diagnosis.into_diagnosis_data(),
            extracted_text,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            file_type: file.media_type.clone(),
        };
        self.store
            .put(id, &result)
            .await
            .map_err(|e| ProcessingError::run_failed(e.to_string()))?;

        Ok(id)
    }

    fn transition(&mut self, next: ProcessingState) {
        debug!("State {} → {}", self.state.name(), next.name());
        self.state = next;
        if let Some(ref cb) = self.progress {
            cb.on_state_change(&self.state);
        }
    }
}

/// The remote error text when present and non-empty, else `fallback`.
fn remote_failure(error: Option<String>, fallback: &str) -> ProcessingError {
    let details = error
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ProcessingError::run_failed(details)
}
