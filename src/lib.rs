//! # medidiagnose
//!
//! Client for an AI medical-report diagnosis service.
//!
//! A user submits a medical report (an image or a PDF). The client sends it to
//! an extraction service (OCR for images, text extraction for PDFs), forwards
//! the text to a diagnosis service, stores the structured result, and can
//! render it as a paginated PDF report.
//!
//! ## Run Overview
//!
//! ```text
//! UploadFile (image | PDF)
//!  │
//!  ├─ 1. Extract   POST /ocr  or  POST /process-pdf
//!  ├─ 2. Diagnose  POST /diagnosis
//!  ├─ 3. Persist   ResultStore::put(id, PersistedResult)
//!  └─ 4. Navigate  Route::Results(id)
//!
//! ResultsView::load(store, id) ──► terminal view / generate_report() PDF
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use medidiagnose::{ClientConfig, DiagnosisSession, FileResultStore, UploadFile};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .api_url("http://localhost:5000/api")
//!         .build()?;
//!     let store = Arc::new(FileResultStore::new("results"));
//!     let mut session = DiagnosisSession::new(&config, store.clone());
//!
//!     let file = UploadFile::from_path("blood-panel.pdf").await?;
//!     let id = session.process_file(file).await?;
//!
//!     let view = medidiagnose::ResultsView::load(store.as_ref(), id).await;
//!     println!("{}", view.render());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `medidiagnose` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! medidiagnose = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod progress;
pub mod report;
pub mod routes;
pub mod session;
pub mod store;
pub mod upload;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{ApiClient, DiagnosisBackend};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{MediDiagnoseError, ProcessingError};
pub use model::{
    DiagnosisData, DiagnosisResponse, OcrResponse, PdfTextResponse, PersistedResult, Severity,
};
pub use progress::{NoopProgressCallback, ProcessingProgressCallback, ProgressCallback};
pub use report::{generate_report, generate_report_with, snapshot_to_pdf, PageGeometry};
pub use routes::Route;
pub use session::{DiagnosisSession, ProcessingState};
pub use store::{FileResultStore, MemoryResultStore, ResultId, ResultStore};
pub use upload::{MediaKind, UploadFile};
pub use view::ResultsView;
