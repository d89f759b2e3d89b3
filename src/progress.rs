//! Progress-callback trait for processing-state events.
//!
//! Inject an [`Arc<dyn ProcessingProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to follow a
//! diagnosis run as it moves through extraction and diagnosis. The CLI uses
//! it to drive its spinner; a GUI would repaint its progress card.
//!
//! # Example
//!
//! ```rust
//! use medidiagnose::{ClientConfig, ProcessingProgressCallback, ProcessingState};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct StepCounter {
//!     transitions: AtomicUsize,
//! }
//!
//! impl ProcessingProgressCallback for StepCounter {
//!     fn on_state_change(&self, state: &ProcessingState) {
//!         self.transitions.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}", state.label());
//!     }
//! }
//!
//! let config = ClientConfig::builder()
//!     .progress_callback(Arc::new(StepCounter { transitions: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::ProcessingError;
use crate::session::ProcessingState;
use crate::store::ResultId;
use crate::upload::MediaKind;
use std::sync::Arc;

/// Called by [`crate::session::DiagnosisSession`] as a run progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ProcessingProgressCallback: Send + Sync {
    /// A file was accepted and a run is starting.
    ///
    /// # Arguments
    /// * `file_name` — name of the submitted file
    /// * `kind`      — which extraction path it will take
    fn on_run_start(&self, file_name: &str, kind: MediaKind) {
        let _ = (file_name, kind);
    }

    /// The session moved to `state` (including resets to `Idle`).
    fn on_state_change(&self, state: &ProcessingState) {
        let _ = state;
    }

    /// The run finished and its result was stored under `id`.
    fn on_run_complete(&self, id: ResultId) {
        let _ = id;
    }

    /// The run stopped with `error`.
    fn on_run_failed(&self, error: &ProcessingError) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ProcessingProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn ProcessingProgressCallback>;
