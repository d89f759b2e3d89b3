//! Terminal rendering of the results view, the not-found card and progress.
//!
//! Rendering returns plain text; colouring is left to the binary.

use crate::error::MediDiagnoseError;
use crate::model::PersistedResult;
use crate::session::{ProcessingState, TOTAL_STEPS};
use crate::store::{ResultId, ResultStore};
use tracing::warn;

pub const NOT_FOUND_TITLE: &str = "Diagnosis Not Found";
pub const NO_DATA_MESSAGE: &str = "No diagnosis data found. Please perform a new diagnosis.";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load diagnosis data. Please try again.";

/// Patient label used when exporting a report from the results view.
pub const RESULTS_PATIENT_LABEL: &str = "Patient Report";

pub const RESULTS_DISCLAIMER: &str = "Disclaimer: This AI-generated diagnosis is provided for \
informational purposes only and should not replace professional medical advice, diagnosis, \
or treatment. Always consult with a qualified healthcare provider regarding any medical \
conditions or treatment options.";

/// What the results route shows for an id.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView {
    Found { id: ResultId, result: PersistedResult },
    NotFound { message: String },
}

impl ResultsView {
    /// Look `id` up in `store`. Never fails: missing, unreadable or
    /// malformed entries all become [`ResultsView::NotFound`].
    pub async fn load(store: &dyn ResultStore, id: ResultId) -> Self {
        match store.get(id).await {
            Ok(Some(result)) => ResultsView::Found { id, result },
            Ok(None) => ResultsView::NotFound {
                message: NO_DATA_MESSAGE.to_string(),
            },
            Err(e) => {
                log_load_failure(id, &e);
                ResultsView::NotFound {
                    message: LOAD_FAILED_MESSAGE.to_string(),
                }
            }
        }
    }

    pub fn result(&self) -> Option<&PersistedResult> {
        match self {
            ResultsView::Found { result, .. } => Some(result),
            ResultsView::NotFound { .. } => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            ResultsView::Found { result, .. } => render_result(result),
            ResultsView::NotFound { message } => render_not_found(message),
        }
    }
}

fn log_load_failure(id: ResultId, e: &MediDiagnoseError) {
    warn!("Error loading diagnosis data for {}: {}", id, e);
}

/// Default download name for a result's report.
pub fn report_file_name(id: ResultId) -> String {
    format!("diagnosis-report-{id}.pdf")
}

/// Full results view for a stored run.
pub fn render_result(result: &PersistedResult) -> String {
    let d = &result.diagnosis_data;
    let mut lines = vec![
        "Your Diagnosis Results".to_string(),
        "AI-generated diagnosis based on your medical report".to_string(),
        String::new(),
        "== Medical Analysis Report ==".to_string(),
        format!("Condition: {}", d.disease),
        format!("Severity:  {}", d.severity),
    ];
    if let Some(confidence) = d.confidence {
        lines.push(format!("Confidence: {:.0}%", confidence * 100.0));
    }
    lines.push(format!("Analysed:  {} ({})", result.timestamp, result.file_type));
    lines.push(String::new());

    lines.push("-- SOAP Assessment --".to_string());
    lines.push(d.treatment.trim_end().to_string());
    if let Some(info) = d.additional_info.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(String::new());
        lines.push("-- Additional Notes --".to_string());
        lines.push(info.trim_end().to_string());
    }
    lines.push(String::new());

    lines.push("-- Key Recommendations --".to_string());
    lines.extend(
        d.precautions
            .iter()
            .enumerate()
            .map(|(n, precaution)| format!("{:>2}. {}", n + 1, precaution)),
    );
    lines.push(String::new());

    lines.push("== Original Report Text ==".to_string());
    lines.push(result.extracted_text.trim_end().to_string());
    lines.push(String::new());
    lines.push(RESULTS_DISCLAIMER.to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// The card shown when a result cannot be displayed.
pub fn render_not_found(message: &str) -> String {
    format!("{NOT_FOUND_TITLE}\n{message}\n\nStart a new diagnosis to continue.\n")
}

/// One-line progress text for `state`, e.g. "Step 2 of 3: Analyzing with AI model".
pub fn render_progress(state: &ProcessingState) -> String {
    match (state, state.step()) {
        (ProcessingState::Failed(e), _) => render_error_card(e),
        (_, Some(step)) if step > 0 => {
            format!("Step {step} of {TOTAL_STEPS}: {}", state.label())
        }
        _ => state.label().to_string(),
    }
}

/// Error card for a failed run: the message, then details when present.
pub fn render_error_card(error: &crate::error::ProcessingError) -> String {
    match error.details.as_deref() {
        Some(details) if !details.is_empty() => format!("{}\n{}", error.message, details),
        _ => error.message.clone(),
    }
}
