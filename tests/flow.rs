//! Integration tests for the full diagnosis flow.
//!
//! A scripted in-process backend stands in for the remote services, so these
//! run offline: upload → extraction → diagnosis → file store → results view →
//! PDF report.

use async_trait::async_trait;
use medidiagnose::model::{DiagnosisResponse, OcrResponse, PdfTextResponse, Severity};
use medidiagnose::report::layout::{layout_report, ReportContent, TextRole};
use medidiagnose::view::{LOAD_FAILED_MESSAGE, NO_DATA_MESSAGE};
use medidiagnose::{
    generate_report, ClientConfig, DiagnosisBackend, DiagnosisSession, FileResultStore,
    MediDiagnoseError, PageGeometry, ProcessingProgressCallback, ProcessingState, ResultStore,
    ResultsView, Route, UploadFile,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs to the test harness; `RUST_LOG=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Replays queued diagnosis replies and records every call.
struct ScriptedBackend {
    diagnoses: Mutex<VecDeque<DiagnosisResponse>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(diagnoses: Vec<DiagnosisResponse>) -> Arc<Self> {
        Arc::new(Self {
            diagnoses: Mutex::new(diagnoses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiagnosisBackend for ScriptedBackend {
    async fn extract_text_from_image(&self, file: &UploadFile) -> OcrResponse {
        self.calls.lock().unwrap().push(format!("ocr:{}", file.name));
        OcrResponse {
            text: "WBC 11.2 x10^9/L\nCRP 24 mg/L".into(),
            success: true,
            error: None,
        }
    }

    async fn extract_text_from_pdf(&self, file: &UploadFile) -> PdfTextResponse {
        self.calls.lock().unwrap().push(format!("process-pdf:{}", file.name));
        PdfTextResponse {
            raw_text: "raw layer".into(),
            processed_text: "Subjective: cough for 5 days\nObjective: T 38.4C".into(),
            success: true,
            error: None,
        }
    }

    async fn diagnose(&self, text: &str) -> DiagnosisResponse {
        self.calls.lock().unwrap().push(format!("diagnosis:{}", text.len()));
        self.diagnoses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| DiagnosisResponse::failed("script exhausted"))
    }
}

fn bronchitis() -> DiagnosisResponse {
    DiagnosisResponse {
        disease: "Acute bronchitis".into(),
        confidence: Some(0.82),
        treatment: "S: productive cough. O: febrile, clear chest film. A: acute bronchitis. \
                    P: supportive care, fluids, antipyretics as needed, review if symptoms \
                    persist beyond three weeks or breathing worsens."
            .into(),
        precautions: vec![
            "Rest".into(),
            "Hydrate".into(),
            "Follow up in 2 weeks".into(),
        ],
        severity: Severity::Moderate,
        additional_info: Some("No antibiotics indicated".into()),
        success: true,
        error: None,
    }
}

#[derive(Default)]
struct StateLog(Mutex<Vec<String>>);

impl ProcessingProgressCallback for StateLog {
    fn on_state_change(&self, state: &ProcessingState) {
        self.0.lock().unwrap().push(state.name().to_string());
    }
}

fn session_with(
    backend: Arc<ScriptedBackend>,
    store: Arc<dyn ResultStore>,
    log: Option<Arc<StateLog>>,
) -> DiagnosisSession {
    let mut builder = ClientConfig::builder().backend(backend);
    if let Some(log) = log {
        builder = builder.progress_callback(log);
    }
    DiagnosisSession::new(&builder.build().unwrap(), store)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_report_runs_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("discharge.pdf");
    std::fs::write(&report_path, b"%PDF-1.4 minimal").unwrap();

    let store = Arc::new(FileResultStore::new(dir.path().join("results")));
    let backend = ScriptedBackend::new(vec![bronchitis()]);
    let log = Arc::new(StateLog::default());
    let mut session = session_with(backend.clone(), store.clone(), Some(log.clone()));

    let upload = UploadFile::from_path(&report_path).await.unwrap();
    let id = session.process_file(upload).await.unwrap();

    // Processed text wins over the raw layer.
    let processed = "Subjective: cough for 5 days\nObjective: T 38.4C";
    assert_eq!(
        backend.calls(),
        vec![
            "process-pdf:discharge.pdf".to_string(),
            format!("diagnosis:{}", processed.len())
        ]
    );
    assert_eq!(
        *log.0.lock().unwrap(),
        vec!["extracting", "diagnosing", "done"]
    );
    assert_eq!(session.navigation(), Some(Route::Results(id)));

    // Stored once, as camelCase JSON.
    let raw = std::fs::read_to_string(store.path_for(id)).unwrap();
    assert!(raw.contains("\"diagnosisData\""));
    assert!(raw.contains("\"extractedText\""));
    assert!(raw.contains("\"severity\":\"moderate\""));
    assert_eq!(store.list().await.unwrap(), vec![id]);

    let view = ResultsView::load(store.as_ref(), id).await;
    let result = view.result().expect("stored result");
    assert_eq!(result.extracted_text, processed);
    assert_eq!(result.file_type, "application/pdf");
    assert_eq!(result.diagnosis_data.disease, "Acute bronchitis");
    assert_eq!(result.diagnosis_data.confidence, Some(0.82));

    let pdf = generate_report(&result.diagnosis_data, &result.extracted_text, "Patient").unwrap();
    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[tokio::test]
async fn image_report_takes_ocr_path() {
    let dir = tempfile::tempdir().unwrap();
    let scan = dir.path().join("labs.JPG");
    std::fs::write(&scan, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

    let store = Arc::new(FileResultStore::new(dir.path()));
    let backend = ScriptedBackend::new(vec![bronchitis()]);
    let mut session = session_with(backend.clone(), store.clone(), None);

    let id = session
        .process_file(UploadFile::from_path(&scan).await.unwrap())
        .await
        .unwrap();

    assert_eq!(backend.calls()[0], "ocr:labs.JPG");
    let view = ResultsView::load(store.as_ref(), id).await;
    assert_eq!(view.result().unwrap().file_type, "image/jpeg");
    assert_eq!(
        view.result().unwrap().extracted_text,
        "WBC 11.2 x10^9/L\nCRP 24 mg/L"
    );
}

#[tokio::test]
async fn failed_diagnosis_stores_nothing_and_retry_recovers() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileResultStore::new(dir.path()));
    let backend = ScriptedBackend::new(vec![
        DiagnosisResponse::failed("model unavailable"),
        bronchitis(),
    ]);
    let mut session = session_with(backend.clone(), store.clone(), None);
    let scan = || UploadFile::new("scan.png", "image/png", vec![1, 2, 3]);

    let err = session.process_file(scan()).await.unwrap_err();
    assert!(matches!(err, MediDiagnoseError::Processing(_)));
    // The CLI reports a failed run through this message alone.
    assert_eq!(
        err.to_string(),
        "An error occurred during processing: model unavailable"
    );
    let failure = session.state().error().cloned().unwrap();
    assert_eq!(failure.message, "An error occurred during processing");
    assert_eq!(failure.details.as_deref(), Some("model unavailable"));
    assert!(store.list().await.unwrap().is_empty());
    assert_eq!(session.navigation(), None);

    // A failed session refuses new work until retried.
    assert!(matches!(
        session.process_file(scan()).await,
        Err(MediDiagnoseError::SubmissionRejected { .. })
    ));

    let calls_before_retry = backend.calls().len();
    session.retry();
    assert_eq!(session.state(), &ProcessingState::Idle);
    assert_eq!(backend.calls().len(), calls_before_retry);

    let id = session.process_file(scan()).await.unwrap();
    assert_eq!(store.list().await.unwrap(), vec![id]);
}

#[tokio::test]
async fn later_runs_do_not_clobber_earlier_results() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileResultStore::new(dir.path()));
    let mut second = bronchitis();
    second.disease = "Influenza A".into();
    let backend = ScriptedBackend::new(vec![bronchitis(), second]);
    let mut session = session_with(backend, store.clone(), None);
    let scan = || UploadFile::new("scan.png", "image/png", vec![1]);

    let first_id = session.process_file(scan()).await.unwrap();
    let second_id = session.process_file(scan()).await.unwrap();
    assert!(second_id > first_id);

    let first = ResultsView::load(store.as_ref(), first_id).await;
    let latest = ResultsView::load(store.as_ref(), second_id).await;
    assert_eq!(first.result().unwrap().diagnosis_data.disease, "Acute bronchitis");
    assert_eq!(latest.result().unwrap().diagnosis_data.disease, "Influenza A");
}

#[tokio::test]
async fn results_view_handles_missing_and_corrupt_entries() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileResultStore::new(dir.path());

    let missing = medidiagnose::ResultId::from_millis(1_760_000_000_000);
    let view = ResultsView::load(&store, missing).await;
    assert_eq!(
        view,
        ResultsView::NotFound {
            message: NO_DATA_MESSAGE.into()
        }
    );
    assert!(view.render().contains("Diagnosis Not Found"));

    let corrupt = medidiagnose::ResultId::from_millis(1_760_000_000_001);
    std::fs::write(store.path_for(corrupt), "{\"diagnosisData\": 42}").unwrap();
    let view = ResultsView::load(&store, corrupt).await;
    assert_eq!(
        view,
        ResultsView::NotFound {
            message: LOAD_FAILED_MESSAGE.into()
        }
    );
}

#[test]
fn stored_result_lays_out_sections_in_order() {
    let data = bronchitis().into_diagnosis_data();
    let content = ReportContent {
        diagnosis: &data,
        extracted_text: "Subjective: cough for 5 days",
        patient_label: "Patient Report",
        generated_at: "2026-10-16 09:30:00",
    };
    let layout = layout_report(&content, &PageGeometry::default());

    let precautions: Vec<_> = layout
        .items_with_role(TextRole::Precaution)
        .into_iter()
        .map(|i| i.text.as_str())
        .collect();
    assert_eq!(
        precautions,
        vec!["\u{2022} Rest", "\u{2022} Hydrate", "\u{2022} Follow up in 2 weeks"]
    );

    let treatment = layout.items_with_role(TextRole::Treatment);
    assert!(treatment.len() > 1, "treatment should wrap");
    let headings: Vec<_> = layout
        .items_with_role(TextRole::Heading)
        .into_iter()
        .map(|i| (i.text.as_str(), i.y))
        .collect();
    let precautions_heading = 105.0 + 6.0 * treatment.len() as f32;
    assert!(headings.contains(&("Precautions & Next Steps", precautions_heading)));
}
