//! HTTP client wrapper for the OCR, PDF-extraction and diagnosis services.
//!
//! Every normalized call makes exactly one attempt. A transport failure
//! (connection refused, non-2xx status, body that is not the expected JSON)
//! never escapes as an error: it is logged and folded into a `success=false`
//! response carrying a fixed, user-presentable message. The processing
//! pipeline therefore only ever reasons about the `success` flag.

use crate::error::MediDiagnoseError;
use crate::model::{DiagnosisData, DiagnosisResponse, OcrResponse, PdfTextResponse};
use crate::upload::UploadFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

/// Default service root, matching the reference backend's dev server.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

pub const OCR_FAILED_MESSAGE: &str = "Failed to process the image. Please try again.";
pub const PDF_FAILED_MESSAGE: &str = "Failed to process the PDF. Please try again.";
pub const DIAGNOSIS_FAILED_MESSAGE: &str = "Failed to get diagnosis. Please try again.";

/// The remote services the processing pipeline depends on.
///
/// [`ApiClient`] is the HTTP implementation. Tests and embedders can supply
/// their own (scripted responses, a local model) through
/// [`crate::config::ClientConfigBuilder::backend`].
#[async_trait]
pub trait DiagnosisBackend: Send + Sync {
    /// `POST /ocr` — extract text from an image.
    async fn extract_text_from_image(&self, file: &UploadFile) -> OcrResponse;

    /// `POST /process-pdf` — extract text from a PDF.
    async fn extract_text_from_pdf(&self, file: &UploadFile) -> PdfTextResponse;

    /// `POST /diagnosis` — diagnose extracted report text.
    async fn diagnose(&self, text: &str) -> DiagnosisResponse;
}

/// reqwest-backed client for the diagnosis services.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct DiagnosisRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteReportRequest<'a> {
    diagnosis_data: &'a DiagnosisData,
    extracted_text: &'a str,
}

impl ApiClient {
    /// Client rooted at `base_url` (trailing slashes are ignored).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    /// Client that reuses an existing `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path such as `/ocr`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `POST /generate-pdf` — have the backend render the report.
    ///
    /// The primary flow renders locally via [`crate::report::generate_report`];
    /// this is the server-side alternative.
    pub async fn generate_remote_report(
        &self,
        diagnosis_data: &DiagnosisData,
        extracted_text: &str,
    ) -> Result<Vec<u8>, MediDiagnoseError> {
        let url = self.endpoint("/generate-pdf");
        info!("Requesting server-side report from {}", url);

        let body = RemoteReportRequest {
            diagnosis_data,
            extracted_text,
        };
        let fail = |e: reqwest::Error| {
            error!("PDF generation error: {}", e);
            MediDiagnoseError::RemoteReportFailed(e.to_string())
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fail)?;
        let bytes = response.bytes().await.map_err(fail)?;

        debug!("Server-side report: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn post_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file: &UploadFile,
    ) -> Result<T, reqwest::Error> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(path);
        debug!("POST {} ({}, {} bytes)", url, file.media_type, file.bytes.len());

        self.http
            .post(&url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, reqwest::Error> {
        let url = self.endpoint(path);
        debug!("POST {}", url);

        self.http
            .post(&url)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[async_trait]
impl DiagnosisBackend for ApiClient {
    async fn extract_text_from_image(&self, file: &UploadFile) -> OcrResponse {
        match self.post_file::<OcrResponse>("/ocr", file).await {
            Ok(r) => r,
            Err(e) => {
                error!("OCR processing error: {}", e);
                OcrResponse::failed(OCR_FAILED_MESSAGE)
            }
        }
    }

    async fn extract_text_from_pdf(&self, file: &UploadFile) -> PdfTextResponse {
        match self.post_file::<PdfTextResponse>("/process-pdf", file).await {
            Ok(r) => r,
            Err(e) => {
                error!("PDF processing error: {}", e);
                PdfTextResponse::failed(PDF_FAILED_MESSAGE)
            }
        }
    }

    async fn diagnose(&self, text: &str) -> DiagnosisResponse {
        match self
            .post_json::<_, DiagnosisResponse>("/diagnosis", &DiagnosisRequest { text })
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!("Diagnosis error: {}", e);
                DiagnosisResponse::failed(DIAGNOSIS_FAILED_MESSAGE)
            }
        }
    }
}
