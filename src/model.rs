//! Data exchanged with the remote services and persisted between views.
//!
//! Wire names follow the services' JSON: the extraction endpoints use
//! snake_case (`raw_text`, `processed_text`), while diagnosis payloads and
//! persisted results use camelCase (`additionalInfo`, `extractedText`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse clinical urgency attached to a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Moderate,
    High,
}

impl Severity {
    /// Capitalised label used in reports ("Low", "Moderate", "High").
    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The structured diagnosis returned by the diagnosis service.
///
/// Opaque to the client apart from rendering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisData {
    pub disease: String,
    /// Free-form, usually SOAP-structured, treatment text.
    pub treatment: String,
    pub precautions: Vec<String>,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    /// Model confidence in `0.0..=1.0`, when the service reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// What the results view reads back for a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedResult {
    pub diagnosis_data: DiagnosisData,
    pub extracted_text: String,
    /// ISO-8601 UTC instant the run completed.
    pub timestamp: String,
    /// Declared media type of the submitted file.
    pub file_type: String,
}

// ── Service responses ────────────────────────────────────────────────────

/// `POST /ocr` response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// `POST /process-pdf` response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PdfTextResponse {
    /// The reference backend answers with `text`; both spellings land here.
    #[serde(default, alias = "text")]
    pub raw_text: String,
    #[serde(default)]
    pub processed_text: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PdfTextResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            raw_text: String::new(),
            processed_text: String::new(),
            success: false,
            error: Some(error.into()),
        }
    }

    /// The text to diagnose: `processed_text` unless it is empty.
    pub fn best_text(&self) -> &str {
        if self.processed_text.is_empty() {
            &self.raw_text
        } else {
            &self.processed_text
        }
    }
}

/// `POST /diagnosis` response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResponse {
    #[serde(default)]
    pub disease: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub precautions: Vec<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiagnosisResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Strip the transport envelope, keeping what the views render.
    pub fn into_diagnosis_data(self) -> DiagnosisData {
        DiagnosisData {
            disease: self.disease,
            treatment: self.treatment,
            precautions: self.precautions,
            severity: self.severity,
            additional_info: self.additional_info,
            confidence: self.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_response_prefers_processed_text() {
        let r = PdfTextResponse {
            raw_text: "raw".into(),
            processed_text: "### Diagnosis ###\nclean".into(),
            success: true,
            error: None,
        };
        assert_eq!(r.best_text(), "### Diagnosis ###\nclean");
    }

    #[test]
    fn pdf_response_falls_back_to_raw_text() {
        let r = PdfTextResponse {
            raw_text: "raw".into(),
            processed_text: String::new(),
            success: true,
            error: None,
        };
        assert_eq!(r.best_text(), "raw");
    }

    #[test]
    fn pdf_response_accepts_text_field() {
        let r: PdfTextResponse =
            serde_json::from_str(r#"{"success": true, "text": "Hemoglobin 13.2"}"#).unwrap();
        assert_eq!(r.raw_text, "Hemoglobin 13.2");
        assert_eq!(r.best_text(), "Hemoglobin 13.2");
    }

    #[test]
    fn diagnosis_response_parses_service_payload() {
        let json = r#"{
            "disease": "Medical Condition (AI Analysis)",
            "confidence": 0.89,
            "severity": "moderate",
            "treatment": "Subjective: ...",
            "precautions": ["Monitor symptoms closely"],
            "additionalInfo": "Based on similar cases.",
            "success": true
        }"#;
        let r: DiagnosisResponse = serde_json::from_str(json).unwrap();
        assert!(r.success);
        assert_eq!(r.severity, Severity::Moderate);
        let data = r.into_diagnosis_data();
        assert_eq!(data.additional_info.as_deref(), Some("Based on similar cases."));
        assert_eq!(data.confidence, Some(0.89));
    }

    #[test]
    fn failure_payload_without_fields_still_parses() {
        let r: DiagnosisResponse =
            serde_json::from_str(r#"{"success": false, "error": "No text provided"}"#).unwrap();
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("No text provided"));
        assert_eq!(r.severity, Severity::Low);
    }

    #[test]
    fn missing_confidence_stays_absent() {
        let r: DiagnosisResponse =
            serde_json::from_str(r#"{"success": true, "disease": "x"}"#).unwrap();
        assert_eq!(r.confidence, None);
        assert_eq!(r.into_diagnosis_data().confidence, None);
    }

    #[test]
    fn persisted_result_uses_camel_case() {
        let result = PersistedResult {
            diagnosis_data: DiagnosisData {
                disease: "Flu".into(),
                treatment: "Rest".into(),
                precautions: vec![],
                severity: Severity::High,
                additional_info: None,
                confidence: None,
            },
            extracted_text: "fever".into(),
            timestamp: "2026-10-16T08:00:00.000Z".into(),
            file_type: "image/png".into(),
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["diagnosisData"]["severity"], "high");
        assert_eq!(v["extractedText"], "fever");
        assert_eq!(v["fileType"], "image/png");
        assert!(v["diagnosisData"].get("additionalInfo").is_none());
    }

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::Low.to_string(), "Low");
        assert_eq!(Severity::Moderate.label(), "Moderate");
        assert_eq!(Severity::High.label(), "High");
    }
}
