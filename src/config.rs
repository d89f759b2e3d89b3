//! Configuration types for the diagnosis client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. The builder validates on `build()`, so a config
//! that exists is one the session and renderer can use without further checks.

use crate::api::{ApiClient, DiagnosisBackend, DEFAULT_API_URL};
use crate::error::MediDiagnoseError;
use crate::progress::ProgressCallback;
use crate::report::PageGeometry;
use std::fmt;
use std::sync::Arc;

/// Patient label stamped on reports when none is given.
pub const DEFAULT_PATIENT_LABEL: &str = "Patient";

/// Configuration for a diagnosis client.
///
/// # Example
/// ```rust
/// use medidiagnose::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .api_url("http://diagnosis.internal:5000/api")
///     .patient_label("Patient Report")
///     .build()
///     .unwrap();
/// assert_eq!(config.patient_label, "Patient Report");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Root URL of the OCR/diagnosis services. Default: `http://localhost:5000/api`.
    pub api_url: String,

    /// Label printed after "Patient:" in generated reports. Default: "Patient".
    pub patient_label: String,

    /// Page geometry used by the report renderer. Default: A4 portrait.
    pub geometry: PageGeometry,

    /// Pre-constructed backend. Takes precedence over `api_url`.
    pub backend: Option<Arc<dyn DiagnosisBackend>>,

    /// Receives every processing-state transition.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            patient_label: DEFAULT_PATIENT_LABEL.to_string(),
            geometry: PageGeometry::default(),
            backend: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("patient_label", &self.patient_label)
            .field("geometry", &self.geometry)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn DiagnosisBackend>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProcessingProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// The backend the session talks to: the injected one, else HTTP.
    pub fn resolve_backend(&self) -> Arc<dyn DiagnosisBackend> {
        match self.backend {
            Some(ref backend) => Arc::clone(backend),
            None => Arc::new(ApiClient::new(self.api_url.clone())),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn patient_label(mut self, label: impl Into<String>) -> Self {
        self.config.patient_label = label.into();
        self
    }

    pub fn geometry(mut self, geometry: PageGeometry) -> Self {
        self.config.geometry = geometry;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn DiagnosisBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, MediDiagnoseError> {
        let c = &self.config;
        if c.backend.is_none()
            && !(c.api_url.starts_with("http://") || c.api_url.starts_with("https://"))
        {
            return Err(MediDiagnoseError::InvalidConfig(format!(
                "API URL must start with http:// or https://, got '{}'",
                c.api_url
            )));
        }
        if c.patient_label.trim().is_empty() {
            return Err(MediDiagnoseError::InvalidConfig(
                "Patient label must not be empty".into(),
            ));
        }
        c.geometry.validate()?;
        Ok(self.config)
    }
}
