//! Client-side report rendering.
//!
//! Rendering happens in two stages:
//!
//! ```text
//! DiagnosisData + extracted text
//!     │
//!     ▼  layout::layout_report     (pure: positioned text per page)
//! ReportLayout
//!     │
//!     ▼  pdf::render_pdf           (printpdf, built-in Helvetica)
//! PDF bytes
//! ```
//!
//! [`snapshot`] is the secondary path: it paginates a raster capture of the
//! results view instead of laying out text.
//!
//! Nothing in this module writes to disk except [`write_pdf`], which callers
//! use explicitly to deliver the bytes.

pub mod layout;
pub mod pdf;
pub mod snapshot;
pub mod wrap;

pub use layout::{layout_report, ReportContent, ReportLayout, REPORT_TITLE};
pub use snapshot::{plan_snapshot_bands, snapshot_bytes_to_pdf, snapshot_to_pdf, SnapshotBand};

use crate::error::MediDiagnoseError;
use crate::model::DiagnosisData;
use std::path::Path;
use tracing::{debug, info};

/// Page size and the vertical limits text flows within, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    /// Where flowing text resumes on a fresh page.
    pub margin_top: f32,
    /// Usable line width for wrapped text.
    pub text_width: f32,
    /// A cursor past this before the extracted-text section forces a new page.
    pub break_threshold: f32,
    /// No flowing line starts below this.
    pub flow_bottom: f32,
    /// Baseline of the disclaimer on the last page.
    pub disclaimer_y: f32,
}

impl Default for PageGeometry {
    /// A4 portrait.
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin_left: 20.0,
            margin_top: 20.0,
            text_width: 170.0,
            break_threshold: 250.0,
            flow_bottom: 280.0,
            disclaimer_y: 285.0,
        }
    }
}

impl PageGeometry {
    /// Check the limits are ordered top to bottom and fit on the page.
    pub fn validate(&self) -> Result<(), MediDiagnoseError> {
        let bad = |msg: String| Err(MediDiagnoseError::InvalidConfig(msg));

        if !(self.page_width > 0.0 && self.page_height > 0.0) {
            return bad(format!(
                "page size must be positive, got {}x{} mm",
                self.page_width, self.page_height
            ));
        }
        if self.text_width <= 0.0
            || self.margin_left < 0.0
            || self.margin_left + self.text_width > self.page_width
        {
            return bad(format!(
                "text width {} mm at margin {} mm does not fit a {} mm page",
                self.text_width, self.margin_left, self.page_width
            ));
        }
        let ordered = 0.0 <= self.margin_top
            && self.margin_top < self.break_threshold
            && self.break_threshold <= self.flow_bottom
            && self.flow_bottom < self.disclaimer_y
            && self.disclaimer_y < self.page_height;
        if !ordered {
            return bad(format!(
                "vertical limits must satisfy margin_top < break_threshold <= flow_bottom \
                 < disclaimer_y < page_height, got {} / {} / {} / {} / {}",
                self.margin_top,
                self.break_threshold,
                self.flow_bottom,
                self.disclaimer_y,
                self.page_height
            ));
        }
        Ok(())
    }
}

/// Render a diagnosis report on A4 pages.
///
/// Returns PDF bytes; nothing is written to disk.
pub fn generate_report(
    diagnosis: &DiagnosisData,
    extracted_text: &str,
    patient_label: &str,
) -> Result<Vec<u8>, MediDiagnoseError> {
    generate_report_with(diagnosis, extracted_text, patient_label, &PageGeometry::default())
}

/// [`generate_report`] with explicit page geometry.
pub fn generate_report_with(
    diagnosis: &DiagnosisData,
    extracted_text: &str,
    patient_label: &str,
    geometry: &PageGeometry,
) -> Result<Vec<u8>, MediDiagnoseError> {
    geometry.validate()?;
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let content = ReportContent {
        diagnosis,
        extracted_text,
        patient_label,
        generated_at: &generated_at,
    };

    let layout = layout_report(&content, geometry);
    debug!(pages = layout.pages.len(), "Report laid out");
    pdf::render_pdf(&layout, REPORT_TITLE)
}

/// Write PDF bytes to `path` atomically (temp file + rename).
pub async fn write_pdf(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), MediDiagnoseError> {
    let path = path.as_ref();
    let write_err = |e| MediDiagnoseError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
