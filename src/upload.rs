//! Upload classification: turn a user-selected file into an [`UploadFile`].
//!
//! The processing pipeline only cares about the file's *declared* media type:
//! `application/pdf` goes to the PDF text-extraction service and every other
//! accepted type goes to image OCR. Files read from disk get their declared
//! type from the extension, the way a browser file picker assigns one. A
//! `%PDF` header upgrades an unrecognised extension to a PDF so renamed
//! exports are not rejected.

use crate::error::MediDiagnoseError;
use std::path::Path;
use tracing::debug;

/// Media type that routes a file to the PDF text-extraction path.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Accepted extensions and the media type each one declares.
const ACCEPTED: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("tiff", "image/tiff"),
    ("tif", "image/tiff"),
    ("webp", "image/webp"),
    ("pdf", PDF_MEDIA_TYPE),
];

/// Which extraction service a file is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Pdf,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Pdf => "pdf",
        }
    }
}

/// A report file ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent in the multipart body.
    pub name: String,
    /// Declared media type, e.g. `image/png` or `application/pdf`.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Wrap in-memory bytes with an explicit declared media type.
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Classify by declared media type only.
    pub fn kind(&self) -> MediaKind {
        if self.media_type == PDF_MEDIA_TYPE {
            MediaKind::Pdf
        } else {
            MediaKind::Image
        }
    }

    /// Read a report from disk and assign its declared media type.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, MediDiagnoseError> {
        let path = path.as_ref().to_path_buf();

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(MediDiagnoseError::PermissionDenied { path });
            }
            Err(_) => return Err(MediDiagnoseError::FileNotFound { path }),
        };

        let name = file_name(&path);
        let media_type = declared_media_type(&path, &bytes).ok_or_else(|| {
            MediDiagnoseError::UnsupportedFileType {
                name: name.clone(),
                media_type: "application/octet-stream".to_string(),
            }
        })?;

        debug!(
            "Loaded {} ({}, {} bytes)",
            path.display(),
            media_type,
            bytes.len()
        );

        Ok(Self {
            name,
            media_type: media_type.to_string(),
            bytes,
        })
    }
}

/// Media type for an accepted extension, case-insensitive.
pub fn media_type_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_ascii_lowercase();
    ACCEPTED
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

fn declared_media_type(path: &Path, bytes: &[u8]) -> Option<&'static str> {
    let by_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(media_type_for_extension);
    by_ext.or_else(|| bytes.starts_with(b"%PDF").then_some(PDF_MEDIA_TYPE))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string())
}
