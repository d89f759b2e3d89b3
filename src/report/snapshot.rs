//! Paginate a raster capture into a PDF.
//!
//! The capture is scaled to the page width and cut into page-height bands,
//! one band per page, top to bottom. Band planning is separate from PDF
//! assembly so the pagination rule can be checked without decoding images.

use super::PageGeometry;
use crate::error::MediDiagnoseError;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::debug;

/// Millimetres to PDF points.
const MM_TO_PT: f32 = 72.0 / 25.4;

/// One page-height slice of a capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotBand {
    /// First pixel row of the band.
    pub top_px: u32,
    /// Rows in the band. Only the last band may be shorter than a page.
    pub height_px: u32,
    /// Rendered height once scaled to the page width.
    pub height_mm: f32,
}

/// Plan the bands for a `width_px` × `height_px` capture.
///
/// The band count is `ceil(scaled_height / page_height)`, so a capture whose
/// height is an exact multiple of the page height gets no trailing blank page.
/// An empty capture has no bands.
pub fn plan_snapshot_bands(
    width_px: u32,
    height_px: u32,
    geometry: &PageGeometry,
) -> Vec<SnapshotBand> {
    if width_px == 0 || height_px == 0 {
        return Vec::new();
    }
    let px_per_mm = width_px as f32 / geometry.page_width;
    let page_px = ((geometry.page_height * px_per_mm).round() as u32).max(1);

    let mut bands = Vec::new();
    let mut top = 0;
    while top < height_px {
        let rows = page_px.min(height_px - top);
        bands.push(SnapshotBand {
            top_px: top,
            height_px: rows,
            height_mm: rows as f32 / px_per_mm,
        });
        top += rows;
    }
    bands
}

/// Decode an encoded capture (PNG, JPEG, …) and paginate it.
pub fn snapshot_bytes_to_pdf(
    bytes: &[u8],
    geometry: &PageGeometry,
) -> Result<Vec<u8>, MediDiagnoseError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| MediDiagnoseError::SnapshotFailed(format!("cannot decode capture: {e}")))?;
    snapshot_to_pdf(&image, geometry)
}

/// Paginate a decoded capture into a PDF, one band per page.
///
/// Fails with [`MediDiagnoseError::InvalidConfig`] when `geometry` does not
/// describe a usable page.
pub fn snapshot_to_pdf(
    image: &DynamicImage,
    geometry: &PageGeometry,
) -> Result<Vec<u8>, MediDiagnoseError> {
    geometry.validate()?;
    let (width_px, height_px) = (image.width(), image.height());
    let bands = plan_snapshot_bands(width_px, height_px, geometry);
    if bands.is_empty() {
        return Err(MediDiagnoseError::SnapshotFailed(
            "capture has no pixels".into(),
        ));
    }
    debug!(width_px, height_px, pages = bands.len(), "Paginating capture");

    let page_w = geometry.page_width * MM_TO_PT;
    let page_h = geometry.page_height * MM_TO_PT;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(bands.len());

    for band in &bands {
        let pixels = image
            .crop_imm(0, band.top_px, width_px, band.height_px)
            .to_rgb8()
            .into_raw();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width_px),
                "Height" => i64::from(band.height_px),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            pixels,
        ));

        // Full page width, anchored to the top edge.
        let band_h = band.height_mm * MM_TO_PT;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        page_w.into(),
                        0.into(),
                        0.into(),
                        band_h.into(),
                        0.into(),
                        (page_h - band_h).into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| MediDiagnoseError::SnapshotFailed(format!("content stream: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| MediDiagnoseError::SnapshotFailed(format!("PDF save error: {e}")))?;
    Ok(buf)
}
