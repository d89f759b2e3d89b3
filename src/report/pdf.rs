//! PDF output for a laid-out report.
//!
//! Uses the built-in Helvetica faces so no font files ship with the crate.

use super::layout::{FontWeight, ReportLayout, Rgb};
use crate::error::MediDiagnoseError;
use printpdf::{BuiltinFont, Color, Mm, PdfDocument};
use std::io::BufWriter;

/// Render `layout` to PDF bytes.
pub fn render_pdf(layout: &ReportLayout, title: &str) -> Result<Vec<u8>, MediDiagnoseError> {
    let g = &layout.geometry;
    let (width, height) = (Mm(g.page_width), Mm(g.page_height));
    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1");

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| render_err("font", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| render_err("font", e))?;

    for (n, page) in layout.pages.iter().enumerate() {
        let (page_idx, layer_idx) = if n == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, "Layer 1")
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);

        for item in &page.items {
            let font = match item.weight {
                FontWeight::Regular => &regular,
                FontWeight::Bold => &bold,
            };
            layer.set_fill_color(fill(item.color));
            // printpdf measures y from the bottom edge.
            layer.use_text(
                item.text.as_str(),
                item.font_size,
                Mm(item.x),
                Mm(g.page_height - item.y),
                font,
            );
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).map_err(|e| render_err("save", e))?;
    buf.into_inner().map_err(|e| render_err("buffer", e))
}

fn fill(Rgb(r, g, b): Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn render_err(stage: &str, e: impl std::fmt::Display) -> MediDiagnoseError {
    MediDiagnoseError::ReportRenderFailed(format!("PDF {stage} error: {e}"))
}
