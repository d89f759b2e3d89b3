//! Pure page layout for the diagnosis report.
//!
//! [`layout_report`] turns a diagnosis and its extracted text into positioned
//! text instructions. Nothing here touches a PDF library, which keeps every
//! placement rule testable on plain data. Coordinates are millimetres with y
//! measured from the top of the page.

use super::wrap::{to_win_ansi, wrap_text};
use super::PageGeometry;
use crate::model::DiagnosisData;

// ── Fixed placements (mm from top) ───────────────────────────────────────

const TITLE_Y: f32 = 20.0;
const GENERATED_Y: f32 = 30.0;
const PATIENT_Y: f32 = 40.0;
const RESULTS_HEADING_Y: f32 = 55.0;
const CONDITION_Y: f32 = 65.0;
const SEVERITY_Y: f32 = 73.0;
const TREATMENT_HEADING_Y: f32 = 90.0;
const TREATMENT_BODY_Y: f32 = 100.0;

// ── Vertical advances (mm) ───────────────────────────────────────────────

const TREATMENT_LINE_ADVANCE: f32 = 6.0;
const AFTER_TREATMENT_GAP: f32 = 5.0;
const HEADING_ADVANCE: f32 = 10.0;
const PRECAUTION_ADVANCE: f32 = 8.0;
const SECTION_GAP: f32 = 15.0;
const EXTRACTED_LINE_ADVANCE: f32 = 5.0;

// ── Font sizes (pt) ──────────────────────────────────────────────────────

const TITLE_SIZE: f32 = 22.0;
const GENERATED_SIZE: f32 = 10.0;
const BODY_SIZE: f32 = 12.0;
const RESULTS_HEADING_SIZE: f32 = 16.0;
const SECTION_HEADING_SIZE: f32 = 14.0;
const EXTRACTED_SIZE: f32 = 10.0;
const DISCLAIMER_SIZE: f32 = 8.0;

/// Report title printed at the top of the first page.
pub const REPORT_TITLE: &str = "MediDiagnose AI Report";

/// Fixed footer on the last page.
pub const DISCLAIMER: &str = "DISCLAIMER: This AI-generated diagnosis is for informational purposes only and should not replace professional medical advice.";

pub const TREATMENT_HEADING: &str = "Recommended Treatment";
pub const PRECAUTIONS_HEADING: &str = "Precautions & Next Steps";
pub const EXTRACTED_HEADING: &str = "Extracted Text from Report";

/// Prefix of every precaution line.
pub const BULLET: &str = "\u{2022} ";

/// An RGB colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const PRIMARY: Rgb = Rgb(10, 110, 189);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const MUTED: Rgb = Rgb(100, 100, 100);
    pub const BODY: Rgb = Rgb(60, 60, 60);
    pub const EXTRACTED: Rgb = Rgb(80, 80, 80);
    pub const DISCLAIMER: Rgb = Rgb(150, 150, 150);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// What a text item is, so callers and tests can find lines by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    GeneratedAt,
    Patient,
    Heading,
    Summary,
    Treatment,
    Precaution,
    ExtractedText,
    Disclaimer,
}

/// One line of text at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    /// Left edge, mm from the left of the page.
    pub x: f32,
    /// Baseline, mm from the top of the page.
    pub y: f32,
    pub font_size: f32,
    pub weight: FontWeight,
    pub color: Rgb,
    pub role: TextRole,
}

/// All text placed on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePlan {
    pub items: Vec<TextItem>,
}

impl PagePlan {
    pub fn with_role(&self, role: TextRole) -> impl Iterator<Item = &TextItem> {
        self.items.iter().filter(move |i| i.role == role)
    }
}

/// A complete report, page by page. Always has at least one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub geometry: PageGeometry,
    pub pages: Vec<PagePlan>,
}

impl ReportLayout {
    /// Every item of `role` across all pages, in reading order.
    pub fn items_with_role(&self, role: TextRole) -> Vec<&TextItem> {
        self.pages.iter().flat_map(|p| p.with_role(role)).collect()
    }
}

/// Inputs for one report.
#[derive(Debug, Clone, Copy)]
pub struct ReportContent<'a> {
    pub diagnosis: &'a DiagnosisData,
    pub extracted_text: &'a str,
    pub patient_label: &'a str,
    /// Pre-formatted local timestamp for the "Generated on:" line.
    pub generated_at: &'a str,
}

/// Lay out a report on pages of `geometry`.
pub fn layout_report(content: &ReportContent<'_>, geometry: &PageGeometry) -> ReportLayout {
    let mut page = PageCursor::new(geometry);
    let diagnosis = content.diagnosis;

    // ── Title block ──────────────────────────────────────────────────────
    page.place_at(
        TITLE_Y,
        REPORT_TITLE,
        Style::new(TITLE_SIZE, Rgb::PRIMARY).bold(),
        TextRole::Title,
    );
    page.place_at(
        GENERATED_Y,
        &format!("Generated on: {}", content.generated_at),
        Style::new(GENERATED_SIZE, Rgb::MUTED),
        TextRole::GeneratedAt,
    );
    page.place_at(
        PATIENT_Y,
        &format!("Patient: {}", content.patient_label),
        Style::new(BODY_SIZE, Rgb::BODY),
        TextRole::Patient,
    );
    page.place_at(
        RESULTS_HEADING_Y,
        "Diagnosis Results",
        Style::new(RESULTS_HEADING_SIZE, Rgb::BLACK).bold(),
        TextRole::Heading,
    );
    page.place_at(
        CONDITION_Y,
        &format!("Condition: {}", diagnosis.disease),
        Style::new(BODY_SIZE, Rgb::BODY),
        TextRole::Summary,
    );
    page.place_at(
        SEVERITY_Y,
        &format!("Severity: {}", diagnosis.severity.label()),
        Style::new(BODY_SIZE, Rgb::BODY),
        TextRole::Summary,
    );

    // ── Treatment ────────────────────────────────────────────────────────
    page.place_at(
        TREATMENT_HEADING_Y,
        TREATMENT_HEADING,
        Style::new(SECTION_HEADING_SIZE, Rgb::BLACK).bold(),
        TextRole::Heading,
    );
    page.cursor = TREATMENT_BODY_Y;
    let body = Style::new(BODY_SIZE, Rgb::BODY);
    for line in wrap_text(&diagnosis.treatment, geometry.text_width, BODY_SIZE) {
        page.flow(&line, body, TextRole::Treatment, TREATMENT_LINE_ADVANCE);
    }
    page.cursor += AFTER_TREATMENT_GAP;

    // ── Precautions ──────────────────────────────────────────────────────
    let heading = Style::new(SECTION_HEADING_SIZE, Rgb::BLACK).bold();
    page.flow(PRECAUTIONS_HEADING, heading, TextRole::Heading, HEADING_ADVANCE);
    for precaution in &diagnosis.precautions {
        page.flow(
            &format!("{BULLET}{precaution}"),
            body,
            TextRole::Precaution,
            PRECAUTION_ADVANCE,
        );
    }

    // ── Extracted text ───────────────────────────────────────────────────
    if page.cursor > geometry.break_threshold {
        page.new_page();
    } else {
        page.cursor += SECTION_GAP;
    }
    page.flow(EXTRACTED_HEADING, heading, TextRole::Heading, HEADING_ADVANCE);
    let extracted = Style::new(EXTRACTED_SIZE, Rgb::EXTRACTED);
    for line in wrap_text(content.extracted_text, geometry.text_width, EXTRACTED_SIZE) {
        page.flow(&line, extracted, TextRole::ExtractedText, EXTRACTED_LINE_ADVANCE);
    }

    // ── Disclaimer ───────────────────────────────────────────────────────
    page.place_at(
        geometry.disclaimer_y,
        DISCLAIMER,
        Style::new(DISCLAIMER_SIZE, Rgb::DISCLAIMER),
        TextRole::Disclaimer,
    );

    page.finish()
}

#[derive(Debug, Clone, Copy)]
struct Style {
    size: f32,
    color: Rgb,
    weight: FontWeight,
}

impl Style {
    fn new(size: f32, color: Rgb) -> Self {
        Self {
            size,
            color,
            weight: FontWeight::Regular,
        }
    }

    fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }
}

/// Accumulates pages and tracks the vertical cursor on the current one.
struct PageCursor<'g> {
    geometry: &'g PageGeometry,
    done: Vec<PagePlan>,
    current: PagePlan,
    cursor: f32,
}

impl<'g> PageCursor<'g> {
    fn new(geometry: &'g PageGeometry) -> Self {
        Self {
            geometry,
            done: Vec::new(),
            current: PagePlan::default(),
            cursor: geometry.margin_top,
        }
    }

    fn new_page(&mut self) {
        self.done.push(std::mem::take(&mut self.current));
        self.cursor = self.geometry.margin_top;
    }

    fn place_at(&mut self, y: f32, text: &str, style: Style, role: TextRole) {
        self.current.items.push(TextItem {
            text: to_win_ansi(text).into_owned(),
            x: self.geometry.margin_left,
            y,
            font_size: style.size,
            weight: style.weight,
            color: style.color,
            role,
        });
    }

    /// Place at the cursor, breaking first if the line would start below
    /// the flow bottom, then advance.
    fn flow(&mut self, text: &str, style: Style, role: TextRole, advance: f32) {
        if self.cursor > self.geometry.flow_bottom {
            self.new_page();
        }
        self.place_at(self.cursor, text, style, role);
        self.cursor += advance;
    }

    fn finish(mut self) -> ReportLayout {
        self.done.push(self.current);
        ReportLayout {
            geometry: *self.geometry,
            pages: self.done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn diagnosis(treatment: &str, precautions: &[&str]) -> DiagnosisData {
        DiagnosisData {
            disease: "Hypertension".into(),
            treatment: treatment.into(),
            precautions: precautions.iter().map(|p| p.to_string()).collect(),
            severity: Severity::Moderate,
            additional_info: None,
            confidence: None,
        }
    }

    fn layout(data: &DiagnosisData, extracted: &str) -> ReportLayout {
        let content = ReportContent {
            diagnosis: data,
            extracted_text: extracted,
            patient_label: "Patient",
            generated_at: "2026-10-16 09:30:00",
        };
        layout_report(&content, &PageGeometry::default())
    }

    fn heading_y(layout: &ReportLayout, text: &str) -> (usize, f32) {
        layout
            .pages
            .iter()
            .enumerate()
            .find_map(|(n, p)| {
                p.with_role(TextRole::Heading)
                    .find(|i| i.text == text)
                    .map(|i| (n, i.y))
            })
            .unwrap_or_else(|| panic!("heading {text:?} missing"))
    }

    #[test]
    fn title_block_positions() {
        let data = diagnosis("Rest", &[]);
        let l = layout(&data, "");
        let first = &l.pages[0];

        let title = first.with_role(TextRole::Title).next().unwrap();
        assert_eq!((title.text.as_str(), title.y, title.font_size), (REPORT_TITLE, 20.0, 22.0));
        assert_eq!(title.color, Rgb::PRIMARY);

        let generated = first.with_role(TextRole::GeneratedAt).next().unwrap();
        assert_eq!(generated.text, "Generated on: 2026-10-16 09:30:00");
        assert_eq!(generated.y, 30.0);

        let patient = first.with_role(TextRole::Patient).next().unwrap();
        assert_eq!((patient.text.as_str(), patient.y), ("Patient: Patient", 40.0));

        let summary: Vec<_> = first
            .with_role(TextRole::Summary)
            .map(|i| (i.text.as_str(), i.y))
            .collect();
        assert_eq!(
            summary,
            vec![("Condition: Hypertension", 65.0), ("Severity: Moderate", 73.0)]
        );
        assert_eq!(heading_y(&l, "Diagnosis Results"), (0, 55.0));
        assert_eq!(heading_y(&l, TREATMENT_HEADING), (0, 90.0));
    }

    #[test]
    fn precautions_are_bulleted_in_order() {
        let data = diagnosis("Rest", &["Rest", "Hydrate", "Follow up"]);
        let l = layout(&data, "");

        let lines: Vec<_> = l
            .items_with_role(TextRole::Precaution)
            .into_iter()
            .map(|i| (i.text.clone(), i.y))
            .collect();
        // One treatment line: cursor 105 + 6 = 111, heading there, bullets from 121.
        assert_eq!(heading_y(&l, PRECAUTIONS_HEADING), (0, 111.0));
        assert_eq!(
            lines,
            vec![
                ("\u{2022} Rest".to_string(), 121.0),
                ("\u{2022} Hydrate".to_string(), 129.0),
                ("\u{2022} Follow up".to_string(), 137.0),
            ]
        );
    }

    #[test]
    fn long_treatment_wraps_and_advances_cursor() {
        let treatment = "Lifestyle modification with reduced sodium intake, regular aerobic exercise and weight management. ".repeat(4);
        let data = diagnosis(&treatment, &[]);
        let l = layout(&data, "");

        let lines = l.items_with_role(TextRole::Treatment);
        let n = lines.len();
        assert!(n > 1, "treatment should wrap");
        for (k, line) in lines.iter().enumerate() {
            assert_eq!(line.y, 100.0 + 6.0 * k as f32);
        }
        assert_eq!(heading_y(&l, PRECAUTIONS_HEADING), (0, 105.0 + 6.0 * n as f32));
    }

    #[test]
    fn extracted_text_follows_precautions_on_short_reports() {
        let data = diagnosis("Rest", &["Hydrate"]);
        let l = layout(&data, "BP 150/95\nHR 80");

        // 111 heading, 121 bullet, cursor 129, +15 → 144.
        assert_eq!(heading_y(&l, EXTRACTED_HEADING), (0, 144.0));
        let extracted: Vec<_> = l
            .items_with_role(TextRole::ExtractedText)
            .into_iter()
            .map(|i| (i.text.as_str(), i.y, i.font_size))
            .collect();
        assert_eq!(extracted, vec![("BP 150/95", 154.0, 10.0), ("HR 80", 159.0, 10.0)]);
        assert_eq!(l.pages.len(), 1);
    }

    #[test]
    fn cursor_past_threshold_starts_new_page() {
        // 111 heading, bullets from 121: cursor after k items = 121 + 8k.
        // 17 items → 257 > 250.
        let items: Vec<String> = (1..=17).map(|i| format!("Step {i}")).collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        let data = diagnosis("Rest", &refs);
        let l = layout(&data, "text");

        assert_eq!(heading_y(&l, EXTRACTED_HEADING), (1, 20.0));
        let first_line = l.items_with_role(TextRole::ExtractedText)[0];
        assert_eq!(first_line.y, 30.0);
    }

    #[test]
    fn cursor_at_threshold_stays_on_page() {
        // 16 items → cursor 249, not past the threshold.
        let items: Vec<String> = (1..=16).map(|i| format!("Step {i}")).collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        let data = diagnosis("Rest", &refs);
        let l = layout(&data, "text");

        assert_eq!(heading_y(&l, EXTRACTED_HEADING), (0, 264.0));
    }

    #[test]
    fn long_extracted_text_flows_onto_more_pages() {
        let extracted = (1..=120)
            .map(|i| format!("Line {i}: lab value within range"))
            .collect::<Vec<_>>()
            .join("\n");
        let data = diagnosis("Rest", &["Hydrate"]);
        let l = layout(&data, &extracted);

        assert!(l.pages.len() >= 3, "got {} pages", l.pages.len());
        let lines = l.items_with_role(TextRole::ExtractedText);
        assert_eq!(lines.len(), 120);
        assert_eq!(lines[0].text, "Line 1: lab value within range");
        assert_eq!(lines[119].text, "Line 120: lab value within range");
        for page in &l.pages {
            for item in page.items.iter().filter(|i| i.role != TextRole::Disclaimer) {
                assert!(item.y <= 280.0, "{:?} below flow bottom", item.text);
            }
        }
    }

    #[test]
    fn disclaimer_only_on_last_page() {
        let extracted = "word ".repeat(3000);
        let data = diagnosis("Rest", &[]);
        let l = layout(&data, &extracted);

        let last = l.pages.len() - 1;
        for (n, page) in l.pages.iter().enumerate() {
            let count = page.with_role(TextRole::Disclaimer).count();
            assert_eq!(count, usize::from(n == last), "page {n}");
        }
        let disclaimer = l.pages[last].with_role(TextRole::Disclaimer).next().unwrap();
        assert_eq!((disclaimer.y, disclaimer.font_size), (285.0, 8.0));
        assert_eq!(disclaimer.color, Rgb::DISCLAIMER);
    }

    #[test]
    fn empty_inputs_still_produce_a_page() {
        let data = DiagnosisData::default();
        let l = layout(&data, "");
        assert_eq!(l.pages.len(), 1);
        assert!(l.items_with_role(TextRole::Precaution).is_empty());
        assert_eq!(heading_y(&l, EXTRACTED_HEADING).0, 0);
    }
}
