//! Document rendering (`.pdf`)
//!
//! A small PDF 1.4 writer: A4 pages, the two standard Helvetica faces, text
//! placed at absolute positions. No embedded fonts, no compression, so the
//! output is plain enough to inspect with a text editor.
//!
//! Content, top to bottom: a colored header band with the experiment name, a
//! summary block, the KPI list, then a table of the first
//! [`DOCUMENT_RESULT_LIMIT`] series points. Content flows onto further pages
//! when it does not fit.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::{summary_fields, DOCUMENT_RESULT_LIMIT};
use crate::experiment::Experiment;

/// A4 width in points.
pub const PAGE_WIDTH: f32 = 595.0;
/// A4 height in points.
pub const PAGE_HEIGHT: f32 = 842.0;

const MARGIN: f32 = 50.0;
const BAND_HEIGHT: f32 = 70.0;
const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 13.0;
const LEADING: f32 = 1.5;
const TABLE_COLUMNS: [f32; 4] = [0.0, 90.0, 210.0, 330.0];

/// Typeface of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    /// Helvetica
    Regular,
    /// Helvetica-Bold
    Bold,
}

impl Face {
    const fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

/// One positioned text run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Left edge, points from the page's left
    pub x: f32,
    /// Baseline, points from the page's bottom
    pub y: f32,
    /// Font size in points
    pub size: f32,
    /// Typeface
    pub face: Face,
    /// Text
    pub text: String,
}

/// Laid-out page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// Whether the header band is drawn
    pub band: bool,
    /// Text runs in drawing order
    pub runs: Vec<TextRun>,
}

/// Laid-out document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    /// Document title
    pub title: String,
    /// Creation timestamp written to the info dictionary
    pub created_at: DateTime<Utc>,
    /// Pages in order
    pub pages: Vec<Page>,
    /// Series rows placed in the results table
    pub result_rows: usize,
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page {
                band: true,
                runs: Vec::new(),
            }],
            y: PAGE_HEIGHT - BAND_HEIGHT - MARGIN,
        }
    }

    /// Reserve a line of `size`, breaking the page if needed; returns the baseline.
    fn advance(&mut self, size: f32) -> f32 {
        let height = size * LEADING;
        if self.y - height < MARGIN {
            self.pages.push(Page::default());
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.y -= height;
        self.y
    }

    fn gap(&mut self, points: f32) {
        self.y -= points;
    }

    fn put(&mut self, x: f32, y: f32, size: f32, face: Face, text: impl Into<String>) {
        if let Some(page) = self.pages.last_mut() {
            page.runs.push(TextRun {
                x,
                y,
                size,
                face,
                text: text.into(),
            });
        }
    }

    fn line(&mut self, size: f32, face: Face, text: impl Into<String>) {
        let y = self.advance(size);
        self.put(MARGIN, y, size, face, text);
    }

    fn row(&mut self, face: Face, cells: &[String]) {
        let y = self.advance(BODY_SIZE);
        for (offset, cell) in TABLE_COLUMNS.iter().zip(cells) {
            self.put(MARGIN + offset, y, BODY_SIZE, face, cell.clone());
        }
    }
}

fn fitness(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"))
}

/// Lay out the document without encoding it.
#[must_use]
pub fn layout(experiment: &Experiment) -> DocumentLayout {
    let mut cursor = Cursor::new();

    let band_top = PAGE_HEIGHT - BAND_HEIGHT;
    cursor.put(MARGIN, band_top + 38.0, 20.0, Face::Bold, "Experiment Report");
    cursor.put(MARGIN, band_top + 16.0, 12.0, Face::Regular, experiment.name());

    cursor.line(HEADING_SIZE, Face::Bold, "Summary");
    for (field, value) in summary_fields(experiment) {
        cursor.line(BODY_SIZE, Face::Regular, format!("{field}: {value}"));
    }
    cursor.gap(BODY_SIZE);

    cursor.line(HEADING_SIZE, Face::Bold, "Key Performance Indicators");
    if experiment.kpis().is_empty() {
        cursor.line(BODY_SIZE, Face::Regular, "No KPIs reported");
    }
    for kpi in experiment.kpis() {
        cursor.line(
            BODY_SIZE,
            Face::Regular,
            format!("{}: {}", kpi.label(), kpi.value()),
        );
    }
    cursor.gap(BODY_SIZE);

    let series = experiment.result_series();
    let shown = series.len().min(DOCUMENT_RESULT_LIMIT);
    cursor.line(
        HEADING_SIZE,
        Face::Bold,
        format!("Results (first {shown} of {} iterations)", series.len()),
    );
    cursor.row(
        Face::Bold,
        &[
            "Iteration".to_string(),
            "Best Fitness".to_string(),
            "Avg Fitness".to_string(),
            "Std Fitness".to_string(),
        ],
    );
    for point in &series[..shown] {
        cursor.row(
            Face::Regular,
            &[
                point.iteration().to_string(),
                fitness(Some(point.best_fitness())),
                fitness(point.avg_fitness()),
                fitness(point.std_fitness()),
            ],
        );
    }

    DocumentLayout {
        title: experiment.name().to_string(),
        created_at: experiment.created_at(),
        pages: cursor.pages,
        result_rows: shown,
    }
}

/// Render `experiment` as PDF bytes.
#[must_use]
pub fn render(experiment: &Experiment) -> Vec<u8> {
    encode(&layout(experiment))
}

/// Encode a layout. Output depends only on the layout.
#[must_use]
pub fn encode(doc: &DocumentLayout) -> Vec<u8> {
    let mut writer = PdfWriter::new();

    // Fixed objects: 1 catalog, 2 page tree, 3-4 fonts, 5 info.
    // Page i uses objects 6 + 2i (page) and 7 + 2i (content).
    let kids: Vec<String> = (0..doc.pages.len())
        .map(|i| format!("{} 0 R", 6 + 2 * i))
        .collect();

    writer.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    writer.object(
        2,
        &format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            doc.pages.len()
        ),
    );
    writer.object(
        3,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    writer.object(
        4,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );
    writer.object(
        5,
        &format!(
            "<< /Title ({}) /Producer (beelab) /CreationDate ({}) >>",
            escape(&doc.title),
            pdf_date(doc.created_at)
        ),
    );

    for (i, page) in doc.pages.iter().enumerate() {
        let page_id = 6 + 2 * i;
        writer.object(
            page_id,
            &format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                page_id + 1
            ),
        );
        writer.stream(page_id + 1, &content_stream(page));
    }

    writer.finish(5 + 2 * doc.pages.len())
}

fn content_stream(page: &Page) -> String {
    let mut ops = String::new();
    if page.band {
        let _ = writeln!(
            ops,
            "q 0.96 0.76 0.18 rg 0 {} {PAGE_WIDTH} {BAND_HEIGHT} re f Q",
            PAGE_HEIGHT - BAND_HEIGHT
        );
    }
    for run in &page.runs {
        let _ = writeln!(
            ops,
            "BT /{} {} Tf {} {} Td ({}) Tj ET",
            run.face.resource(),
            run.size,
            run.x,
            run.y,
            escape(&run.text)
        );
    }
    ops
}

/// `D:YYYYMMDDHHmmSSZ`
fn pdf_date(at: DateTime<Utc>) -> String {
    at.format("D:%Y%m%d%H%M%SZ").to_string()
}

/// Escape text for a PDF literal string in `WinAnsiEncoding`.
///
/// Latin-1 characters become octal escapes, anything else becomes `?`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\t' | '\n' | '\r' => out.push(' '),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", u32::from(c));
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Byte buffer that records object offsets for the cross-reference table.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, id: usize, body: &str) {
        self.offsets.push((id, self.buf.len()));
        self.buf
            .extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    fn stream(&mut self, id: usize, content: &str) {
        self.offsets.push((id, self.buf.len()));
        self.buf.extend_from_slice(
            format!(
                "{id} 0 obj\n<< /Length {} >>\nstream\n{content}endstream\nendobj\n",
                content.len()
            )
            .as_bytes(),
        );
    }

    fn finish(mut self, last_id: usize) -> Vec<u8> {
        self.offsets.sort_unstable();
        let xref_at = self.buf.len();
        let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", last_id + 1);
        for (_, offset) in &self.offsets {
            let _ = write!(tail, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            tail,
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            last_id + 1
        );
        self.buf.extend_from_slice(tail.as_bytes());
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{BeeParams, ExperimentInput, Kpi, ResultSeriesPoint};

    fn experiment(points: u32, kpis: usize) -> Experiment {
        Experiment::builder(
            "doc-1",
            "Report (draft)",
            BeeParams::new(20, points.max(1)),
            ExperimentInput::manual(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
        )
        .kpis((0..kpis).map(|i| Kpi::new(format!("KPI {i}"), 1.0)).collect())
        .result_series(
            (1..=points)
                .map(|i| ResultSeriesPoint::new(i, 50.0 - f64::from(i) * 0.1))
                .collect(),
        )
        .build()
    }

    fn count_rows(doc: &DocumentLayout) -> usize {
        doc.pages
            .iter()
            .flat_map(|p| &p.runs)
            .filter(|r| r.face == Face::Regular && (r.x - MARGIN).abs() < f32::EPSILON)
            .filter(|r| r.text.parse::<u32>().is_ok())
            .count()
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape("é"), "\\351");
        assert_eq!(escape("蜂"), "?");
    }

    #[test]
    fn test_pdf_date() {
        let at = DateTime::parse_from_rfc3339("2024-03-05T07:08:09Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(pdf_date(at), "D:20240305070809Z");
    }

    #[test]
    fn test_results_capped() {
        let doc = layout(&experiment(100, 7));
        assert_eq!(doc.result_rows, DOCUMENT_RESULT_LIMIT);
        assert_eq!(count_rows(&doc), DOCUMENT_RESULT_LIMIT);
    }

    #[test]
    fn test_short_series_in_full() {
        let doc = layout(&experiment(5, 7));
        assert_eq!(doc.result_rows, 5);
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].band);
    }

    #[test]
    fn test_overflow_paginates() {
        let doc = layout(&experiment(30, 80));
        assert!(doc.pages.len() > 1);
        assert!(!doc.pages[1].band);
        for page in &doc.pages {
            for run in &page.runs {
                assert!(run.y >= MARGIN, "run below margin: {run:?}");
            }
        }
        assert_eq!(count_rows(&doc), DOCUMENT_RESULT_LIMIT);
    }

    #[test]
    fn test_encoded_structure() {
        let bytes = render(&experiment(3, 2));
        let text = String::from_utf8_lossy(&bytes);
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("(Report \\(draft\\)) Tj"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let bytes = render(&experiment(3, 2));
        let startxref = bytes.windows(10).rposition(|w| w == b"startxref\n").unwrap();
        let tail = std::str::from_utf8(&bytes[startxref + 10..]).unwrap();
        let xref_at: usize = tail.lines().next().unwrap().parse().unwrap();
        let table = std::str::from_utf8(&bytes[xref_at..]).unwrap();
        assert!(table.starts_with("xref\n0 8\n"));
        for (i, entry) in table.lines().skip(3).take(7).enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let header = format!("{} 0 obj", i + 1);
            assert!(bytes[offset..].starts_with(header.as_bytes()), "object {}", i + 1);
        }
    }
}
