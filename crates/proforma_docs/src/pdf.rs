//! Paginated PDF generation for the eligibility proforma.
//!
//! Generates PDF files using raw PDF format construction with the built-in
//! Helvetica fonts, so no font files are required. Students are split into
//! batches, one file per batch. Each file repeats the title and metadata
//! block, the table header repeats on every page, and images are drawn as
//! overlays once the table has been laid out.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbImage;
use proforma_core::FormHeader;
use tracing::{debug, warn};

use crate::rows::{PreparedCell, PreparedRow};
use crate::schema::{self, HeaderCell, ImageKind};

// Landscape A4 in points.
const PAGE_WIDTH: f64 = 842.0;
const PAGE_HEIGHT: f64 = 595.0;
const MARGIN: f64 = 24.0;
const TABLE_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;

const HEADER_ROW_HEIGHTS: [f64; 2] = [34.0, 14.0];
const HEADER_FONT_SIZE: f64 = 6.0;
const BODY_FONT_SIZE: f64 = 7.0;
const BODY_LEADING: f64 = 8.5;
const CELL_PADDING: f64 = 2.0;
const MIN_ROW_HEIGHT: f64 = 46.0;

const FOOTER_FONT_SIZE: f64 = 7.5;
const FOOTER_LEADING: f64 = 9.5;
const FOOTER_GAP: f64 = 14.0;

/// Header fill for the grid theme.
const HEADER_FILL: &str = "0.85 0.88 0.92";

pub const CERTIFICATES: [&str; 3] = [
    "Certified that the particulars given above have been checked and verified from the \
     college records and are correct.",
    "Certified that the above students are bonafide full-time students of this college \
     and fulfil the eligibility conditions laid down by the University.",
    "Certified that none of the above students has exceeded the permissible number of \
     years of participation in Inter-College tournaments.",
];

/// Image footprint in points, centered in the cell. Half the rasterized
/// pixel box, so images are drawn at 144 dpi.
fn footprint(kind: ImageKind) -> (f64, f64) {
    let (w, h) = kind.box_px();
    (w as f64 / 2.0, h as f64 / 2.0)
}

pub fn batch_file_name(index: usize) -> String {
    format!("Eligibility_Form_Part{index}.pdf")
}

/// Number of files for `rows` students in batches of `batch_size`.
pub fn batch_count(rows: usize, batch_size: usize) -> usize {
    rows.div_ceil(batch_size.max(1))
}

/// One generated PDF file.
#[derive(Debug, Clone)]
pub struct PdfPart {
    pub file_name: String,
    pub row_count: usize,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

/// Generate one PDF per batch of `batch_size` rows.
pub fn generate_proforma_pdfs(
    header: &FormHeader,
    rows: &[PreparedRow],
    batch_size: usize,
    date: NaiveDate,
) -> Result<Vec<PdfPart>> {
    let batch_size = batch_size.max(1);
    rows.chunks(batch_size)
        .enumerate()
        .map(|(idx, batch)| {
            let index = idx + 1;
            let (bytes, page_count) = generate_proforma_pdf(header, batch, date)
                .with_context(|| format!("Failed to render PDF part {index}"))?;
            debug!(part = index, rows = batch.len(), pages = page_count, "pdf part generated");
            Ok(PdfPart {
                file_name: batch_file_name(index),
                row_count: batch.len(),
                page_count,
                bytes,
            })
        })
        .collect()
}

/// Render a single file. Returns the bytes and the page count.
pub fn generate_proforma_pdf(
    header: &FormHeader,
    rows: &[PreparedRow],
    date: NaiveDate,
) -> Result<(Vec<u8>, usize)> {
    let mut layout = Layout::new();
    layout.title_block(header);
    layout.table_header();

    for row in rows {
        layout.data_row(row);
    }
    layout.footer(date);

    let pages = layout.finish();
    let page_count = pages.len();

    let mut builder = PdfBuilder::new();
    for page in pages {
        let mut resources = Vec::new();
        let mut content = page.content;
        for (n, placement) in page.images.iter().enumerate() {
            let name = format!("Im{n}");
            let id = builder.add_image(&placement.pixels)?;
            content.push_str(&format!(
                "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /{name} Do Q\n",
                placement.width, placement.height, placement.x, placement.y
            ));
            resources.push((name, id));
        }
        builder.add_page(&content, &resources);
    }

    Ok((builder.build(&header.form_title), page_count))
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

struct ImagePlacement {
    pixels: RgbImage,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

struct Page {
    content: String,
    images: Vec<ImagePlacement>,
}

impl Page {
    fn new() -> Self {
        Self {
            content: String::new(),
            images: Vec::new(),
        }
    }
}

/// Lays content out top-down, starting a new page whenever the next block
/// does not fit above the bottom margin.
struct Layout {
    pages: Vec<Page>,
    current: Page,
    y: f64,
    col_x: Vec<f64>,
    col_w: Vec<f64>,
}

impl Layout {
    fn new() -> Self {
        let col_w = schema::scaled_widths(TABLE_WIDTH);
        let mut col_x = Vec::with_capacity(col_w.len());
        let mut x = MARGIN;
        for w in &col_w {
            col_x.push(x);
            x += w;
        }
        Self {
            pages: Vec::new(),
            current: Page::new(),
            y: PAGE_HEIGHT - MARGIN,
            col_x,
            col_w,
        }
    }

    fn fits(&self, height: f64) -> bool {
        self.y - height >= MARGIN
    }

    fn new_page(&mut self) {
        let done = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(done);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn finish(mut self) -> Vec<Page> {
        self.new_page();
        self.pages
    }

    fn out(&mut self) -> &mut String {
        &mut self.current.content
    }

    fn span_x(&self, first: usize, last: usize) -> (f64, f64) {
        let x = self.col_x[first];
        let w: f64 = self.col_w[first..=last].iter().sum();
        (x, w)
    }

    fn title_block(&mut self, header: &FormHeader) {
        let lines = [
            (header.institution.as_str(), 14.0),
            (header.department.as_str(), 11.0),
            (header.form_title.as_str(), 11.0),
        ];
        for (text, size) in lines {
            self.y -= size + 3.0;
            let width = text_width(text, size, true);
            let x = (PAGE_WIDTH - width) / 2.0;
            let y = self.y;
            text_at(self.out(), x, y, size, true, text);
        }

        // Metadata: first field at the left margin, the rest at increasing offsets.
        self.y -= 18.0;
        let y = self.y;
        let stops = [MARGIN, MARGIN + 260.0, MARGIN + 460.0, MARGIN + 620.0];
        for (field, x) in header.metadata_fields().iter().zip(stops) {
            text_at(self.out(), x, y, 8.5, false, field);
        }
        self.y -= 10.0;
    }

    fn table_header(&mut self) {
        let total: f64 = HEADER_ROW_HEIGHTS.iter().sum();
        if !self.fits(total + MIN_ROW_HEIGHT) {
            self.new_page();
        }
        let top = self.y;
        let row_top = |row: usize| top - HEADER_ROW_HEIGHTS[..row].iter().sum::<f64>();

        let cells: Vec<HeaderCell> = schema::numbered_header();
        for cell in &cells {
            let (x, w) = self.span_x(cell.first_col, cell.last_col);
            let cell_top = row_top(cell.row);
            let h: f64 = HEADER_ROW_HEIGHTS[cell.row..cell.row + cell.row_span].iter().sum();
            let out = self.out();
            out.push_str(&format!("{HEADER_FILL} rg\n"));
            out.push_str(&format!("{x:.2} {:.2} {w:.2} {h:.2} re f\n", cell_top - h));
            out.push_str("0 0 0 rg\n");
            stroke_rect(out, x, cell_top - h, w, h);
            let lines = wrap_text(&cell.text, w - 2.0 * CELL_PADDING, HEADER_FONT_SIZE, true);
            centered_lines(out, x, cell_top, w, h, HEADER_FONT_SIZE, HEADER_FONT_SIZE + 1.0, true, &lines);
        }
        self.y = top - total;
    }

    fn data_row(&mut self, row: &PreparedRow) {
        let wrapped: Vec<Vec<String>> = row
            .cells
            .iter()
            .zip(&self.col_w)
            .map(|(cell, w)| match cell {
                PreparedCell::Image(_) => Vec::new(),
                other => wrap_text(&other.text(), w - 2.0 * CELL_PADDING, BODY_FONT_SIZE, false),
            })
            .collect();
        let max_lines = wrapped.iter().map(Vec::len).max().unwrap_or(0);
        let height = row_height(max_lines);

        if height <= page_body_height() {
            if !self.fits(height) {
                self.new_page();
                self.table_header();
            }
            self.row_segment(row, &wrapped, 0, max_lines, height);
            return;
        }

        // Taller than a whole page: fill what is left here and continue the
        // remaining lines on the next pages.
        warn!(
            serial = row.serial,
            lines = max_lines,
            "row does not fit on one page, splitting it"
        );
        if !self.fits(MIN_ROW_HEIGHT) {
            self.new_page();
            self.table_header();
        }
        let mut start = 0;
        while start < max_lines {
            let room = ((self.y - MARGIN - 2.0 * CELL_PADDING) / BODY_LEADING).floor() as usize;
            let end = (start + room.max(1)).min(max_lines);
            let height = row_height(end - start).min(self.y - MARGIN);
            self.row_segment(row, &wrapped, start, end, height);
            start = end;
            if start < max_lines {
                self.new_page();
                self.table_header();
            }
        }
    }

    /// Draw lines `start..end` of every cell as one band of the table. Images
    /// only go into the band that starts the row.
    fn row_segment(
        &mut self,
        row: &PreparedRow,
        wrapped: &[Vec<String>],
        start: usize,
        end: usize,
        height: f64,
    ) {
        let top = self.y;
        for (col, (cell, lines)) in row.cells.iter().zip(wrapped).enumerate() {
            let (x, w) = (self.col_x[col], self.col_w[col]);
            stroke_rect(self.out(), x, top - height, w, height);
            match cell {
                PreparedCell::Image(Some(image)) if start == 0 => {
                    let (box_w, box_h) = footprint(image.kind);
                    let scale = (box_w / image.width() as f64)
                        .min(box_h / image.height() as f64)
                        .min((w - 2.0 * CELL_PADDING) / image.width() as f64)
                        .min((height - 2.0 * CELL_PADDING) / image.height() as f64);
                    let draw_w = image.width() as f64 * scale;
                    let draw_h = image.height() as f64 * scale;
                    self.current.images.push(ImagePlacement {
                        pixels: image.pixels.clone(),
                        x: x + (w - draw_w) / 2.0,
                        y: top - height + (height - draw_h) / 2.0,
                        width: draw_w,
                        height: draw_h,
                    });
                }
                PreparedCell::Image(_) => {}
                _ => {
                    let band = lines.get(start..end.min(lines.len())).unwrap_or(&[]);
                    centered_lines(
                        self.out(),
                        x,
                        top,
                        w,
                        height,
                        BODY_FONT_SIZE,
                        BODY_LEADING,
                        false,
                        band,
                    )
                }
            }
        }
        self.y = top - height;
    }

    fn footer(&mut self, date: NaiveDate) {
        let gap = 8.0;
        let col_w = (TABLE_WIDTH - 2.0 * gap) / 3.0;
        let columns: Vec<Vec<String>> = CERTIFICATES
            .iter()
            .map(|c| wrap_text(c, col_w, FOOTER_FONT_SIZE, false))
            .collect();
        let text_h = columns.iter().map(Vec::len).max().unwrap_or(0) as f64 * FOOTER_LEADING;
        let signature_h = 3.0 * FOOTER_GAP + 2.0 * FOOTER_LEADING;
        if !self.fits(FOOTER_GAP + text_h + signature_h) {
            self.new_page();
        }

        self.y -= FOOTER_GAP;
        let top = self.y;
        for (idx, lines) in columns.iter().enumerate() {
            let x = MARGIN + idx as f64 * (col_w + gap);
            for (n, line) in lines.iter().enumerate() {
                let y = top - FOOTER_FONT_SIZE - n as f64 * FOOTER_LEADING;
                text_at(self.out(), x, y, FOOTER_FONT_SIZE, false, line);
            }
        }
        self.y = top - text_h - FOOTER_GAP;

        let y = self.y;
        let date_line = format!("Date: {}", date.format("%d-%m-%Y"));
        text_at(self.out(), MARGIN, y, 8.5, false, &date_line);

        self.y -= FOOTER_GAP;
        let y = self.y;
        text_at(self.out(), MARGIN, y, 8.5, false, "Signature of DPE/Lecturer");

        let right = PAGE_WIDTH - MARGIN;
        for (line, bold) in [("PRINCIPAL", true), ("(Seal of College)", false)] {
            self.y -= FOOTER_LEADING + 2.0;
            let x = right - text_width(line, 8.5, bold);
            let y = self.y;
            text_at(self.out(), x, y, 8.5, bold, line);
        }
    }
}

/// Room for data rows on a page that starts with the table header.
fn page_body_height() -> f64 {
    PAGE_HEIGHT - 2.0 * MARGIN - HEADER_ROW_HEIGHTS.iter().sum::<f64>()
}

fn row_height(lines: usize) -> f64 {
    (lines as f64 * BODY_LEADING + 2.0 * CELL_PADDING).max(MIN_ROW_HEIGHT)
}

fn stroke_rect(out: &mut String, x: f64, y: f64, w: f64, h: f64) {
    out.push_str("0.4 w 0 0 0 RG\n");
    out.push_str(&format!("{x:.2} {y:.2} {w:.2} {h:.2} re S\n"));
}

fn text_at(out: &mut String, x: f64, y: f64, size: f64, bold: bool, text: &str) {
    let font = if bold { "F1" } else { "F2" };
    out.push_str("BT\n");
    out.push_str(&format!("/{font} {size:.1} Tf\n"));
    out.push_str(&format!("{x:.2} {y:.2} Td\n"));
    out.push_str(&format!("({}) Tj\n", pdf_escape(text)));
    out.push_str("ET\n");
}

/// Draw pre-wrapped lines centered horizontally and vertically in a box whose
/// top edge is at `top`.
#[allow(clippy::too_many_arguments)]
fn centered_lines(
    out: &mut String,
    x: f64,
    top: f64,
    w: f64,
    h: f64,
    size: f64,
    leading: f64,
    bold: bool,
    lines: &[String],
) {
    if lines.is_empty() {
        return;
    }
    let block = lines.len() as f64 * leading;
    let first_baseline = top - (h - block) / 2.0 - leading + (leading - size) / 2.0 + 1.0;
    for (n, line) in lines.iter().enumerate() {
        let lw = text_width(line, size, bold);
        let lx = x + (w - lw) / 2.0;
        text_at(out, lx, first_baseline - n as f64 * leading, size, bold, line);
    }
}

// ---------------------------------------------------------------------------
// Text metrics
// ---------------------------------------------------------------------------

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {..~
];

fn char_width(c: char) -> u16 {
    match c as u32 {
        code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
        _ => 556,
    }
}

/// Approximate rendered width in points. Bold is Helvetica scaled by 6%.
pub fn text_width(text: &str, size: f64, bold: bool) -> f64 {
    let units: u32 = text.chars().map(|c| char_width(c) as u32).sum();
    let factor = if bold { 1.06 } else { 1.0 };
    units as f64 * size / 1000.0 * factor
}

/// Greedy word wrap. Words wider than the line are broken by character.
pub fn wrap_text(text: &str, max_width: f64, size: f64, bold: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if text_width(&candidate, size, bold) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if text_width(word, size, bold) <= max_width {
                line = word.to_string();
            } else {
                for c in word.chars() {
                    let mut next = line.clone();
                    next.push(c);
                    if !line.is_empty() && text_width(&next, size, bold) > max_width {
                        lines.push(std::mem::take(&mut line));
                        line.push(c);
                    } else {
                        line = next;
                    }
                }
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

/// Escape text for a PDF string literal in WinAnsi encoding. Latin-1
/// characters become octal escapes; anything outside it becomes `?`.
fn pdf_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\t' | '\n' | '\r' => out.push(' '),
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// File assembly
// ---------------------------------------------------------------------------

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_BOLD_ID: usize = 3;
const FONT_REGULAR_ID: usize = 4;
const INFO_ID: usize = 5;

/// Minimal PDF file builder. Constructs valid PDF 1.4 files with any number
/// of pages and RGB image XObjects.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    page_ids: Vec<usize>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            objects: vec![Vec::new(); INFO_ID],
            page_ids: Vec::new(),
        }
    }

    /// Append an object body and return its id.
    fn push(&mut self, body: Vec<u8>) -> usize {
        self.objects.push(body);
        self.objects.len()
    }

    fn set(&mut self, id: usize, body: Vec<u8>) {
        self.objects[id - 1] = body;
    }

    fn add_image(&mut self, pixels: &RgbImage) -> Result<usize> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(pixels.as_raw())
            .context("Failed to compress image")?;
        let data = encoder.finish().context("Failed to compress image")?;

        let mut body = format!(
            "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode /Length {} >>\nstream\n",
            pixels.width(),
            pixels.height(),
            data.len()
        )
        .into_bytes();
        body.extend_from_slice(&data);
        body.extend_from_slice(b"\nendstream");
        Ok(self.push(body))
    }

    fn add_page(&mut self, content: &str, images: &[(String, usize)]) {
        let stream = format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        );
        let content_id = self.push(stream.into_bytes());

        let xobjects: String = images
            .iter()
            .map(|(name, id)| format!("/{name} {id} 0 R "))
            .collect();
        let page = format!(
            "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
             /Contents {content_id} 0 R /Resources << /Font << /F1 {FONT_BOLD_ID} 0 R /F2 {FONT_REGULAR_ID} 0 R >> \
             /XObject << {xobjects}>> >> >>"
        );
        let page_id = self.push(page.into_bytes());
        self.page_ids.push(page_id);
    }

    /// Build the complete PDF file as bytes.
    fn build(mut self, title: &str) -> Vec<u8> {
        self.set(
            CATALOG_ID,
            format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>").into_bytes(),
        );
        let kids: Vec<String> = self.page_ids.iter().map(|id| format!("{id} 0 R")).collect();
        self.set(
            PAGES_ID,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                self.page_ids.len()
            )
            .into_bytes(),
        );
        self.set(
            FONT_BOLD_ID,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );
        self.set(
            FONT_REGULAR_ID,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );
        self.set(
            INFO_ID,
            format!("<< /Title ({}) /Producer (Proforma) >>", pdf_escape(title)).into_bytes(),
        );

        let mut pdf: Vec<u8> = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(self.objects.len());
        for (idx, body) in self.objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n", idx + 1).as_bytes());
            pdf.extend_from_slice(body);
            pdf.extend_from_slice(b"\nendobj\n");
        }

        // Cross-reference table
        let xref_offset = pdf.len();
        let num_objects = offsets.len() + 1; // +1 for free entry
        let mut tail = format!("xref\n0 {num_objects}\n0000000000 65535 f \n");
        for offset in &offsets {
            tail.push_str(&format!("{offset:010} 00000 n \n"));
        }
        tail.push_str(&format!(
            "trailer\n<< /Size {num_objects} /Root {CATALOG_ID} 0 R /Info {INFO_ID} 0 R >>\n"
        ));
        tail.push_str(&format!("startxref\n{xref_offset}\n%%EOF\n"));
        pdf.extend_from_slice(tail.as_bytes());

        pdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::PreparedImage;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn row(serial: usize, name: &str) -> PreparedRow {
        let mut cells: Vec<PreparedCell> = (0..schema::COLUMN_COUNT)
            .map(|_| PreparedCell::Text(String::new()))
            .collect();
        cells[0] = PreparedCell::Number(serial);
        cells[1] = PreparedCell::Text(name.into());
        cells[14] = PreparedCell::Image(None);
        cells[16] = PreparedCell::Image(None);
        PreparedRow { serial, cells }
    }

    fn contains(bytes: &[u8], needle: &str) -> bool {
        bytes
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn test_pdf_structure() {
        let (bytes, pages) =
            generate_proforma_pdf(&FormHeader::default(), &[row(1, "Asha")], date()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert_eq!(pages, 1);
        assert!(contains(&bytes, "/Count 1"));
        assert!(contains(&bytes, "/MediaBox [0 0 842 595]"));
        assert!(contains(&bytes, "(Asha) Tj"));
        // Narrow label cells wrap "Matric 7(a)" onto two lines.
        assert!(contains(&bytes, "(Matric) Tj"));
        assert!(contains(&bytes, "(7\\(a\\)) Tj"));
        assert!(contains(&bytes, "(Date: 15-03-2024) Tj"));
        assert!(contains(&bytes, "(PRINCIPAL) Tj"));
        assert!(contains(&bytes, "(Signature of DPE/Lecturer) Tj"));
    }

    #[test]
    fn test_batches_of_fifty() {
        let rows: Vec<_> = (1..=51).map(|i| row(i, &format!("Student {i}"))).collect();
        let parts = generate_proforma_pdfs(&FormHeader::default(), &rows, 50, date()).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].row_count, 50);
        assert_eq!(parts[1].row_count, 1);
        assert_eq!(parts[0].file_name, "Eligibility_Form_Part1.pdf");
        assert_eq!(parts[1].file_name, "Eligibility_Form_Part2.pdf");
        assert!(parts[0].page_count > 1);
        // The serial keeps counting across batches.
        assert!(contains(&parts[1].bytes, "(51) Tj"));
        // Each file carries its own title block.
        assert!(contains(&parts[1].bytes, "(Eligibility Proforma) Tj"));
    }

    #[test]
    fn test_batch_count() {
        assert_eq!(batch_count(0, 50), 0);
        assert_eq!(batch_count(1, 50), 1);
        assert_eq!(batch_count(50, 50), 1);
        assert_eq!(batch_count(51, 50), 2);
        assert_eq!(batch_count(150, 50), 3);
    }

    #[test]
    fn test_images_drawn_as_overlays() {
        let mut with_image = row(1, "Asha");
        with_image.cells[16] = PreparedCell::Image(Some(PreparedImage {
            kind: ImageKind::Photo,
            pixels: RgbImage::from_pixel(68, 80, image::Rgb([200, 10, 10])),
        }));
        let (bytes, _) =
            generate_proforma_pdf(&FormHeader::default(), &[with_image, row(2, "Bilal")], date())
                .unwrap();
        assert!(contains(&bytes, "/Subtype /Image /Width 68 /Height 80"));
        assert!(contains(&bytes, "/Im0 Do"));
        assert!(!contains(&bytes, "/Im1 Do"));
    }

    #[test]
    fn test_header_repeats_on_every_page() {
        let rows: Vec<_> = (1..=30).map(|i| row(i, "X")).collect();
        let (bytes, pages) = generate_proforma_pdf(&FormHeader::default(), &rows, date()).unwrap();
        assert!(pages >= 2);
        let needle = "(Last Examination) Tj";
        let count = bytes
            .windows(needle.len())
            .filter(|w| *w == needle.as_bytes())
            .count();
        assert_eq!(count, pages);
    }

    #[test]
    fn test_tall_row_is_split_across_pages() {
        let mut tall = row(1, "Asha");
        tall.cells[15] = PreparedCell::Text("Village Road House ".repeat(200));
        let (bytes, pages) =
            generate_proforma_pdf(&FormHeader::default(), &[tall, row(2, "Bilal")], date())
                .unwrap();
        assert!(pages >= 3);

        let content = String::from_utf8_lossy(&bytes);
        let baselines: Vec<f64> = content
            .lines()
            .filter(|l| l.ends_with(" Td"))
            .map(|l| l.split_whitespace().nth(1).unwrap().parse().unwrap())
            .collect();
        assert!(!baselines.is_empty());
        for y in baselines {
            assert!(y >= MARGIN, "text drawn below the bottom margin: y={y}");
        }

        // Nothing is dropped: every word of the address is printed once.
        assert_eq!(content.matches("House").count(), 200);
        assert!(contains(&bytes, "(Bilal) Tj"));
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("one two three four", text_width("one two", 10.0, false), 10.0, false);
        assert_eq!(lines, vec!["one two", "three four"]);
        let broken = wrap_text("abcdefghij", text_width("abc", 10.0, false) + 0.1, 10.0, false);
        assert!(broken.len() > 1);
        assert_eq!(broken.concat(), "abcdefghij");
        assert!(wrap_text("", 50.0, 10.0, false).is_empty());
    }

    #[test]
    fn test_pdf_escape() {
        assert_eq!(pdf_escape("hello"), "hello");
        assert_eq!(pdf_escape("(test)"), "\\(test\\)");
        assert_eq!(pdf_escape("a\\b"), "a\\\\b");
        assert_eq!(pdf_escape("caf\u{e9}"), "caf\\351");
        assert_eq!(pdf_escape("\u{2713}"), "?");
    }

    #[test]
    fn test_footer_statements_present() {
        let (bytes, _) = generate_proforma_pdf(&FormHeader::default(), &[], date()).unwrap();
        assert!(contains(&bytes, "(\\(Seal of College\\)) Tj"));
        assert!(contains(&bytes, "Certified that"));
    }
}
