//! The eligibility proforma column schema.
//!
//! One table describes every column: header placement, the column-number
//! label, a relative width, and where the cell value comes from. The preview
//! and all three exporters read from here, so a column's source field only
//! ever changes in one place.

use proforma_core::StudentRecord;

/// The two image columns. Box sizes are the rasterization footprint in pixels;
/// each format scales that box to its own units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Signature,
    Photo,
}

impl ImageKind {
    /// Target box `(width, height)` in pixels. Signature is ~2.5:1, photo ~0.85:1.
    pub const fn box_px(self) -> (u32, u32) {
        match self {
            ImageKind::Signature => (100, 40),
            ImageKind::Photo => (68, 80),
        }
    }

    pub fn url(self, student: &StudentRecord) -> Option<&str> {
        let url = match self {
            ImageKind::Signature => student.signature_url.as_deref(),
            ImageKind::Photo => student.passport_photo_url.as_deref(),
        };
        url.map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Where a column's value comes from.
#[derive(Clone, Copy)]
pub enum Source {
    Serial,
    Text(fn(&StudentRecord) -> String),
    Image(ImageKind),
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Serial => write!(f, "Serial"),
            Source::Text(_) => write!(f, "Text(..)"),
            Source::Image(kind) => write!(f, "Image({kind:?})"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Row-1 title: the column's own title, or its group's title.
    pub title: &'static str,
    /// Row-2 title for grouped columns.
    pub sub_title: Option<&'static str>,
    /// Printed column number, e.g. `7(a)`.
    pub label: &'static str,
    /// Relative width; the spreadsheet uses it directly as character width.
    pub width: f64,
    pub source: Source,
}

impl Column {
    pub fn is_grouped(&self) -> bool {
        self.sub_title.is_some()
    }

    /// Row-2 text in the numbered header variant.
    pub fn numbered_label(&self) -> String {
        match self.sub_title {
            Some(sub) => format!("{sub} {}", self.label),
            None => self.label.to_string(),
        }
    }
}

fn text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or("").to_string()
}

const fn col(title: &'static str, label: &'static str, width: f64, source: Source) -> Column {
    Column {
        title,
        sub_title: None,
        label,
        width,
        source,
    }
}

const fn sub(
    title: &'static str,
    sub_title: &'static str,
    label: &'static str,
    width: f64,
    source: Source,
) -> Column {
    Column {
        title,
        sub_title: Some(sub_title),
        label,
        width,
        source,
    }
}

const YEAR_OF_PASSING: &str = "Year of Passing";
const LAST_EXAMINATION: &str = "Last Examination";
const PARTICIPATION: &str = "Years of Participation (Inter-College)";

pub const COLUMN_COUNT: usize = 19;

pub static COLUMNS: [Column; COLUMN_COUNT] = [
    col("Sr. No.", "1", 5.0, Source::Serial),
    col("Name", "2", 17.0, Source::Text(|s| text(&s.name))),
    col("Father's Name", "3", 17.0, Source::Text(|s| text(&s.father_name))),
    col("Date of Birth", "4", 11.0, Source::Text(|s| text(&s.dob))),
    col("University Regn. No.", "5", 14.0, Source::Text(|s| text(&s.university_reg_no))),
    col("Branch / Year", "6", 10.0, Source::Text(|s| text(&s.branch_year))),
    sub(YEAR_OF_PASSING, "Matric", "7(a)", 8.0, Source::Text(|s| text(&s.matric_year))),
    sub(YEAR_OF_PASSING, "+2", "7(b)", 8.0, Source::Text(|s| text(&s.plus_two_year))),
    col("Year of First Admission", "8", 9.0, Source::Text(|s| text(&s.first_admission_year))),
    sub(LAST_EXAMINATION, "Name", "9(a)", 12.0, Source::Text(|s| text(&s.last_exam_name))),
    sub(LAST_EXAMINATION, "Year", "9(b)", 8.0, Source::Text(|s| text(&s.last_exam_year))),
    sub(PARTICIPATION, "Graduate", "10(a)", 9.0, Source::Text(|s| text(&s.inter_college_graduate_years))),
    sub(PARTICIPATION, "PG", "10(b)", 8.0, Source::Text(|s| text(&s.inter_college_pg_years))),
    col("Inter-Varsity", "11", 9.0, Source::Text(|s| text(&s.inter_varsity_years))),
    col("Signature", "12", 18.0, Source::Image(ImageKind::Signature)),
    col("Address with Phone", "13", 22.0, Source::Text(|s| text(&s.address_with_phone))),
    col("Passport Photo", "14", 12.0, Source::Image(ImageKind::Photo)),
    col("Activity", "15", 14.0, Source::Text(StudentRecord::activity_text)),
    col("Position", "16", 10.0, Source::Text(StudentRecord::position_text)),
];

pub fn total_width() -> f64 {
    COLUMNS.iter().map(|c| c.width).sum()
}

/// Column widths scaled so they add up to `total`.
pub fn scaled_widths(total: f64) -> Vec<f64> {
    let sum = total_width();
    COLUMNS.iter().map(|c| c.width / sum * total).collect()
}

// ---------------------------------------------------------------------------
// Header layout
// ---------------------------------------------------------------------------

/// One cell of the two-row header, possibly spanning several columns or both
/// rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub row: usize,
    pub first_col: usize,
    pub last_col: usize,
    pub row_span: usize,
    pub text: String,
}

impl HeaderCell {
    pub fn col_span(&self) -> usize {
        self.last_col - self.first_col + 1
    }
}

/// Runs of consecutive grouped columns sharing a title: `(first, last, title)`.
fn groups() -> Vec<(usize, usize, &'static str)> {
    let mut out: Vec<(usize, usize, &'static str)> = Vec::new();
    for (idx, column) in COLUMNS.iter().enumerate() {
        if !column.is_grouped() {
            continue;
        }
        match out.last_mut() {
            Some((_, last, title)) if *last + 1 == idx && *title == column.title => *last = idx,
            _ => out.push((idx, idx, column.title)),
        }
    }
    out
}

/// Header with standalone titles spanning both rows and group titles merged
/// across their sub-columns. Used by the spreadsheet, Word document and preview.
pub fn merged_header() -> Vec<HeaderCell> {
    let mut cells = Vec::new();
    let groups = groups();
    for (idx, column) in COLUMNS.iter().enumerate() {
        match column.sub_title {
            None => cells.push(HeaderCell {
                row: 0,
                first_col: idx,
                last_col: idx,
                row_span: 2,
                text: column.title.to_string(),
            }),
            Some(sub) => {
                if let Some((first, last, title)) = groups.iter().find(|(f, _, _)| *f == idx) {
                    cells.push(HeaderCell {
                        row: 0,
                        first_col: *first,
                        last_col: *last,
                        row_span: 1,
                        text: title.to_string(),
                    });
                }
                cells.push(HeaderCell {
                    row: 1,
                    first_col: idx,
                    last_col: idx,
                    row_span: 1,
                    text: sub.to_string(),
                });
            }
        }
    }
    cells.sort_by_key(|c| (c.row, c.first_col));
    cells
}

/// Header whose second row carries the column-number labels. Used by the PDF.
pub fn numbered_header() -> Vec<HeaderCell> {
    let mut cells = Vec::new();
    let groups = groups();
    for (idx, column) in COLUMNS.iter().enumerate() {
        if !column.is_grouped() {
            cells.push(HeaderCell {
                row: 0,
                first_col: idx,
                last_col: idx,
                row_span: 1,
                text: column.title.to_string(),
            });
        } else if let Some((first, last, title)) = groups.iter().find(|(f, _, _)| *f == idx) {
            cells.push(HeaderCell {
                row: 0,
                first_col: *first,
                last_col: *last,
                row_span: 1,
                text: title.to_string(),
            });
        }
        cells.push(HeaderCell {
            row: 1,
            first_col: idx,
            last_col: idx,
            row_span: 1,
            text: column.numbered_label(),
        });
    }
    cells.sort_by_key(|c| (c.row, c.first_col));
    cells
}

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// A cell before any image has been fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Number(usize),
    Text(String),
    Image(ImageKind, Option<String>),
}

impl CellValue {
    /// Text as shown in the preview and written to text cells. Image cells
    /// have no text.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Image(..) => String::new(),
        }
    }
}

pub fn cell_value(column: &Column, student: &StudentRecord, serial: usize) -> CellValue {
    match column.source {
        Source::Serial => CellValue::Number(serial),
        Source::Text(extract) => CellValue::Text(extract(student)),
        Source::Image(kind) => CellValue::Image(kind, kind.url(student).map(String::from)),
    }
}

/// All 19 cells for one student. `serial` is 1-based within the selected set.
pub fn row_values(student: &StudentRecord, serial: usize) -> Vec<CellValue> {
    COLUMNS
        .iter()
        .map(|c| cell_value(c, student, serial))
        .collect()
}

/// The text of every cell, image columns empty.
pub fn text_row(student: &StudentRecord, serial: usize) -> Vec<String> {
    row_values(student, serial)
        .iter()
        .map(CellValue::display_text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_nineteen_columns_and_sixteen_labels() {
        assert_eq!(COLUMNS.len(), 19);
        let labels: Vec<_> = COLUMNS.iter().map(|c| c.label).collect();
        assert_eq!(labels[0], "1");
        assert_eq!(labels[6], "7(a)");
        assert_eq!(labels[18], "16");
    }

    #[test]
    fn merged_header_covers_every_column_exactly_once_per_row() {
        let header = merged_header();
        let mut covered = [[false; COLUMN_COUNT]; 2];
        for cell in &header {
            for row in cell.row..cell.row + cell.row_span {
                for col in cell.first_col..=cell.last_col {
                    assert!(!covered[row][col], "overlap at ({row}, {col})");
                    covered[row][col] = true;
                }
            }
        }
        assert!(covered.iter().all(|r| r.iter().all(|c| *c)));
    }

    #[test]
    fn merged_header_groups() {
        let header = merged_header();
        let groups: Vec<_> = header
            .iter()
            .filter(|c| c.row == 0 && c.col_span() > 1)
            .map(|c| (c.first_col, c.last_col, c.text.as_str()))
            .collect();
        assert_eq!(
            groups,
            vec![
                (6, 7, "Year of Passing"),
                (9, 10, "Last Examination"),
                (11, 12, "Years of Participation (Inter-College)"),
            ]
        );
        let inter_varsity = header.iter().find(|c| c.text == "Inter-Varsity").unwrap();
        assert_eq!(inter_varsity.row_span, 2);
    }

    #[test]
    fn numbered_header_second_row_has_labels() {
        let header = numbered_header();
        let row2: Vec<_> = header
            .iter()
            .filter(|c| c.row == 1)
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(row2.len(), COLUMN_COUNT);
        assert_eq!(row2[0], "1");
        assert_eq!(row2[6], "Matric 7(a)");
        assert_eq!(row2[7], "+2 7(b)");
        assert_eq!(row2[13], "11");
    }

    #[test]
    fn missing_fields_render_as_empty_text() {
        let row = text_row(&StudentRecord::default(), 4);
        assert_eq!(row[0], "4");
        for cell in &row[1..] {
            assert_eq!(cell, "");
        }
    }

    #[test]
    fn blank_image_url_counts_as_missing() {
        let student = StudentRecord {
            signature_url: Some("  ".into()),
            passport_photo_url: Some("https://cdn.example/p.jpg".into()),
            ..Default::default()
        };
        let row = row_values(&student, 1);
        assert_eq!(row[14], CellValue::Image(ImageKind::Signature, None));
        assert_eq!(
            row[16],
            CellValue::Image(ImageKind::Photo, Some("https://cdn.example/p.jpg".into()))
        );
    }

    #[test]
    fn scaled_widths_sum_to_total() {
        let widths = scaled_widths(800.0);
        let sum: f64 = widths.iter().sum();
        assert!((sum - 800.0).abs() < 1e-6);
    }
}
