use std::borrow::Cow;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Image, Workbook, Worksheet};
use tracing::{debug, warn};

use crate::rows::{PreparedCell, PreparedRow};
use crate::schema::{self, HeaderCell};

pub const FILE_NAME: &str = "students.xlsx";

const SHEET_NAME: &str = "Students";
const HEADER_ROWS: u32 = 2;
const HEADER_ROW_HEIGHT: f64 = 32.0;
/// Data row height in points; tall enough for the photo box plus offset.
const DATA_ROW_HEIGHT: f64 = 66.0;
/// Pixel offset of embedded images from their cell's top-left corner.
const IMAGE_OFFSET: (u32, u32) = (4, 4);
/// Longest string Excel accepts in one cell.
const MAX_CELL_CHARS: usize = 32_767;

fn cell_format() -> Format {
    Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_font_size(9)
}

fn write_header(worksheet: &mut Worksheet, header: &[HeaderCell], format: &Format) -> Result<()> {
    for cell in header {
        let first_row = cell.row as u32;
        let last_row = first_row + cell.row_span as u32 - 1;
        let first_col = cell.first_col as u16;
        let last_col = cell.last_col as u16;
        if first_row == last_row && first_col == last_col {
            worksheet
                .write_string_with_format(first_row, first_col, &cell.text, format)
                .with_context(|| format!("Failed to write header {:?}", cell.text))?;
        } else {
            worksheet
                .merge_range(first_row, first_col, last_row, last_col, &cell.text, format)
                .with_context(|| format!("Failed to merge header {:?}", cell.text))?;
        }
    }
    Ok(())
}

/// Cut text down to what a single cell can hold.
fn fit_cell_text(s: &str) -> Cow<'_, str> {
    match s.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => Cow::Owned(s[..end].to_string()),
        None => Cow::Borrowed(s),
    }
}

/// Write one data row. Image cells get a bordered blank plus the picture
/// floated over the cell.
fn write_row(worksheet: &mut Worksheet, excel_row: u32, row: &PreparedRow, format: &Format) -> Result<()> {
    worksheet.set_row_height(excel_row, DATA_ROW_HEIGHT)?;
    for (col_idx, cell) in row.cells.iter().enumerate() {
        let col = col_idx as u16;
        match cell {
            PreparedCell::Number(n) => {
                worksheet
                    .write_number_with_format(excel_row, col, *n as f64, format)
                    .with_context(|| format!("Failed to write number at ({excel_row}, {col})"))?;
            }
            PreparedCell::Text(s) if s.is_empty() => {
                worksheet.write_blank(excel_row, col, format)?;
            }
            PreparedCell::Text(s) => {
                let text = fit_cell_text(s);
                if matches!(text, Cow::Owned(_)) {
                    warn!(
                        row = excel_row,
                        col,
                        chars = s.chars().count(),
                        "cell text exceeds the Excel limit, truncated"
                    );
                }
                worksheet
                    .write_string_with_format(excel_row, col, &*text, format)
                    .with_context(|| format!("Failed to write string at ({excel_row}, {col})"))?;
            }
            PreparedCell::Image(image) => {
                worksheet.write_blank(excel_row, col, format)?;
                if let Some(image) = image {
                    let png = image.png()?;
                    let picture = Image::new_from_buffer(&png)
                        .with_context(|| format!("Failed to load image at ({excel_row}, {col})"))?;
                    worksheet
                        .insert_image_with_offset(
                            excel_row,
                            col,
                            &picture,
                            IMAGE_OFFSET.0,
                            IMAGE_OFFSET.1,
                        )
                        .with_context(|| format!("Failed to insert image at ({excel_row}, {col})"))?;
                }
            }
        }
    }
    Ok(())
}

/// Generate the proforma spreadsheet: one sheet, fixed column widths, the
/// merged two-row header, and one row per student.
///
/// Returns the raw bytes of the xlsx file.
pub fn generate_proforma_xlsx(rows: &[PreparedRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .context("Failed to set sheet name")?;

    for (col, column) in schema::COLUMNS.iter().enumerate() {
        worksheet.set_column_width(col as u16, column.width)?;
    }

    let header_format = cell_format().set_bold();
    for row in 0..HEADER_ROWS {
        worksheet.set_row_height(row, HEADER_ROW_HEIGHT)?;
    }
    write_header(worksheet, &schema::merged_header(), &header_format)?;

    let format = cell_format();
    for (idx, row) in rows.iter().enumerate() {
        write_row(worksheet, HEADER_ROWS + idx as u32, row, &format)?;
    }

    let bytes = workbook
        .save_to_buffer()
        .context("Failed to save workbook to buffer")?;
    debug!(rows = rows.len(), size = bytes.len(), "xlsx generated");

    Ok(bytes)
}
