use anyhow::Result;
use docx_rs::*;
use proforma_core::FormHeader;
use std::io::Cursor;
use tracing::debug;

use crate::rows::{PreparedCell, PreparedRow};
use crate::schema::{self, HeaderCell};

pub const FILE_NAME: &str = "students.docx";

// Landscape A4 in twentieths of a point.
const PAGE_WIDTH: u32 = 16838;
const PAGE_HEIGHT: u32 = 11906;
const PAGE_MARGIN: i32 = 720;
const CONTENT_WIDTH: f64 = (PAGE_WIDTH as i32 - 2 * PAGE_MARGIN) as f64;

/// Tab stops for the metadata line: the first field sits at the left margin,
/// the next three at increasing offsets.
const METADATA_TAB_STOPS: [usize; 3] = [5600, 9400, 12400];

/// EMU per rasterized pixel. Keeps the signature box inside its column.
const EMU_PER_PIXEL: u32 = 6000;

const HEADER_FONT: usize = 16; // half-points, 8pt
const BODY_FONT: usize = 14; // 7pt

fn centered(text: &str, size: usize) -> Paragraph {
    let run = Run::new().add_text(text).bold().size(size);
    Paragraph::new().add_run(run).align(AlignmentType::Center)
}

/// Institution, department and form title, centered.
fn title_block(docx: Docx, header: &FormHeader) -> Docx {
    docx.add_paragraph(centered(&header.institution, 32))
        .add_paragraph(centered(&header.department, 28))
        .add_paragraph(centered(&header.form_title, 28))
}

/// College/category, tournament, year and manager spread over one line with
/// tab stops.
fn metadata_line(header: &FormHeader) -> Paragraph {
    let [first, second, third, fourth] = header.metadata_fields();
    let run = Run::new()
        .add_text(first)
        .add_tab()
        .add_text(second)
        .add_tab()
        .add_text(third)
        .add_tab()
        .add_text(fourth)
        .size(20);
    METADATA_TAB_STOPS
        .iter()
        .fold(Paragraph::new(), |p, pos| {
            p.add_tab(Tab::new().val(TabValueType::Left).pos(*pos))
        })
        .add_run(run)
}

fn text_cell(text: &str, width: usize, size: usize, bold: bool) -> TableCell {
    let mut run = Run::new().add_text(text).size(size);
    if bold {
        run = run.bold();
    }
    TableCell::new()
        .add_paragraph(Paragraph::new().add_run(run).align(AlignmentType::Center))
        .width(width, WidthType::Dxa)
        .vertical_align(VAlignType::Center)
}

/// The two header rows. Standalone titles restart a vertical merge in row 1
/// and continue it in row 2; group titles span their sub-columns.
fn header_rows(header: &[HeaderCell], widths: &[usize]) -> Vec<TableRow> {
    let mut rows = vec![Vec::new(), Vec::new()];
    for cell in header {
        let width: usize = widths[cell.first_col..=cell.last_col].iter().sum();
        let mut table_cell = text_cell(&cell.text, width, HEADER_FONT, true);
        if cell.col_span() > 1 {
            table_cell = table_cell.grid_span(cell.col_span());
        }
        if cell.row_span > 1 {
            table_cell = table_cell.vertical_merge(VMergeType::Restart);
            rows[cell.row + 1].push((
                cell.first_col,
                TableCell::new()
                    .add_paragraph(Paragraph::new())
                    .width(width, WidthType::Dxa)
                    .vertical_merge(VMergeType::Continue),
            ));
        }
        rows[cell.row].push((cell.first_col, table_cell));
    }
    rows.into_iter()
        .map(|mut cells| {
            cells.sort_by_key(|(col, _)| *col);
            TableRow::new(cells.into_iter().map(|(_, c)| c).collect())
        })
        .collect()
}

fn data_row(row: &PreparedRow, widths: &[usize]) -> Result<TableRow> {
    let mut cells = Vec::with_capacity(row.cells.len());
    for (cell, width) in row.cells.iter().zip(widths) {
        let table_cell = match cell {
            PreparedCell::Image(Some(image)) => {
                let pic = Pic::new(&image.png()?).size(
                    image.width() * EMU_PER_PIXEL,
                    image.height() * EMU_PER_PIXEL,
                );
                TableCell::new()
                    .add_paragraph(
                        Paragraph::new()
                            .add_run(Run::new().add_image(pic))
                            .align(AlignmentType::Center),
                    )
                    .width(*width, WidthType::Dxa)
                    .vertical_align(VAlignType::Center)
            }
            other => text_cell(&other.text(), *width, BODY_FONT, false),
        };
        cells.push(table_cell);
    }
    Ok(TableRow::new(cells))
}

/// Generate the proforma as a landscape Word document: title block, metadata
/// line, then the two-row header and one table row per student with images
/// embedded in their cells.
pub fn generate_proforma_docx(header: &FormHeader, rows: &[PreparedRow]) -> Result<Vec<u8>> {
    let widths: Vec<usize> = schema::scaled_widths(CONTENT_WIDTH)
        .into_iter()
        .map(|w| w.floor() as usize)
        .collect();

    let mut docx = Docx::new()
        .page_size(PAGE_WIDTH, PAGE_HEIGHT)
        .page_orient(PageOrientationType::Landscape)
        .page_margin(
            PageMargin::new()
                .top(PAGE_MARGIN)
                .bottom(PAGE_MARGIN)
                .left(PAGE_MARGIN)
                .right(PAGE_MARGIN),
        );

    docx = title_block(docx, header);
    docx = docx.add_paragraph(metadata_line(header));
    docx = docx.add_paragraph(Paragraph::new());

    let mut table_rows = header_rows(&schema::merged_header(), &widths);
    for row in rows {
        table_rows.push(data_row(row, &widths)?);
    }
    docx = docx.add_table(Table::new(table_rows).set_grid(widths));

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| anyhow::anyhow!("Failed to pack DOCX: {}", e))?;

    let bytes = buf.into_inner();
    debug!(rows = rows.len(), size = bytes.len(), "docx generated");
    Ok(bytes)
}
