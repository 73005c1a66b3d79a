use proforma_core::StudentRecord;
use tracing::debug;

use crate::images::{ImageSource, PreparedImage, load_image};
use crate::schema::{self, CellValue};

/// A cell ready for any exporter: images already fetched and scaled.
#[derive(Debug, Clone)]
pub enum PreparedCell {
    Number(usize),
    Text(String),
    Image(Option<PreparedImage>),
}

impl PreparedCell {
    pub fn text(&self) -> String {
        match self {
            PreparedCell::Number(n) => n.to_string(),
            PreparedCell::Text(s) => s.clone(),
            PreparedCell::Image(_) => String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreparedRow {
    pub serial: usize,
    pub cells: Vec<PreparedCell>,
}

impl PreparedRow {
    pub fn image_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, PreparedCell::Image(Some(_))))
            .count()
    }
}

/// Build one row, fetching its images in column order.
pub async fn prepare_row(
    student: &StudentRecord,
    serial: usize,
    source: &dyn ImageSource,
) -> PreparedRow {
    let mut cells = Vec::with_capacity(schema::COLUMN_COUNT);
    for value in schema::row_values(student, serial) {
        let cell = match value {
            CellValue::Number(n) => PreparedCell::Number(n),
            CellValue::Text(s) => PreparedCell::Text(s),
            CellValue::Image(kind, url) => {
                PreparedCell::Image(load_image(source, url.as_deref(), kind).await)
            }
        };
        cells.push(cell);
    }
    PreparedRow { serial, cells }
}

/// Build every row in order. Rows are processed one after another so output
/// order always equals input order.
pub async fn prepare_rows(
    students: &[&StudentRecord],
    source: &dyn ImageSource,
) -> Vec<PreparedRow> {
    let mut rows = Vec::with_capacity(students.len());
    for (idx, student) in students.iter().enumerate() {
        rows.push(prepare_row(student, idx + 1, source).await);
    }
    let images: usize = rows.iter().map(PreparedRow::image_count).sum();
    debug!(rows = rows.len(), images, "rows prepared");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::test_support::{MapSource, png};

    fn student(name: &str, sig: Option<&str>) -> StudentRecord {
        StudentRecord {
            name: Some(name.into()),
            signature_url: sig.map(String::from),
            passport_photo_url: Some("photo".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn serials_follow_selected_order() {
        let a = student("A", None);
        let b = student("B", None);
        let rows = prepare_rows(&[&b, &a], &MapSource::default()).await;
        assert_eq!(rows[0].serial, 1);
        assert_eq!(rows[0].cells[1].text(), "B");
        assert_eq!(rows[1].serial, 2);
        assert_eq!(rows[1].cells[0].text(), "2");
    }

    #[tokio::test]
    async fn missing_signature_leaves_empty_image_cell() {
        let source = MapSource::default()
            .with("sig", png(250, 100, [0, 0, 0]))
            .with("photo", png(85, 100, [0, 0, 0]));
        let with_sig = student("A", Some("sig"));
        let without_sig = student("B", None);
        let rows = prepare_rows(&[&with_sig, &without_sig], &source).await;

        assert!(matches!(rows[0].cells[14], PreparedCell::Image(Some(_))));
        assert!(matches!(rows[1].cells[14], PreparedCell::Image(None)));
        assert!(matches!(rows[1].cells[16], PreparedCell::Image(Some(_))));
        assert_eq!(rows[0].image_count(), 2);
        assert_eq!(rows[1].image_count(), 1);
    }
}
