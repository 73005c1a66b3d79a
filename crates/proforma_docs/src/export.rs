//! Export entry point: selected students in, finished files out.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use proforma_core::config::DEFAULT_PDF_BATCH_SIZE;
use proforma_core::{FormHeader, ProformaConfig, ProformaError, StudentRecord};
use tracing::{debug, info, warn};

use crate::images::ImageSource;
use crate::rows::prepare_rows;
use crate::{docx, html, pdf, xlsx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Xlsx,
    Docx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Xlsx, ExportFormat::Docx, ExportFormat::Pdf];

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "Excel",
            ExportFormat::Docx => "Word",
            ExportFormat::Pdf => "PDF",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "docx" | "word" => Ok(ExportFormat::Docx),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Settings shared by every format.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub header: FormHeader,
    pub pdf_batch_size: usize,
    /// Printed on the PDF date line.
    pub date: NaiveDate,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            header: FormHeader::default(),
            pdf_batch_size: DEFAULT_PDF_BATCH_SIZE,
            date: Local::now().date_naive(),
        }
    }
}

impl From<&ProformaConfig> for ExportOptions {
    fn from(config: &ProformaConfig) -> Self {
        Self {
            header: config.form.clone(),
            pdf_batch_size: config.pdf_batch_size,
            ..Default::default()
        }
    }
}

/// A finished file, ready to be saved.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub row_count: usize,
    /// Set for paginated output.
    pub page_count: Option<usize>,
    pub bytes: Vec<u8>,
}

/// An artifact that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub row_count: usize,
    pub page_count: Option<usize>,
}

impl ExportArtifact {
    /// Write the artifact into `dir`, creating it if needed.
    pub fn save_to(&self, dir: &Path) -> Result<SavedFile, ProformaError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), size = self.bytes.len(), "saved export");
        Ok(SavedFile {
            path,
            row_count: self.row_count,
            page_count: self.page_count,
        })
    }
}

/// Export `students` (already filtered and selected, in output order) to one
/// format. Images are fetched fresh for this call; any that fail are left
/// empty. An empty selection is rejected before anything is fetched.
pub async fn export(
    format: ExportFormat,
    students: &[&StudentRecord],
    source: &dyn ImageSource,
    options: &ExportOptions,
) -> Result<Vec<ExportArtifact>, ProformaError> {
    if students.is_empty() {
        return Err(ProformaError::EmptySelection);
    }

    let rows = prepare_rows(students, source).await;
    let wrap = |e: anyhow::Error| ProformaError::export(format.label(), format!("{e:#}"));

    let artifacts = match format {
        ExportFormat::Xlsx => vec![ExportArtifact {
            file_name: xlsx::FILE_NAME.into(),
            row_count: rows.len(),
            page_count: None,
            bytes: xlsx::generate_proforma_xlsx(&rows).map_err(wrap)?,
        }],
        ExportFormat::Docx => vec![ExportArtifact {
            file_name: docx::FILE_NAME.into(),
            row_count: rows.len(),
            page_count: None,
            bytes: docx::generate_proforma_docx(&options.header, &rows).map_err(wrap)?,
        }],
        ExportFormat::Pdf => {
            debug!(
                files = pdf::batch_count(rows.len(), options.pdf_batch_size),
                batch_size = options.pdf_batch_size,
                "rendering pdf batches"
            );
            pdf::generate_proforma_pdfs(&options.header, &rows, options.pdf_batch_size, options.date)
                .map_err(wrap)?
                .into_iter()
                .map(|part| ExportArtifact {
                    file_name: part.file_name,
                    row_count: part.row_count,
                    page_count: Some(part.page_count),
                    bytes: part.bytes,
                })
                .collect()
        }
    };

    info!(
        format = %format,
        students = students.len(),
        files = artifacts.len(),
        "export complete"
    );
    Ok(artifacts)
}

/// Export and save each format in turn. Every format is attempted and its
/// files are written as soon as they are generated, so a failure in one
/// format leaves the others on disk. Results come back in `formats` order.
pub async fn export_to_dir(
    formats: &[ExportFormat],
    students: &[&StudentRecord],
    source: &dyn ImageSource,
    options: &ExportOptions,
    dir: &Path,
) -> Vec<(ExportFormat, Result<Vec<SavedFile>, ProformaError>)> {
    let mut results = Vec::with_capacity(formats.len());
    for &format in formats {
        let result = match export(format, students, source, options).await {
            Ok(artifacts) => artifacts.iter().map(|a| a.save_to(dir)).collect(),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!(format = %format, error = %e, "export failed, continuing with other formats");
        }
        results.push((format, result));
    }
    results
}

/// The HTML preview as an artifact. Never fetches images.
pub fn preview(
    students: &[&StudentRecord],
    options: &ExportOptions,
) -> Result<ExportArtifact, ProformaError> {
    if students.is_empty() {
        return Err(ProformaError::EmptySelection);
    }
    Ok(ExportArtifact {
        file_name: "preview.html".into(),
        row_count: students.len(),
        page_count: None,
        bytes: html::generate_preview_page(&options.header, students).into_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::NoImages;

    #[test]
    fn parses_format_names() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("word".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert_eq!(" pdf ".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("csv".parse::<ExportFormat>().is_err());
    }

    #[tokio::test]
    async fn empty_selection_is_rejected_for_every_format() {
        for format in ExportFormat::ALL {
            let err = export(format, &[], &NoImages, &ExportOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ProformaError::EmptySelection));
        }
        assert!(preview(&[], &ExportOptions::default()).is_err());
    }

    #[test]
    fn options_follow_config() {
        let mut config = ProformaConfig::default();
        config.pdf_batch_size = 10;
        config.form.year = "2024-25".into();
        let options = ExportOptions::from(&config);
        assert_eq!(options.pdf_batch_size, 10);
        assert_eq!(options.header.year, "2024-25");
    }

    #[test]
    fn save_to_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact {
            file_name: "students.xlsx".into(),
            row_count: 0,
            page_count: None,
            bytes: b"PK".to_vec(),
        };
        let saved = artifact.save_to(&tmp.path().join("out")).unwrap();
        assert_eq!(std::fs::read(saved.path).unwrap(), b"PK");
    }
}
