// Eligibility proforma documents: shared schema, preview, and the xlsx / docx / pdf exporters.

pub mod docx;
pub mod export;
pub mod html;
pub mod images;
pub mod pdf;
pub mod rows;
pub mod schema;
pub mod xlsx;

pub use export::{ExportArtifact, ExportFormat, ExportOptions, SavedFile, export, export_to_dir, preview};
pub use html::{PreviewTable, preview_table};
pub use images::{HttpImageSource, ImageSource, NoImages};
