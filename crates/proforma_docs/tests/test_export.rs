use std::collections::HashMap;
use std::io::{Cursor, Read};

use async_trait::async_trait;
use chrono::NaiveDate;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use proforma_core::{Filters, RosterView, StudentRecord, parse_roster};
use proforma_docs::*;

// ------------------------------------------------------------------
// Helpers
// ------------------------------------------------------------------

fn png(rgb: [u8; 3]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::from_pixel(250, 100, Rgb(rgb)))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

struct FakeImages(HashMap<String, Vec<u8>>);

#[async_trait]
impl ImageSource for FakeImages {
    async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        self.0.get(url).cloned()
    }
}

fn fake_images() -> FakeImages {
    FakeImages(HashMap::from([
        ("https://cdn.test/sig-a.png".to_string(), png([10, 10, 10])),
        ("https://cdn.test/sig-c.png".to_string(), png([90, 30, 30])),
    ]))
}

fn options() -> ExportOptions {
    ExportOptions {
        date: NaiveDate::from_ymd_opt(2024, 11, 2).unwrap(),
        ..Default::default()
    }
}

fn three_students() -> Vec<StudentRecord> {
    parse_roster(
        r#"[
        {"name": "Asha", "fatherName": "Ramesh", "universityRegNo": "U1", "branchYear": "BSc II",
         "matricYear": 2019, "sports": ["Badminton"], "signatureUrl": "https://cdn.test/sig-a.png"},
        {"name": "Bilal", "fatherName": "Karim", "universityRegNo": "U2", "dob": "1.5.2004",
         "sports": ["Chess"], "eventResults": [{"activity": "Chess", "position": "First"}]},
        {"name": "Chetan", "universityRegNo": "U3", "addressWithPhone": "Ludhiana 98140",
         "sports": ["Hockey"], "signatureUrl": "https://cdn.test/sig-c.png"}
    ]"#,
    )
    .unwrap()
}

fn unzip(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

fn media_count(bytes: &[u8], prefix: &str) -> usize {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().filter(|n| n.starts_with(prefix)).count()
}

fn occurrences(haystack: &[u8], needle: &str) -> usize {
    haystack
        .windows(needle.len())
        .filter(|w| *w == needle.as_bytes())
        .count()
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found"))
}

// ------------------------------------------------------------------
// Missing signature scenario
// ------------------------------------------------------------------

#[tokio::test]
async fn test_missing_signature_leaves_only_that_cell_empty() {
    let students = three_students();
    let selected: Vec<&StudentRecord> = students.iter().collect();
    let images = fake_images();

    let xlsx = export(ExportFormat::Xlsx, &selected, &images, &options())
        .await
        .unwrap();
    assert_eq!(media_count(&xlsx[0].bytes, "xl/media/"), 2);

    let docx = export(ExportFormat::Docx, &selected, &images, &options())
        .await
        .unwrap();
    assert_eq!(media_count(&docx[0].bytes, "word/media/"), 2);

    let pdf = export(ExportFormat::Pdf, &selected, &images, &options())
        .await
        .unwrap();
    assert_eq!(pdf.len(), 1);
    assert_eq!(occurrences(&pdf[0].bytes, "/Subtype /Image"), 2);
}

#[tokio::test]
async fn test_unreachable_images_never_fail_the_export() {
    let students = three_students();
    let selected: Vec<&StudentRecord> = students.iter().collect();
    for format in ExportFormat::ALL {
        let artifacts = export(format, &selected, &NoImages, &options())
            .await
            .unwrap();
        assert!(!artifacts.is_empty());
        assert!(artifacts.iter().all(|a| !a.bytes.is_empty()));
    }
}

// ------------------------------------------------------------------
// Row count and order
// ------------------------------------------------------------------

#[tokio::test]
async fn test_rows_follow_selected_order() {
    let mut view = RosterView::new(three_students());
    view.set_filters(Filters {
        reg_no: "u".into(),
        ..Default::default()
    });
    view.set_all_visible(true);
    let u2 = view.find_key("U2").unwrap().clone();
    view.set_selected(&u2, false);
    let selected = view.selected_students();
    let names: Vec<_> = selected.iter().map(|s| s.name.as_deref().unwrap()).collect();
    assert_eq!(names, vec!["Asha", "Chetan"]);

    let xlsx = export(ExportFormat::Xlsx, &selected, &NoImages, &options())
        .await
        .unwrap();
    assert_eq!(xlsx[0].row_count, 2);
    let sheet = unzip(&xlsx[0].bytes, "xl/worksheets/sheet1.xml");
    assert_eq!(sheet.matches("<row r=").count(), 2 + 2);
    let strings = unzip(&xlsx[0].bytes, "xl/sharedStrings.xml");
    assert!(position(&strings, ">Asha<") < position(&strings, ">Chetan<"));
    assert!(!strings.contains(">Bilal<"));

    let docx = export(ExportFormat::Docx, &selected, &NoImages, &options())
        .await
        .unwrap();
    let document = unzip(&docx[0].bytes, "word/document.xml");
    assert_eq!(document.matches("<w:tr>").count(), 2 + selected.len());
    assert!(position(&document, ">Asha</w:t>") < position(&document, ">Chetan</w:t>"));
    assert!(!document.contains(">Bilal</w:t>"));

    let pdf = export(ExportFormat::Pdf, &selected, &NoImages, &options())
        .await
        .unwrap();
    assert_eq!(pdf[0].row_count, 2);
}

// ------------------------------------------------------------------
// Preview round-trip
// ------------------------------------------------------------------

#[tokio::test]
async fn test_preview_values_appear_in_every_export() {
    let students = three_students();
    let selected: Vec<&StudentRecord> = students.iter().collect();
    let table = preview_table(&selected);
    assert_eq!(table.rows.len(), 3);

    let xlsx = export(ExportFormat::Xlsx, &selected, &NoImages, &options())
        .await
        .unwrap();
    let strings = unzip(&xlsx[0].bytes, "xl/sharedStrings.xml");
    let docx = export(ExportFormat::Docx, &selected, &NoImages, &options())
        .await
        .unwrap();
    let document = unzip(&docx[0].bytes, "word/document.xml");
    let pdf = export(ExportFormat::Pdf, &selected, &NoImages, &options())
        .await
        .unwrap();

    for row in &table.rows {
        for value in row.iter().skip(1).filter(|v| !v.is_empty()) {
            assert!(strings.contains(&format!(">{value}</t>")), "xlsx missing {value:?}");
            assert!(document.contains(&format!(">{value}</w:t>")), "docx missing {value:?}");
            assert!(
                occurrences(&pdf[0].bytes, &format!("({value}) Tj")) > 0,
                "pdf missing {value:?}"
            );
        }
    }

    for text in [&strings, &document] {
        assert!(!text.contains("undefined"));
        assert!(!text.contains(">null<"));
    }
}

// ------------------------------------------------------------------
// PDF batching
// ------------------------------------------------------------------

#[tokio::test]
async fn test_fifty_one_students_make_two_pdfs() {
    let students: Vec<StudentRecord> = (1..=51)
        .map(|i| StudentRecord {
            name: Some(format!("Student {i}")),
            university_reg_no: Some(format!("U{i}")),
            ..Default::default()
        })
        .collect();
    let selected: Vec<&StudentRecord> = students.iter().collect();

    let parts = export(ExportFormat::Pdf, &selected, &NoImages, &options())
        .await
        .unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].row_count, 50);
    assert_eq!(parts[1].row_count, 1);
    assert_eq!(parts[1].file_name, "Eligibility_Form_Part2.pdf");
    assert_eq!(occurrences(&parts[1].bytes, "(Student 51) Tj"), 1);
    assert_eq!(occurrences(&parts[1].bytes, "(Student 50) Tj"), 0);
}

#[tokio::test]
async fn test_custom_batch_size() {
    let students: Vec<StudentRecord> = (0..7).map(|_| StudentRecord::default()).collect();
    let selected: Vec<&StudentRecord> = students.iter().collect();
    let opts = ExportOptions {
        pdf_batch_size: 3,
        ..options()
    };
    let parts = export(ExportFormat::Pdf, &selected, &NoImages, &opts)
        .await
        .unwrap();
    let counts: Vec<_> = parts.iter().map(|p| p.row_count).collect();
    assert_eq!(counts, vec![3, 3, 1]);
}

// ------------------------------------------------------------------
// Formats are independent
// ------------------------------------------------------------------

#[tokio::test]
async fn test_one_failing_format_leaves_the_others_on_disk() {
    let students = three_students();
    let selected: Vec<&StudentRecord> = students.iter().collect();
    let tmp = tempfile::tempdir().unwrap();
    // A directory where the spreadsheet should go makes saving it fail.
    std::fs::create_dir(tmp.path().join("students.xlsx")).unwrap();

    let results = export_to_dir(
        &ExportFormat::ALL,
        &selected,
        &NoImages,
        &options(),
        tmp.path(),
    )
    .await;

    let formats: Vec<_> = results.iter().map(|(f, _)| *f).collect();
    assert_eq!(formats, ExportFormat::ALL.to_vec());
    assert!(results[0].1.is_err());

    let docx = results[1].1.as_ref().unwrap();
    assert_eq!(docx[0].path, tmp.path().join("students.docx"));
    assert_eq!(docx[0].row_count, 3);
    let pdf = results[2].1.as_ref().unwrap();
    assert_eq!(pdf[0].path, tmp.path().join("Eligibility_Form_Part1.pdf"));
    assert_eq!(pdf[0].page_count, Some(1));

    assert!(tmp.path().join("students.docx").is_file());
    assert!(tmp.path().join("Eligibility_Form_Part1.pdf").is_file());
}

#[tokio::test]
async fn test_overlong_field_still_exports_every_format() {
    let mut students = three_students();
    students[2].address_with_phone = Some("Ludhiana ".repeat(5_000));
    let selected: Vec<&StudentRecord> = students.iter().collect();
    let tmp = tempfile::tempdir().unwrap();

    let results = export_to_dir(
        &ExportFormat::ALL,
        &selected,
        &NoImages,
        &options(),
        tmp.path(),
    )
    .await;
    for (format, result) in &results {
        assert!(result.is_ok(), "{format} failed: {result:?}");
    }
    assert!(tmp.path().join("students.xlsx").is_file());
}
