//! Read-only preview of an export, built from the same schema and row
//! mapping the exporters use.

use proforma_core::StudentRecord;

use crate::schema::{self, CellValue, HeaderCell};

/// The preview as plain data: header cells plus one text row per student.
/// Image columns are empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTable {
    pub header: Vec<HeaderCell>,
    pub rows: Vec<Vec<String>>,
}

pub fn preview_table(students: &[&StudentRecord]) -> PreviewTable {
    PreviewTable {
        header: schema::merged_header(),
        rows: students
            .iter()
            .enumerate()
            .map(|(idx, s)| schema::text_row(s, idx + 1))
            .collect(),
    }
}

/// Generate a complete HTML document with the given title and body HTML content.
pub fn generate_html(title: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 2rem; color: #333; }}
        table {{ border-collapse: collapse; font-size: 12px; }}
        th, td {{ border: 1px solid #999; padding: 4px; text-align: center; vertical-align: middle; }}
        th {{ background-color: #f4f4f4; font-weight: 600; }}
        img.signature {{ max-width: 100px; max-height: 40px; }}
        img.photo {{ max-width: 68px; max-height: 80px; }}
    </style>
</head>
<body>
{body_html}
</body>
</html>"#,
        title = escape_html(title),
        body_html = body_html,
    )
}

/// Render the proforma preview table. Cell content is HTML-escaped; image
/// columns show the source image when a URL is present.
pub fn generate_preview_table(students: &[&StudentRecord]) -> String {
    let mut html = String::from("<table>\n<thead>\n");

    for row in 0..2 {
        html.push_str("<tr>\n");
        for cell in schema::merged_header().iter().filter(|c| c.row == row) {
            html.push_str(&format!(
                "    <th colspan=\"{}\" rowspan=\"{}\">{}</th>\n",
                cell.col_span(),
                cell.row_span,
                escape_html(&cell.text)
            ));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</thead>\n<tbody>\n");

    for (idx, student) in students.iter().enumerate() {
        html.push_str("<tr>\n");
        for value in schema::row_values(student, idx + 1) {
            let inner = match &value {
                CellValue::Image(kind, Some(url)) => {
                    let class = match kind {
                        schema::ImageKind::Signature => "signature",
                        schema::ImageKind::Photo => "photo",
                    };
                    format!("<img class=\"{class}\" src=\"{}\" alt=\"\">", escape_html(url))
                }
                other => escape_html(&other.display_text()),
            };
            html.push_str(&format!("    <td>{inner}</td>\n"));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>");
    html
}

/// Full preview page: title block, metadata and the table.
pub fn generate_preview_page(
    header: &proforma_core::FormHeader,
    students: &[&StudentRecord],
) -> String {
    let mut body = String::new();
    for (tag, text) in [
        ("h1", &header.institution),
        ("h2", &header.department),
        ("h2", &header.form_title),
    ] {
        body.push_str(&format!("<{tag}>{}</{tag}>\n", escape_html(text)));
    }
    body.push_str("<p>");
    body.push_str(
        &header
            .metadata_fields()
            .iter()
            .map(|f| escape_html(f))
            .collect::<Vec<_>>()
            .join(" &nbsp;&nbsp; "),
    );
    body.push_str("</p>\n");
    body.push_str(&generate_preview_table(students));
    generate_html(&header.form_title, &body)
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
