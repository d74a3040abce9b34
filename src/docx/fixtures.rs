use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::Document;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const V_NS: &str = "urn:schemas-microsoft-com:vml";

pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn run(text: &str) -> String {
    format!(
        r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

pub(crate) fn bold_run(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

pub(crate) fn italic_run(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

/// Run-level content control wrapping `runs`.
pub(crate) fn content_control(runs: &[String]) -> String {
    format!(
        r#"<w:sdt><w:sdtPr><w:tag w:val="field"/></w:sdtPr><w:sdtContent>{}</w:sdtContent></w:sdt>"#,
        runs.concat()
    )
}

pub(crate) fn paragraph_of(runs: &[String]) -> String {
    format!("<w:p>{}</w:p>", runs.concat())
}

pub(crate) fn paragraph(text: &str) -> String {
    if text.is_empty() {
        return "<w:p/>".to_string();
    }
    paragraph_of(&[run(text)])
}

pub(crate) fn paragraphs(lines: &[&str]) -> String {
    lines.iter().map(|line| paragraph(line)).collect()
}

pub(crate) fn table(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in *row {
            xml.push_str("<w:tc>");
            for line in cell.split('\n') {
                xml.push_str(&paragraph(line));
            }
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// A paragraph whose only run anchors a VML text box holding `text`.
pub(crate) fn textbox_paragraph(text: &str) -> String {
    format!(
        "<w:p><w:r><w:pict><v:shape><v:textbox><w:txbxContent>{}</w:txbxContent></v:textbox></v:shape></w:pict></w:r></w:p>",
        paragraph(text)
    )
}

pub(crate) fn package(body: &str, header: Option<&str>, footer: Option<&str>) -> Vec<u8> {
    let mut entries: Vec<(String, String)> = vec![
        (
            "[Content_Types].xml".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#.to_string(),
        ),
        (
            "word/document.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}" xmlns:v="{V_NS}"><w:body>{body}<w:sectPr/></w:body></w:document>"#
            ),
        ),
    ];

    if let Some(header) = header {
        entries.push((
            "word/header1.xml".to_string(),
            format!(r#"<w:hdr xmlns:w="{W_NS}" xmlns:v="{V_NS}">{header}</w:hdr>"#),
        ));
    }
    if let Some(footer) = footer {
        entries.push((
            "word/footer1.xml".to_string(),
            format!(r#"<w:ftr xmlns:w="{W_NS}" xmlns:v="{V_NS}">{footer}</w:ftr>"#),
        ));
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(name.as_str(), options)
            .expect("fixture entry starts");
        zip.write_all(content.as_bytes())
            .expect("fixture entry writes");
    }
    zip.finish().expect("fixture zip finishes").into_inner()
}

pub(crate) fn document(body: &str) -> Document {
    document_with_parts(body, None, None)
}

pub(crate) fn document_with_parts(
    body: &str,
    header: Option<&str>,
    footer: Option<&str>,
) -> Document {
    Document::from_bytes(&package(body, header, footer)).expect("fixture document loads")
}

/// Worksheet made only of single-run paragraphs.
pub(crate) fn worksheet(lines: &[&str]) -> Document {
    document(&paragraphs(lines))
}
