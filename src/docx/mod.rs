//! WordprocessingML package access.
//!
//! A [`Document`] keeps every zip entry of the package in its original order
//! and parses the parts the filler reads or rewrites: the main document part
//! plus every header and footer part. Saving re-serializes those parts and
//! copies every other entry through untouched.

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::FillError;

mod text;
mod xml;

#[cfg(test)]
pub(crate) mod fixtures;

pub use text::{
    BODY, PARAGRAPH, Paragraph, ParagraphMut, TABLE, Table, ensure_paragraph, walk_paragraphs,
    walk_paragraphs_mut,
};
#[cfg(test)]
pub use text::{RunFormat, TABLE_CELL};
pub use xml::{XmlElement, XmlError, XmlNode, XmlTree};

pub const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;
pub const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";
pub const MAIN_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("package i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("package is missing required entry {0}")]
    MissingEntry(&'static str),

    #[error("part {part} is not valid UTF-8")]
    Encoding { part: String },

    #[error("part {part} is not well-formed xml: {source}")]
    Xml {
        part: String,
        #[source]
        source: XmlError,
    },

    #[error("main document part has no w:body element")]
    MissingBody,

    #[error("expected a .docx file, got {0:?}")]
    Extension(String),

    #[error("file is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Main,
    Header,
    Footer,
}

impl PartKind {
    fn for_entry(name: &str) -> Option<Self> {
        if name == MAIN_PART {
            return Some(Self::Main);
        }

        let file_name = name.strip_prefix("word/")?;
        if file_name.contains('/') || !file_name.ends_with(".xml") {
            return None;
        }
        if file_name.starts_with("header") {
            return Some(Self::Header);
        }
        if file_name.starts_with("footer") {
            return Some(Self::Footer);
        }
        None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Header => "header",
            Self::Footer => "footer",
        }
    }
}

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    directory: bool,
}

#[derive(Debug, Clone)]
pub struct XmlPart {
    pub name: String,
    pub kind: PartKind,
    pub tree: XmlTree,
}

#[derive(Debug, Clone)]
pub struct Document {
    entries: Vec<PackageEntry>,
    parts: Vec<XmlPart>,
}

impl Document {
    /// Loads a `.docx` file, mapping every failure onto a typed [`FillError`].
    pub fn open(path: &Path) -> Result<Self, FillError> {
        if !path.is_file() {
            return Err(FillError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let invalid = |source: DocxError| FillError::InvalidFormat {
            path: path.to_path_buf(),
            source,
        };

        if !has_docx_extension(path) {
            let extension = path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(invalid(DocxError::Extension(extension)));
        }

        let size = fs::metadata(path)
            .map_err(|source| FillError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        if size > MAX_DOCUMENT_BYTES {
            return Err(invalid(DocxError::TooLarge {
                size,
                limit: MAX_DOCUMENT_BYTES,
            }));
        }

        let bytes = fs::read(path).map_err(|source| FillError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::from_bytes(&bytes).map_err(invalid)?;

        info!(
            path = %path.display(),
            bytes = size,
            parts = document.parts.len(),
            "loaded document"
        );
        Ok(document)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let name = file.name().to_string();
            let directory = file.is_dir();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name,
                data,
                directory,
            });
        }

        if !entries.iter().any(|entry| entry.name == CONTENT_TYPES_ENTRY) {
            return Err(DocxError::MissingEntry(CONTENT_TYPES_ENTRY));
        }
        if !entries.iter().any(|entry| entry.name == MAIN_PART) {
            return Err(DocxError::MissingEntry(MAIN_PART));
        }

        let mut parts = Vec::new();
        for entry in &entries {
            let Some(kind) = PartKind::for_entry(&entry.name) else {
                continue;
            };
            let xml = std::str::from_utf8(&entry.data).map_err(|_| DocxError::Encoding {
                part: entry.name.clone(),
            })?;
            let tree = XmlTree::parse(xml).map_err(|source| DocxError::Xml {
                part: entry.name.clone(),
                source,
            })?;
            debug!(part = %entry.name, kind = kind.as_str(), "parsed package part");
            parts.push(XmlPart {
                name: entry.name.clone(),
                kind,
                tree,
            });
        }

        // Main part first so body order drives every walk.
        parts.sort_by_key(|part| part.kind != PartKind::Main);

        let document = Self { entries, parts };
        if document.body().is_none() {
            return Err(DocxError::MissingBody);
        }
        Ok(document)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut rendered: HashMap<&str, Vec<u8>> = HashMap::with_capacity(self.parts.len());
        for part in &self.parts {
            let bytes = part.tree.to_bytes().map_err(|source| DocxError::Xml {
                part: part.name.clone(),
                source,
            })?;
            rendered.insert(part.name.as_str(), bytes);
        }

        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            if entry.directory {
                zip.add_directory(entry.name.as_str(), deflated)?;
                continue;
            }

            let options = if entry.name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            let data = rendered
                .get(entry.name.as_str())
                .map(Vec::as_slice)
                .unwrap_or(entry.data.as_slice());

            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Writes the package to `path`, which must name a `.docx` file.
    pub fn save(&self, path: &Path) -> Result<(), FillError> {
        if !has_docx_extension(path) {
            return Err(FillError::BadOutputPath {
                path: path.to_path_buf(),
            });
        }

        let bytes = self.to_bytes().map_err(|source| FillError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| FillError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, &bytes).map_err(|source| FillError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), bytes = bytes.len(), "saved document");
        Ok(())
    }

    pub fn parts(&self) -> &[XmlPart] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [XmlPart] {
        &mut self.parts
    }

    fn body(&self) -> Option<&XmlElement> {
        self.parts
            .iter()
            .find(|part| part.kind == PartKind::Main)
            .and_then(|part| part.tree.root.child(BODY))
    }

    /// Top-level body paragraphs, in document order.
    pub fn body_paragraphs(&self) -> Vec<Paragraph<'_>> {
        self.body()
            .map(|body| body.children_named(PARAGRAPH).map(Paragraph::new).collect())
            .unwrap_or_default()
    }

    pub fn body_paragraph_texts(&self) -> Vec<String> {
        self.body_paragraphs()
            .iter()
            .map(|paragraph| paragraph.text())
            .collect()
    }

    /// Top-level body tables, in document order.
    pub fn body_tables(&self) -> Vec<Table<'_>> {
        self.body()
            .map(|body| body.children_named(TABLE).map(Table::new).collect())
            .unwrap_or_default()
    }

    /// Visits every paragraph of every parsed part: body, table cells,
    /// text boxes, headers and footers.
    pub fn for_each_paragraph_mut(&mut self, mut visit: impl FnMut(&str, ParagraphMut<'_>)) {
        for part in &mut self.parts {
            let name = part.name.as_str();
            walk_paragraphs_mut(&mut part.tree.root, &mut |paragraph: ParagraphMut<'_>| {
                visit(name, paragraph)
            });
        }
    }

    pub fn all_paragraph_texts(&self) -> Vec<String> {
        let mut texts = Vec::new();
        for part in &self.parts {
            walk_paragraphs(&part.tree.root, &mut |paragraph: Paragraph<'_>| {
                texts.push(paragraph.text())
            });
        }
        texts
    }
}

fn has_docx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("docx"))
        .unwrap_or(false)
}
