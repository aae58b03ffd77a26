//! # Output
//!
//! Turns a finished canvas into bytes plus a filename and hands the result to
//! whatever stores it. The engine never knows whether that is a directory, a
//! browser download or an in-memory buffer; it only sees [`ArtifactSink`].
//!
//! A render targets either a sink or a callback, chosen once up front through
//! [`RenderTarget`]. The callback variant receives the normalized bundle and
//! the canvas is never touched.

use std::fs;
use std::path::{Path, PathBuf};

use crate::canvas::Canvas;
use crate::error::Result;
use crate::font::FontContext;
use crate::model::{DocumentBundle, NOT_AVAILABLE};
use crate::pdf::{Metadata, PdfWriter};

/// Used in the filename when neither a document number nor an item code is known.
pub const FALLBACK_NAME: &str = "INVENTORY";

/// A rendered PDF ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Receives rendered documents.
pub trait ArtifactSink {
    fn deliver(&mut self, document: RenderedDocument) -> Result<()>;
}

/// Keeps every delivered document in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub documents: Vec<RenderedDocument>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactSink for MemorySink {
    fn deliver(&mut self, document: RenderedDocument) -> Result<()> {
        self.documents.push(document);
        Ok(())
    }
}

/// Writes each document to `<dir>/<filename>`, replacing any existing file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&mut self, document: RenderedDocument) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&document.filename);
        fs::write(&path, &document.bytes)?;
        log::info!("wrote {} ({} bytes)", path.display(), document.bytes.len());
        Ok(())
    }
}

/// Where a render ends up.
pub enum RenderTarget<'a> {
    /// Lay out, serialize and deliver to the sink.
    File(&'a mut dyn ArtifactSink),
    /// Skip layout and hand the normalized bundle to the caller.
    Callback(Box<dyn FnOnce(DocumentBundle) + 'a>),
}

impl<'a> RenderTarget<'a> {
    pub fn callback(f: impl FnOnce(DocumentBundle) + 'a) -> Self {
        RenderTarget::Callback(Box::new(f))
    }
}

/// Serialize a canvas to PDF bytes.
pub fn serialize(canvas: &Canvas, metadata: &Metadata, fonts: &FontContext) -> Result<Vec<u8>> {
    PdfWriter::new().write(canvas, metadata, fonts)
}

/// `<prefix>_<documentNumber>_<itemCode>.pdf`.
///
/// Blank parts (and an item code of `N/A`) are left out, and characters that
/// are unsafe in filenames become `-`. When both the document number and the
/// item code are blank, `INVENTORY` stands in for them.
pub fn suggest_filename(prefix: &str, document_number: &str, item_code: &str) -> String {
    let item_code = if item_code.trim() == NOT_AVAILABLE { "" } else { item_code };
    let mut parts: Vec<String> = [document_number, item_code]
        .iter()
        .map(|p| sanitize(p))
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        parts.push(FALLBACK_NAME.to_string());
    }

    let prefix = sanitize(prefix);
    if !prefix.is_empty() {
        parts.insert(0, prefix);
    }
    format!("{}.pdf", parts.join("_"))
}

fn sanitize(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_number_and_code() {
        assert_eq!(
            suggest_filename("ICS", "ICS-2025-03-042", "LAP-001"),
            "ICS_ICS-2025-03-042_LAP-001.pdf"
        );
    }

    #[test]
    fn test_filename_fallback_when_both_empty() {
        let name = suggest_filename("ICS", "", "");
        assert!(name.contains("INVENTORY"));
        assert_eq!(name, "ICS_INVENTORY.pdf");
        assert_eq!(suggest_filename("", "  ", "N/A"), "INVENTORY.pdf");
    }

    #[test]
    fn test_filename_omits_empty_parts() {
        assert_eq!(suggest_filename("ICS", "", "PC-7"), "ICS_PC-7.pdf");
        assert_eq!(suggest_filename("ICS", "ICS-1", "N/A"), "ICS_ICS-1.pdf");
    }

    #[test]
    fn test_filename_sanitized() {
        assert_eq!(suggest_filename("ICS", "2025/03 #1", "a:b"), "ICS_2025-03--1_a-b.pdf");
    }

    #[test]
    fn test_memory_sink_collects() {
        let mut sink = MemorySink::new();
        sink.deliver(RenderedDocument {
            filename: "a.pdf".to_string(),
            bytes: vec![1, 2, 3],
        })
        .unwrap();
        assert_eq!(sink.documents.len(), 1);
        assert_eq!(sink.documents[0].filename, "a.pdf");
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = std::env::temp_dir().join(format!("custody-slip-sink-{}", std::process::id()));
        let mut sink = DirectorySink::new(&dir);
        sink.deliver(RenderedDocument {
            filename: "ICS_TEST.pdf".to_string(),
            bytes: b"%PDF-1.7".to_vec(),
        })
        .unwrap();
        let written = fs::read(dir.join("ICS_TEST.pdf")).unwrap();
        assert_eq!(written, b"%PDF-1.7");
        let _ = fs::remove_dir_all(&dir);
    }
}
