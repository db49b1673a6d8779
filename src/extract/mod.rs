//! Per-format raw-text extraction.
//!
//! Files are classified by extension and extracted with a format-specific
//! reader: `pdf-extract` for PDF, `scraper` for HTML, plain reads for text.
//! Failures never cross this boundary as errors. A file that cannot be
//! decoded produces an [`ExtractedDocument`] with `Failed` status and empty
//! text, logged with the file identity, and the corpus pass moves on.

use std::path::{Path, PathBuf};

use scraper::Html;
use thiserror::Error;

/// Document formats recognized by the corpus walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.pdf`
    Pdf,
    /// `.html` / `.htm`
    Html,
    /// `.txt`
    Text,
    /// Anything else; skipped without extraction.
    Unsupported,
}

/// Outcome of extracting one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// Extraction produced non-empty text.
    Ok,
    /// Extraction succeeded but yielded only whitespace.
    Empty,
    /// The file could not be read or decoded.
    Failed,
}

/// A document lifted out of the corpus for one pass.
#[derive(Debug)]
pub struct ExtractedDocument {
    /// Filesystem path the document was read from.
    pub path: PathBuf,
    /// File name used in summaries and progress events.
    pub display_name: String,
    /// Classified format.
    pub format: DocumentFormat,
    /// Extracted text; empty when extraction failed.
    pub raw_text: String,
    /// Extraction outcome.
    pub status: ExtractionStatus,
}

#[derive(Debug, Error)]
enum ExtractionError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Classify a path by its lowercased extension.
pub fn classify(path: &Path) -> DocumentFormat {
    let Some(extension) = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
    else {
        return DocumentFormat::Unsupported;
    };

    match extension.as_str() {
        "pdf" => DocumentFormat::Pdf,
        "html" | "htm" => DocumentFormat::Html,
        "txt" => DocumentFormat::Text,
        _ => DocumentFormat::Unsupported,
    }
}

/// Extract the raw text of a classified file.
///
/// The caller always receives a document; failures degrade to `Failed`
/// status with empty text and a warning log entry.
pub fn extract_document(path: &Path, format: DocumentFormat) -> ExtractedDocument {
    let display_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    let extracted = match format {
        DocumentFormat::Pdf => read_pdf(path),
        DocumentFormat::Html => read_html(path),
        DocumentFormat::Text => read_text(path),
        DocumentFormat::Unsupported => Ok(String::new()),
    };

    let (raw_text, status) = match extracted {
        Ok(text) if text.trim().is_empty() => (text, ExtractionStatus::Empty),
        Ok(text) => (text, ExtractionStatus::Ok),
        Err(error) => {
            tracing::warn!(file = %display_name, %error, "Extraction failed; skipping file");
            (String::new(), ExtractionStatus::Failed)
        }
    };

    ExtractedDocument {
        path: path.to_path_buf(),
        display_name,
        format,
        raw_text,
        status,
    }
}

fn read_pdf(path: &Path) -> Result<String, ExtractionError> {
    // pdf-extract walks pages in order and concatenates their text.
    pdf_extract::extract_text(path).map_err(|error| ExtractionError::Pdf(error.to_string()))
}

fn read_html(path: &Path) -> Result<String, ExtractionError> {
    let markup = std::fs::read_to_string(path)?;
    Ok(html_to_text(&markup))
}

fn read_text(path: &Path) -> Result<String, ExtractionError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Strip markup from an HTML document, keeping rendered text only.
///
/// Text inside `<script>` and `<style>` elements is not rendered content and
/// is excluded.
fn html_to_text(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let excluded = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| matches!(element.name(), "script" | "style"))
        });
        if !excluded {
            text.push_str(fragment);
        }
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify(Path::new("report.pdf")), DocumentFormat::Pdf);
        assert_eq!(classify(Path::new("page.HTML")), DocumentFormat::Html);
        assert_eq!(classify(Path::new("page.htm")), DocumentFormat::Html);
        assert_eq!(classify(Path::new("notes.txt")), DocumentFormat::Text);
        assert_eq!(classify(Path::new("data.csv")), DocumentFormat::Unsupported);
        assert_eq!(classify(Path::new("Makefile")), DocumentFormat::Unsupported);
    }

    #[test]
    fn strips_markup_from_html() {
        assert_eq!(html_to_text("<p>hi</p>"), "hi");
        assert_eq!(
            html_to_text("<html><body><h1>Title</h1><p>Body text.</p></body></html>"),
            "TitleBody text."
        );
    }

    #[test]
    fn excludes_script_and_style_content() {
        let markup = "<html><head><style>p { color: red; }</style></head>\
                      <body><script>var hidden = 1;</script><p>visible</p></body></html>";
        assert_eq!(html_to_text(markup), "visible");
    }

    #[test]
    fn reads_plain_text_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "hello world").expect("write");

        let document = extract_document(&path, DocumentFormat::Text);
        assert_eq!(document.status, ExtractionStatus::Ok);
        assert_eq!(document.raw_text, "hello world");
        assert_eq!(document.display_name, "note.txt");
    }

    #[test]
    fn whitespace_only_text_is_empty_status() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, "  \n\t ").expect("write");

        let document = extract_document(&path, DocumentFormat::Text);
        assert_eq!(document.status, ExtractionStatus::Empty);
    }

    #[test]
    fn corrupt_pdf_degrades_to_failed_status() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.pdf");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(b"not a pdf at all").expect("write");

        let document = extract_document(&path, DocumentFormat::Pdf);
        assert_eq!(document.status, ExtractionStatus::Failed);
        assert!(document.raw_text.is_empty());
    }

    #[test]
    fn missing_file_degrades_to_failed_status() {
        let document = extract_document(Path::new("/no/such/file.txt"), DocumentFormat::Text);
        assert_eq!(document.status, ExtractionStatus::Failed);
        assert!(document.raw_text.is_empty());
    }
}
