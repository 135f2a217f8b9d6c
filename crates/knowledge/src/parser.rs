//! Source file discovery and text extraction.

use docroute_core::{AppError, AppResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    Pdf,
    Docx,
    PlainText,
}

impl ContentType {
    /// Detect content type from file extension. `None` for unsupported files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "text" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::PlainText => "text",
        }
    }
}

/// Extracted text of one input file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path as given or discovered, used as the chunk source.
    pub source: String,
    /// File name without directories.
    pub file: String,
    pub content_type: ContentType,
    pub text: String,
}

/// Expand files and directories into the supported files beneath them,
/// in a stable order.
pub fn collect_files(paths: &[PathBuf]) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if ContentType::from_path(path).is_some() {
                files.push(path.clone());
            } else {
                tracing::warn!("Skipping unsupported file: {:?}", path);
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(|e| AppError::Io(e.into()))?;
                if entry.file_type().is_file() && ContentType::from_path(entry.path()).is_some() {
                    files.push(entry.into_path());
                }
            }
        } else {
            return Err(AppError::Config(format!("Input path does not exist: {:?}", path)));
        }
    }

    Ok(files)
}

/// Parse a source file and extract clean text.
pub fn parse_file(path: &Path) -> AppResult<SourceDocument> {
    let content_type = ContentType::from_path(path)
        .ok_or_else(|| AppError::Config(format!("Unsupported file type: {:?}", path)))?;

    let text = match content_type {
        ContentType::Pdf => pdf_extract::extract_text(path)
            .map_err(|e| AppError::Other(format!("Failed to extract text from {:?}: {}", path, e)))?,
        ContentType::Docx => extract_docx(path)?,
        _ => {
            let raw = fs::read_to_string(path)?;
            if raw.contains('\0') {
                return Err(AppError::Other(format!("Binary content in {:?}", path)));
            }
            match content_type {
                ContentType::Markdown => clean_markdown(&raw),
                ContentType::Html => clean_html(&raw),
                _ => raw,
            }
        }
    };

    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(SourceDocument {
        source: path.to_string_lossy().to_string(),
        file,
        content_type,
        text,
    })
}

/// Strip heading markers, rules and code fences.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }
        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

const DOCX_BODY: &str = "word/document.xml";

/// Read the paragraph text out of a Word document's main body part.
fn extract_docx(path: &Path) -> AppResult<String> {
    let fail = |e: &dyn std::fmt::Display| {
        AppError::Other(format!("Failed to extract text from {:?}: {}", path, e))
    };

    let mut archive = zip::ZipArchive::new(fs::File::open(path)?).map_err(|e| fail(&e))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| fail(&e))?
        .read_to_string(&mut xml)?;

    docx_body_text(&xml).map_err(|e| fail(&e))
}

/// Collect `w:t` runs, one line per `w:p` paragraph.
fn docx_body_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => text.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Strip tags along with script and style bodies, then collapse whitespace.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;
            let rest = &text[i..];
            if starts_with_ignore_case(rest, "<script") {
                in_script = true;
            } else if starts_with_ignore_case(rest, "</script") {
                in_script = false;
            } else if starts_with_ignore_case(rest, "<style") {
                in_style = true;
            } else if starts_with_ignore_case(rest, "</style") {
                in_style = false;
            }
        } else if ch == '>' {
            in_tag = false;
            result.push(' ');
        } else if !in_tag && !in_script && !in_style {
            result.push(ch);
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}
