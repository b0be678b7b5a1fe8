//! Export packaging: file naming, ZIP batches, and delivery targets.

use std::collections::HashMap;
use std::io::{Cursor, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::{Error, Result};

const UNSAFE_FILENAME_CHARS: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];
const BATCH_PREFIX: &str = "export-batch";
const RENDER_PREFIX: &str = "export";

/// Timestamps already handed out by [`next_export_file_name`], with their
/// repeat count.
static ISSUED_NAMES: LazyLock<Mutex<HashMap<String, u32>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// A document selected for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl ExportDocument {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            title: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Title if it has visible text, otherwise the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Replace characters that are unsafe in file names with `-`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|ch| if UNSAFE_FILENAME_CHARS.contains(&ch) { '-' } else { ch })
        .collect()
}

/// `{prefix}-YYYY-MM-DDTHH-MM-SS.{ext}` for the given instant.
#[must_use]
pub fn timestamp_file_name(prefix: &str, ext: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}-{}.{ext}", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// Timestamped file name that is unique within this process.
///
/// A name already issued in the same second gets a `-2`, `-3`, ... suffix.
#[must_use]
pub fn next_export_file_name(prefix: &str, ext: &str) -> String {
    next_export_file_name_at(prefix, ext, Utc::now())
}

fn next_export_file_name_at(prefix: &str, ext: &str, now: DateTime<Utc>) -> String {
    let base = timestamp_file_name(prefix, ext, now);
    let mut issued = ISSUED_NAMES.lock().unwrap_or_else(PoisonError::into_inner);
    let count = issued.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        let stem = base.strip_suffix(&format!(".{ext}")).unwrap_or(&base);
        format!("{stem}-{count}.{ext}")
    }
}

/// `<sanitized title or id>.md`.
#[must_use]
pub fn document_file_name(document: &ExportDocument) -> String {
    format!("{}.md", sanitize_filename(document.display_name()))
}

/// Entry names for a batch, with ` (2)`, ` (3)`, ... added to repeats.
#[must_use]
pub fn zip_entry_names(documents: &[ExportDocument]) -> Vec<String> {
    let mut seen: HashMap<String, u32> = HashMap::new();
    let mut names = Vec::with_capacity(documents.len());
    for document in documents {
        let mut name = document_file_name(document);
        loop {
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                break;
            }
            let stem = name.strip_suffix(".md").unwrap_or(&name);
            name = format!("{stem} ({count}).md");
        }
        names.push(name);
    }
    names
}

/// Pack documents into an in-memory ZIP archive, one deflated entry each.
pub fn build_zip(documents: &[ExportDocument]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (document, name) in documents.iter().zip(zip_entry_names(documents)) {
        writer.start_file(name.as_str(), options)?;
        writer
            .write_all(document.content.as_bytes())
            .map_err(|error| Error::Packaging(format!("Failed to write {name}: {error}")))?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Sink for text copied to the system clipboard.
pub trait Clipboard {
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Where exported content goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Exact output path.
    File(PathBuf),
    /// Directory that receives a timestamped file.
    Directory(PathBuf),
    Clipboard,
    Stdout,
}

/// What [`deliver`] did with the documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, documents: usize },
    Copied { documents: usize },
    /// Text for the caller to print.
    Printed { text: String, documents: usize },
}

impl ExportOutcome {
    #[must_use]
    pub const fn documents(&self) -> usize {
        match self {
            Self::Written { documents, .. }
            | Self::Copied { documents }
            | Self::Printed { documents, .. } => *documents,
        }
    }

    /// One-line description for status messages.
    #[must_use]
    pub fn summary(&self) -> String {
        let count = self.documents();
        let noun = if count == 1 { "document" } else { "documents" };
        match self {
            Self::Written { path, .. } => {
                format!("Exported {count} {noun} to {}", path.display())
            }
            Self::Copied { .. } => format!("Copied {count} {noun} to the clipboard"),
            Self::Printed { .. } => format!("Exported {count} {noun}"),
        }
    }
}

/// Deliver documents to a target.
///
/// One document is written as plain Markdown. Several documents become a
/// ZIP archive for file targets, or are joined by a blank line for text
/// targets.
pub fn deliver(
    documents: &[ExportDocument],
    target: &ExportTarget,
    clipboard: Option<&dyn Clipboard>,
) -> Result<ExportOutcome> {
    if documents.is_empty() {
        return Err(Error::InvalidInput("Nothing to export".to_string()));
    }
    let count = documents.len();

    match target {
        ExportTarget::File(path) => {
            write_output(path, documents)?;
            Ok(ExportOutcome::Written {
                path: path.clone(),
                documents: count,
            })
        }
        ExportTarget::Directory(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_name = match documents {
                [single] => next_export_file_name(&sanitize_filename(single.display_name()), "md"),
                _ => next_export_file_name(BATCH_PREFIX, "zip"),
            };
            let path = dir.join(file_name);
            write_output(&path, documents)?;
            Ok(ExportOutcome::Written {
                path,
                documents: count,
            })
        }
        ExportTarget::Clipboard => {
            let clipboard = clipboard
                .ok_or_else(|| Error::Clipboard("No clipboard is available".to_string()))?;
            clipboard.set_text(&joined_text(documents))?;
            Ok(ExportOutcome::Copied { documents: count })
        }
        ExportTarget::Stdout => Ok(ExportOutcome::Printed {
            text: joined_text(documents),
            documents: count,
        }),
    }
}

/// Deliver one rendered page.
///
/// Files receive `page`; a directory gets `export-<timestamp>.<extension>`.
/// The clipboard receives `clipboard_text`, which is the bare renderer
/// output rather than the standalone page.
pub fn deliver_rendered(
    page: &str,
    clipboard_text: &str,
    extension: &str,
    target: &ExportTarget,
    clipboard: Option<&dyn Clipboard>,
) -> Result<ExportOutcome> {
    let path = match target {
        ExportTarget::File(path) => path.clone(),
        ExportTarget::Directory(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.join(next_export_file_name(RENDER_PREFIX, extension))
        }
        ExportTarget::Clipboard => {
            let clipboard = clipboard
                .ok_or_else(|| Error::Clipboard("No clipboard is available".to_string()))?;
            clipboard.set_text(clipboard_text)?;
            return Ok(ExportOutcome::Copied { documents: 1 });
        }
        ExportTarget::Stdout => {
            return Ok(ExportOutcome::Printed {
                text: page.to_string(),
                documents: 1,
            });
        }
    };

    std::fs::write(&path, page)?;
    tracing::info!(path = %path.display(), "Wrote rendered page");
    Ok(ExportOutcome::Written { path, documents: 1 })
}

fn write_output(path: &Path, documents: &[ExportDocument]) -> Result<()> {
    match documents {
        [single] => std::fs::write(path, &single.content)?,
        _ => std::fs::write(path, build_zip(documents)?)?,
    }
    tracing::info!(path = %path.display(), documents = documents.len(), "Wrote export");
    Ok(())
}

fn joined_text(documents: &[ExportDocument]) -> String {
    documents
        .iter()
        .map(|document| document.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
