//! Attachment ingestion: turns selected files into [`ProcessedFile`]
//! records (extracted text, page images or an opaque binary blob) ahead of
//! prompt assembly.
//!
//! Failures are per-file and never abort a batch: every path resolves to a
//! record whose `status` says what happened.

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, warn};
use tokio::fs;
use tokio::task;

use crate::error::Result;
use crate::types::{FileStatus, PageImage, ProcessedFile};

pub const MAX_FILE_SIZE_MB: u64 = 10;
pub const MAX_FILE_SIZE_BYTES: u64 = MAX_FILE_SIZE_MB * 1024 * 1024;
pub const MAX_ATTACHMENTS: usize = 5;

/// Below this average per-page character count a PDF is treated as scanned.
const PDF_MIN_CHARS_PER_PAGE: usize = 50;
/// Page rendering is only attempted for documents this short.
const PDF_MAX_RENDER_PAGES: usize = 5;
const PDF_RENDER_SCALE: f32 = 1.5;

const IMAGE_MIME_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/heic",
    "image/heif",
];

/// Rasterizes PDF pages to PNG bytes for visual analysis of scanned
/// documents. Injected so the heuristic and fallback order stay testable;
/// the default implementation renders nothing, which routes low-text PDFs
/// to whatever text was extracted.
pub trait PdfPageRenderer: Send + Sync {
    fn render_pages(&self, pdf_bytes: &[u8], max_pages: usize, scale: f32)
        -> Result<Vec<Vec<u8>>>;
}

/// Renderer that produces no pages.
pub struct NoPageRenderer;

impl PdfPageRenderer for NoPageRenderer {
    fn render_pages(&self, _pdf_bytes: &[u8], _max_pages: usize, _scale: f32)
        -> Result<Vec<Vec<u8>>> {
        Ok(Vec::new())
    }
}

pub struct FileIngestor {
    max_bytes: u64,
    renderer: Arc<dyn PdfPageRenderer>,
}

impl Default for FileIngestor {
    fn default() -> Self {
        Self::new(Arc::new(NoPageRenderer))
    }
}

impl FileIngestor {
    pub fn new(renderer: Arc<dyn PdfPageRenderer>) -> Self {
        Self {
            max_bytes: MAX_FILE_SIZE_BYTES,
            renderer,
        }
    }

    /// Ingests a file from disk. The size limit is checked against metadata
    /// before any bytes are read.
    pub async fn process_path(&self, path: impl AsRef<Path>) -> ProcessedFile {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        let size = match fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                return error_record(
                    ProcessedFile::processing(&name, &mime_type, 0),
                    format!("Error reading file data: {}", e),
                )
            }
        };
        if size > self.max_bytes {
            return error_record(
                ProcessedFile::processing(&name, &mime_type, size),
                format!("File too large (max {}MB)", MAX_FILE_SIZE_MB),
            );
        }

        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return error_record(
                    ProcessedFile::processing(&name, &mime_type, size),
                    format!("Error reading file data: {}", e),
                )
            }
        };
        self.process_bytes(name, mime_type, bytes).await
    }

    /// Ingests already-loaded bytes. Always resolves to a record; parse and
    /// read failures land in `error_message`.
    pub async fn process_bytes(
        &self,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> ProcessedFile {
        let name = name.into();
        let mime_type = mime_type.into();
        debug!(
            "Processing file {} ({}, {} bytes)",
            name,
            mime_type,
            bytes.len()
        );

        let mut record = ProcessedFile::processing(&name, &mime_type, bytes.len() as u64);
        if bytes.len() as u64 > self.max_bytes {
            return error_record(record, format!("File too large (max {}MB)", MAX_FILE_SIZE_MB));
        }

        match mime_type.as_str() {
            "application/pdf" => self.process_pdf(record, bytes).await,
            mime if IMAGE_MIME_TYPES.contains(&mime) => {
                record.page_images.push(PageImage {
                    mime_type,
                    data: bytes,
                });
                record.status = FileStatus::Processed;
                record
            }
            "text/plain" | "text/markdown" => {
                record.extracted_text = Some(String::from_utf8_lossy(&bytes).into_owned());
                record.status = FileStatus::Processed;
                record
            }
            // Word documents, and anything else we cannot extract locally,
            // are forwarded to the model as opaque binary content. Whether
            // the provider can decode them is an assumption, not a checked
            // capability.
            _ => {
                record.raw_document = Some(bytes);
                record.status = FileStatus::Processed;
                record
            }
        }
    }

    async fn process_pdf(&self, mut record: ProcessedFile, bytes: Vec<u8>) -> ProcessedFile {
        let parse_bytes = bytes.clone();
        let extracted = task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&parse_bytes)
        })
        .await;

        let pages = match extracted {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => return error_record(record, format!("Error processing PDF: {}", e)),
            Err(e) => {
                warn!("PDF extraction task failed for {}: {}", record.name, e);
                return error_record(record, "Unexpected processing error.".to_string());
            }
        };

        let total_chars: usize = pages.iter().map(|p| p.len()).sum();
        debug!(
            "PDF {}: {} page(s), {} chars extracted",
            record.name,
            pages.len(),
            total_chars
        );

        if !needs_page_render(&pages) {
            record.extracted_text = Some(join_pages(&pages));
            record.status = FileStatus::Processed;
            return record;
        }

        debug!(
            "Low text content for {}; rendering up to {} page(s) for visual analysis",
            record.name, PDF_MAX_RENDER_PAGES
        );
        let renderer = Arc::clone(&self.renderer);
        let rendered = task::spawn_blocking(move || {
            renderer.render_pages(&bytes, PDF_MAX_RENDER_PAGES, PDF_RENDER_SCALE)
        })
        .await;

        let rendered = match rendered {
            Ok(Ok(images)) => images,
            Ok(Err(e)) => {
                warn!("Page rendering failed for {}: {}", record.name, e);
                Vec::new()
            }
            Err(e) => {
                warn!("Page rendering task failed for {}: {}", record.name, e);
                Vec::new()
            }
        };

        apply_low_text_outcome(&mut record, pages, rendered);
        record
    }
}

/// Scanned-document heuristic: little text per page and few enough pages
/// that rendering them all is affordable.
fn needs_page_render(pages: &[String]) -> bool {
    if pages.is_empty() || pages.len() > PDF_MAX_RENDER_PAGES {
        return false;
    }
    let total_chars: usize = pages.iter().map(|p| p.len()).sum();
    total_chars / pages.len() < PDF_MIN_CHARS_PER_PAGE
}

/// Resolution order for a low-text PDF: rendered pages first, any extracted
/// text second, otherwise an error record.
fn apply_low_text_outcome(record: &mut ProcessedFile, pages: Vec<String>, rendered: Vec<Vec<u8>>) {
    if !rendered.is_empty() {
        record.page_images = rendered
            .into_iter()
            .map(|data| PageImage {
                mime_type: "image/png".to_string(),
                data,
            })
            .collect();
        record.status = FileStatus::Processed;
        return;
    }

    let text = join_pages(&pages);
    if !text.is_empty() {
        record.extracted_text = Some(text);
        record.status = FileStatus::Processed;
        return;
    }

    record.status = FileStatus::Error;
    record.error_message =
        Some("PDF has low text content, and image conversion for OCR failed.".to_string());
}

fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| p.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

fn error_record(mut record: ProcessedFile, message: String) -> ProcessedFile {
    record.status = FileStatus::Error;
    record.error_message = Some(message);
    record
}

/// A file the user picked, read into memory by the caller.
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// The set of attachments staged for the next submission. Records are keyed
/// by a generated id so concurrently processed files can resolve in any
/// order.
#[derive(Default)]
pub struct AttachmentTray {
    entries: Vec<ProcessedFile>,
}

impl AttachmentTray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[ProcessedFile] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a placeholder record for a selected file. Returns `None`
    /// once the attachment cap is reached.
    pub fn admit(&mut self, name: &str, mime_type: &str, size: u64) -> Option<String> {
        if self.entries.len() >= MAX_ATTACHMENTS {
            return None;
        }
        let record = ProcessedFile::processing(name, mime_type, size);
        let id = record.id.clone();
        self.entries.push(record);
        Some(id)
    }

    /// Applies a processing outcome to the record with the given id. The
    /// update is keyed, never positional, so out-of-order completion is
    /// safe. Unknown ids (e.g. removed while processing) are ignored.
    pub fn resolve(&mut self, id: &str, outcome: ProcessedFile) {
        let Some(entry) = self.entries.iter_mut().find(|f| f.id == id) else {
            debug!("resolve: attachment {} no longer in tray", id);
            return;
        };
        entry.status = outcome.status;
        entry.extracted_text = outcome.extracted_text;
        entry.raw_document = outcome.raw_document;
        entry.page_images = outcome.page_images;
        entry.error_message = outcome.error_message;
    }

    pub fn remove(&mut self, id: &str) {
        self.entries.retain(|f| f.id != id);
    }

    pub fn has_processing(&self) -> bool {
        self.entries
            .iter()
            .any(|f| f.status == FileStatus::Processing)
    }

    pub fn errored(&self) -> Vec<&ProcessedFile> {
        self.entries
            .iter()
            .filter(|f| f.status == FileStatus::Error)
            .collect()
    }

    /// Drains the tray, returning only successfully processed files. The
    /// caller is expected to have confirmed proceeding when [`errored`] is
    /// non-empty.
    ///
    /// [`errored`]: AttachmentTray::errored
    pub fn take_ready(&mut self) -> Vec<ProcessedFile> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .filter(|f| f.status == FileStatus::Processed)
            .collect()
    }

    /// Admits up to the attachment cap from `selections` and processes the
    /// admitted files concurrently, applying each outcome by id as it
    /// lands. Returns the number of selections dropped by the cap.
    pub async fn ingest_batch(
        &mut self,
        ingestor: &FileIngestor,
        selections: Vec<SelectedFile>,
    ) -> Result<usize> {
        let mut admitted = Vec::new();
        let mut dropped = 0usize;
        for file in selections {
            match self.admit(&file.name, &file.mime_type, file.bytes.len() as u64) {
                Some(id) => admitted.push((id, file)),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(
                "Attachment cap of {} reached; {} selection(s) dropped",
                MAX_ATTACHMENTS, dropped
            );
        }

        let jobs = admitted.into_iter().map(|(id, file)| async move {
            let outcome = ingestor
                .process_bytes(file.name, file.mime_type, file.bytes)
                .await;
            (id, outcome)
        });
        for (id, outcome) in join_all(jobs).await {
            self.resolve(&id, outcome);
        }
        Ok(dropped)
    }
}
