//! Output boundary: where finished payloads go
//!
//! The rest of the crate only builds [`ExportPayload`]s; writing them is the
//! job of an [`ExportSink`] (file downloads) or a [`ClipboardWriter`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::{FileCollisionAction, OutputConfig};
use crate::error::{Error, Result};
use crate::formatter::{build_combined_export, single_book_markdown};
use crate::types::{ExportFormat, ExportPayload, ExportedBook};
use crate::utils::get_unique_path;

/// Destination for export payloads
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Write one payload, returning where it ended up
    async fn write(&self, payload: &ExportPayload) -> Result<PathBuf>;
}

/// Writes payloads as files inside one directory
#[derive(Clone, Debug)]
pub struct FileSink {
    directory: PathBuf,
    collision: FileCollisionAction,
}

impl FileSink {
    /// Sink writing into `directory` (created on first write)
    pub fn new(directory: impl Into<PathBuf>, collision: FileCollisionAction) -> Self {
        Self {
            directory: directory.into(),
            collision,
        }
    }

    /// Sink described by the output section of the configuration
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.directory.clone(), config.file_collision)
    }

    /// Target directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[async_trait]
impl ExportSink for FileSink {
    async fn write(&self, payload: &ExportPayload) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = get_unique_path(&self.directory.join(&payload.file_name), self.collision)?;
        tokio::fs::write(&path, payload.content.as_bytes()).await?;
        tracing::info!(
            path = %path.display(),
            bytes = payload.content.len(),
            mime_type = %payload.mime_type,
            "Export written"
        );
        Ok(path)
    }
}

/// Platform clipboard
#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    /// Replace the clipboard contents with `text`
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Copy Markdown to the clipboard, failing when no clipboard is available
pub async fn copy_markdown(clipboard: Option<&dyn ClipboardWriter>, markdown: &str) -> Result<()> {
    let clipboard = clipboard.ok_or(Error::ClipboardUnavailable)?;
    clipboard.write_text(markdown).await
}

/// Write a single book's Markdown as `{sanitized title}.md`
pub async fn download_markdown_file(
    sink: &dyn ExportSink,
    title: &str,
    markdown: &str,
) -> Result<PathBuf> {
    sink.write(&single_book_markdown(title, markdown)).await
}

/// Build the combined export for `items` and write it through `sink`
pub async fn download_combined_export(
    sink: &dyn ExportSink,
    items: &[ExportedBook],
    format: ExportFormat,
) -> Result<PathBuf> {
    let payload = build_combined_export(items, format)?;
    sink.write(&payload).await
}
