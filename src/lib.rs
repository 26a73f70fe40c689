//! # weread-export
//!
//! Library for exporting WeRead highlights, reviews and reading progress.
//!
//! ## Design Philosophy
//!
//! weread-export is designed to be:
//! - **Tolerant** - Sparse or partially missing responses fall back instead of failing
//! - **Sensible defaults** - Sequential exports with a short pause and three retries
//! - **Library-first** - No CLI or UI; payloads are handed to a sink of your choice
//!
//! ## Quick Start
//!
//! ```no_run
//! use weread_export::{BookExporter, Config, ExportFormat, FileSink};
//! use weread_export::sink::download_combined_export;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.api.user_vid = "12345".to_string();
//!     config.batch.concurrency = 2;
//!
//!     let exporter = BookExporter::new(config)?;
//!     let outcomes = exporter
//!         .export_books(vec!["book-1".to_string(), "book-2".to_string()])
//!         .await;
//!
//!     let mut books = Vec::new();
//!     for (book_id, outcome) in outcomes {
//!         match outcome {
//!             Ok(book) => books.push(book),
//!             Err(e) => eprintln!("{book_id}: {e}"),
//!         }
//!     }
//!
//!     let sink = FileSink::from_config(&exporter.config().output);
//!     let path = download_combined_export(&sink, &books, ExportFormat::Json).await?;
//!     println!("wrote {}", path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Bounded-concurrency batch runner
pub mod batch;
/// HTTP request client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Per-book fetching, merging and rendering
pub mod exporter;
/// Combined Markdown, JSON and CSV exports
pub mod formatter;
/// Retry logic with per-attempt delays
pub mod retry;
/// Output sinks for payloads
pub mod sink;
/// Core data types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use batch::batch_run;
pub use client::ApiClient;
pub use config::{ApiConfig, BatchConfig, Config, FileCollisionAction, OutputConfig, RetryConfig};
pub use error::{Error, RequestError, Result};
pub use exporter::{BookExporter, MarkdownRenderer, TextRenderer, normalize_cover_url};
pub use formatter::{ExportRow, build_combined_export, build_combined_export_named, export_rows};
pub use retry::{IsRetryable, RetryState, with_retry};
pub use sink::{ClipboardWriter, ExportSink, FileSink};
pub use types::{ExportFormat, ExportPayload, ExportedBook, NoteRecord, Scalar};
