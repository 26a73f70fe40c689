//! Book aggregator: fetch the four per-book sources, merge them and retry as a unit.
//!
//! Every attempt re-fetches all four sources concurrently; the first failure
//! fails the attempt. Retry bookkeeping stays inside [`BookExporter::export_book`]
//! and only the final error reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::batch::batch_run;
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{Error, RequestError, Result};
use crate::retry::with_retry;
use crate::types::ExportedBook;

mod merge;
mod render;
#[allow(missing_docs)]
pub mod sources;

pub use merge::normalize_cover_url;
pub use render::{MarkdownRenderer, TextRenderer};

use merge::{build_book_meta, build_note_records};
use sources::{InfoData, MarkData, ProgressData, RenderSources, ReviewData};

/// Fixed query of the review endpoint: own reviews only, paging disabled
const REVIEW_LIST_QUERY: [(&str, &str); 6] = [
    ("mine", "1"),
    ("listType", "11"),
    ("maxIdx", "0"),
    ("count", "0"),
    ("listMode", "2"),
    ("synckey", "0"),
];

/// URLs of the four sources for one book
#[derive(Clone, Debug)]
struct BookEndpoints {
    bookmarks: Url,
    reviews: Url,
    progress: Url,
    info: Url,
}

impl BookEndpoints {
    fn new(client: &ApiClient, book_id: &str, user_vid: &str) -> Result<Self> {
        let mut review_query = vec![("bookId", book_id)];
        review_query.extend(REVIEW_LIST_QUERY);
        review_query.push(("userVid", user_vid));

        Ok(Self {
            bookmarks: client.endpoint("/web/book/bookmarklist", &[("bookId", book_id)])?,
            reviews: client.endpoint("/web/review/list", &review_query)?,
            progress: client.endpoint("/web/book/getProgress", &[("bookId", book_id)])?,
            info: client.endpoint("/web/book/info", &[("bookId", book_id)])?,
        })
    }
}

/// Raw responses of one successful attempt
struct FetchedSources {
    marks: MarkData,
    reviews: ReviewData,
    progress: ProgressData,
    info: InfoData,
}

/// Exports books from the reading service
///
/// Cheap to clone; clones share the HTTP connection pool.
///
/// # Example
///
/// ```no_run
/// use weread_export::{BookExporter, Config, ExportFormat, build_combined_export};
///
/// # async fn example() -> weread_export::Result<()> {
/// let mut config = Config::default();
/// config.api.user_vid = "12345".to_string();
/// let exporter = BookExporter::new(config)?;
///
/// let outcomes = exporter.export_books(vec!["book-1".to_string()]).await;
/// let books: Vec<_> = outcomes.into_iter().filter_map(|(_, r)| r.ok()).collect();
/// let payload = build_combined_export(&books, ExportFormat::Csv)?;
/// println!("{}", payload.file_name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BookExporter {
    client: ApiClient,
    config: Arc<Config>,
    renderer: Arc<dyn TextRenderer>,
}

impl std::fmt::Debug for BookExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookExporter")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BookExporter {
    /// Create an exporter with the default Markdown renderer
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = ApiClient::new(&config.api)?;
        Ok(Self {
            client,
            config: Arc::new(config),
            renderer: Arc::new(MarkdownRenderer),
        })
    }

    /// Replace the text renderer used for document bodies
    pub fn with_renderer(mut self, renderer: impl TextRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Export one book, retrying the whole four-request group per `retry_delays`
    ///
    /// One retry is allowed per delay entry and only for retryable failures
    /// (HTTP 429, 5xx, or no response). A non-retryable failure is returned at once.
    pub async fn export_book(
        &self,
        book_id: &str,
        user_vid: &str,
        retry_delays: &[Duration],
    ) -> Result<ExportedBook> {
        let endpoints = BookEndpoints::new(&self.client, book_id, user_vid)?;

        let sources = with_retry(retry_delays, || self.fetch_sources(&endpoints))
            .await
            .map_err(|e| {
                tracing::warn!(book_id, error = %e, "Book export failed");
                Error::Request(e)
            })?;

        let book = self.assemble(book_id, &sources);
        tracing::debug!(book_id, notes = book.notes.len(), "Book exported");
        Ok(book)
    }

    /// Export one book using the configured user and retry delays
    pub async fn export_configured(&self, book_id: &str) -> Result<ExportedBook> {
        self.export_book(book_id, &self.config.api.user_vid, &self.config.retry.delays)
            .await
    }

    /// Export many books through the batch runner
    ///
    /// Outcomes are returned in input order, one per book id, failures included.
    pub async fn export_books<I>(&self, book_ids: I) -> Vec<(String, Result<ExportedBook>)>
    where
        I: IntoIterator<Item = String>,
    {
        let book_ids: Vec<String> = book_ids.into_iter().collect();
        let total = book_ids.len();
        tracing::info!(
            books = total,
            concurrency = self.config.batch.concurrency,
            "Starting batch export"
        );

        let outcomes = batch_run(book_ids, self.config.batch, |book_id| async move {
            let result = self.export_configured(&book_id).await;
            (book_id, result)
        })
        .await;

        let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
        tracing::info!(
            books = total,
            succeeded = total - failed,
            failed,
            "Batch export finished"
        );
        outcomes
    }

    async fn fetch_sources(
        &self,
        endpoints: &BookEndpoints,
    ) -> std::result::Result<FetchedSources, RequestError> {
        let (marks, reviews, progress, info) = tokio::try_join!(
            self.client.get_json::<MarkData>(endpoints.bookmarks.clone()),
            self.client.get_json::<ReviewData>(endpoints.reviews.clone()),
            self.client.get_json::<ProgressData>(endpoints.progress.clone()),
            self.client.get_json::<InfoData>(endpoints.info.clone()),
        )?;
        Ok(FetchedSources {
            marks,
            reviews,
            progress,
            info,
        })
    }

    fn assemble(&self, book_id: &str, sources: &FetchedSources) -> ExportedBook {
        let meta = build_book_meta(book_id, sources.marks.book.as_ref(), Some(&sources.info));
        let notes = build_note_records(&sources.marks, &sources.reviews, &sources.progress, &meta);

        let body = self.renderer.render(RenderSources {
            marks: &sources.marks,
            reviews: &sources.reviews,
            progress: &sources.progress,
        });
        let markdown = match &meta.cover_url {
            Some(cover) => format!("![{} 封面]({cover})\n\n{body}", meta.title),
            None => body,
        };

        let progress = sources.progress.progress();
        ExportedBook {
            book_id: book_id.to_string(),
            title: meta.title,
            markdown,
            cover_url: meta.cover_url,
            author: meta.author,
            rating: Some(meta.rating),
            publisher: Some(meta.publisher),
            isbn: Some(meta.isbn),
            notes,
            finish_time: progress.finish_time,
            start_time: progress.start_reading_time,
            reading_time: progress.reading_time,
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
