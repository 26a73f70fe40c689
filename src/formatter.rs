//! Export formatter: turn exported books into Markdown, JSON or CSV payloads
//!
//! Books are ordered by finish time, most recent first (missing = 0), keeping
//! input order among equals. JSON and CSV share one row shape: a row per note,
//! or a single row carrying the document body for a book without notes.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{ExportFormat, ExportPayload, ExportedBook, NoteRecord, Scalar};
use crate::utils::sanitize_file_name;

/// CSV column order
pub const CSV_HEADER: [&str; 16] = [
    "bookId",
    "title",
    "author",
    "rating",
    "isbn",
    "publisher",
    "coverUrl",
    "chapterUid",
    "chapterTitle",
    "range",
    "markText",
    "reviewText",
    "createdAt",
    "readingTime",
    "startTime",
    "finishTime",
];

const MARKDOWN_SEPARATOR: &str = "\n\n---\n\n";

/// A book with its reading-session times resolved (book value, else first note, else 0)
struct SortedBook<'a> {
    book: &'a ExportedBook,
    finish_time: i64,
    start_time: i64,
    reading_time: i64,
}

impl<'a> SortedBook<'a> {
    fn new(book: &'a ExportedBook) -> Self {
        let first = book.notes.first();
        let resolve = |own: Option<i64>, from_note: fn(&NoteRecord) -> Option<i64>| {
            own.or_else(|| first.and_then(from_note)).unwrap_or(0)
        };
        Self {
            book,
            finish_time: resolve(book.finish_time, |n| n.finish_time),
            start_time: resolve(book.start_time, |n| n.start_time),
            reading_time: resolve(book.reading_time, |n| n.reading_time),
        }
    }
}

fn sort_books(items: &[ExportedBook]) -> Vec<SortedBook<'_>> {
    let mut sorted: Vec<SortedBook<'_>> = items.iter().map(SortedBook::new).collect();
    // stable: equal finish times keep input order
    sorted.sort_by(|a, b| b.finish_time.cmp(&a.finish_time));
    sorted
}

/// One flattened line of a JSON or CSV export
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    /// Book identifier
    pub book_id: String,
    /// Book title
    pub title: String,
    /// Author
    pub author: String,
    /// Rating
    pub rating: Scalar,
    /// Publisher
    pub publisher: String,
    /// Cover URL
    pub cover_url: String,
    /// ISBN
    pub isbn: String,
    /// Chapter identifier
    pub chapter_uid: Scalar,
    /// Chapter title
    pub chapter_title: String,
    /// Text range
    pub range: String,
    /// Highlighted text, or the document body for a book without notes
    pub mark_text: String,
    /// Attached review
    pub review_text: String,
    /// Creation time
    pub created_at: Scalar,
    /// Reading time
    pub reading_time: Scalar,
    /// Reading start time
    pub start_time: Scalar,
    /// Reading finish time
    pub finish_time: Scalar,
}

impl ExportRow {
    fn fields(&self) -> [String; 16] {
        [
            self.book_id.clone(),
            self.title.clone(),
            self.author.clone(),
            self.rating.to_string(),
            self.isbn.clone(),
            self.publisher.clone(),
            self.cover_url.clone(),
            self.chapter_uid.to_string(),
            self.chapter_title.clone(),
            self.range.clone(),
            self.mark_text.clone(),
            self.review_text.clone(),
            self.created_at.to_string(),
            self.reading_time.to_string(),
            self.start_time.to_string(),
            self.finish_time.to_string(),
        ]
    }
}

/// First non-empty string, else empty
fn text(candidates: &[Option<&String>]) -> String {
    candidates
        .iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// First non-zero timestamp, else empty
fn time(candidates: &[Option<i64>]) -> Scalar {
    candidates
        .iter()
        .flatten()
        .find(|t| **t != 0)
        .map(|t| Scalar::from(*t))
        .unwrap_or_else(Scalar::empty)
}

fn note_row(item: &SortedBook<'_>, note: &NoteRecord) -> ExportRow {
    let book = item.book;
    ExportRow {
        book_id: text(&[Some(&note.book_id), Some(&book.book_id)]),
        title: book.title.clone(),
        author: text(&[book.author.as_ref()]),
        rating: book_rating(book),
        publisher: text(&[note.publisher.as_ref(), book.publisher.as_ref()]),
        cover_url: text(&[note.cover_url.as_ref(), book.cover_url.as_ref()]),
        isbn: text(&[note.isbn.as_ref(), book.isbn.as_ref()]),
        chapter_uid: note.chapter_uid.clone().unwrap_or_else(Scalar::empty),
        chapter_title: note.chapter_title.clone(),
        range: note.range.clone(),
        mark_text: note.mark_text.clone(),
        review_text: text(&[note.review_text.as_ref()]),
        created_at: time(&[note.created_at]),
        reading_time: time(&[note.reading_time, Some(item.reading_time)]),
        start_time: time(&[note.start_time, Some(item.start_time)]),
        finish_time: time(&[note.finish_time, Some(item.finish_time)]),
    }
}

/// Stand-in row for a book with no notes: the document body becomes the text
fn book_row(item: &SortedBook<'_>) -> ExportRow {
    let book = item.book;
    ExportRow {
        book_id: book.book_id.clone(),
        title: book.title.clone(),
        author: text(&[book.author.as_ref()]),
        rating: book_rating(book),
        publisher: text(&[book.publisher.as_ref()]),
        cover_url: text(&[book.cover_url.as_ref()]),
        isbn: text(&[book.isbn.as_ref()]),
        chapter_uid: Scalar::empty(),
        chapter_title: String::new(),
        range: String::new(),
        mark_text: book.markdown.clone(),
        review_text: String::new(),
        created_at: Scalar::empty(),
        reading_time: time(&[Some(item.reading_time)]),
        start_time: time(&[Some(item.start_time)]),
        finish_time: time(&[Some(item.finish_time)]),
    }
}

fn book_rating(book: &ExportedBook) -> Scalar {
    book.rating
        .clone()
        .filter(|r| !r.is_blank())
        .unwrap_or_else(Scalar::empty)
}

/// Flatten books into rows, most recently finished first
pub fn export_rows(items: &[ExportedBook]) -> Vec<ExportRow> {
    sort_books(items)
        .iter()
        .flat_map(|item| {
            if item.book.notes.is_empty() {
                vec![book_row(item)]
            } else {
                item.book
                    .notes
                    .iter()
                    .map(|note| note_row(item, note))
                    .collect()
            }
        })
        .collect()
}

/// Build the combined payload for `items` in `format`
///
/// Output is deterministic: the same input always yields byte-identical content.
/// Format names are validated when parsed into [`ExportFormat`], which rejects
/// anything but `markdown`, `json` and `csv` with [`Error::UnsupportedFormat`].
pub fn build_combined_export(items: &[ExportedBook], format: ExportFormat) -> Result<ExportPayload> {
    let content = match format {
        ExportFormat::Markdown => combined_markdown(items),
        ExportFormat::Json => serde_json::to_string_pretty(&export_rows(items))?,
        ExportFormat::Csv => rows_to_csv(&export_rows(items))?,
    };
    tracing::debug!(
        books = items.len(),
        format = %format,
        bytes = content.len(),
        "Built combined export"
    );
    Ok(ExportPayload {
        file_name: format.combined_file_name().to_string(),
        content,
        mime_type: format.mime_type().to_string(),
    })
}

/// Parse `format` and build the combined payload
pub fn build_combined_export_named(items: &[ExportedBook], format: &str) -> Result<ExportPayload> {
    build_combined_export(items, format.parse()?)
}

/// Payload for a single book's Markdown, named after its sanitized title
pub fn single_book_markdown(title: &str, markdown: &str) -> ExportPayload {
    ExportPayload {
        file_name: format!("{}.md", sanitize_file_name(title)),
        content: markdown.to_string(),
        mime_type: ExportFormat::Markdown.mime_type().to_string(),
    }
}

fn combined_markdown(items: &[ExportedBook]) -> String {
    sort_books(items)
        .iter()
        .map(|item| format!("# {}\n\n{}", item.book.title, item.book.markdown))
        .collect::<Vec<_>>()
        .join(MARKDOWN_SEPARATOR)
}

/// Keep each record on one physical line
fn escape_line_breaks(value: &str) -> String {
    value.replace("\r\n", "\\n").replace('\n', "\\n")
}

fn rows_to_csv(rows: &[ExportRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row.fields().iter().map(|f| escape_line_breaks(f)))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    let body = String::from_utf8(body)
        .map_err(|e| Error::Other(format!("CSV output is not UTF-8: {e}")))?;

    let mut content = CSV_HEADER.join(",");
    if !body.is_empty() {
        content.push('\n');
        content.push_str(body.trim_end_matches('\n'));
    }
    Ok(content)
}
