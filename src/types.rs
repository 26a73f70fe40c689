//! Core types for weread-export

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A loosely-typed scalar from the remote API
///
/// Ratings, chapter identifiers and a few other fields arrive as numbers from
/// some endpoints and as strings from others.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Numeric value (integer or float)
    Number(serde_json::Number),
    /// Text value
    Text(String),
}

impl Scalar {
    /// Empty text, used where an absent value must still occupy a field
    pub fn empty() -> Self {
        Scalar::Text(String::new())
    }

    /// True for empty text and for numeric zero
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Number(n) => n.as_f64() == Some(0.0),
            Scalar::Text(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

/// One highlight, with its attached review and the book context it came from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    /// Book the highlight belongs to
    pub book_id: String,
    /// Book title
    pub title: String,
    /// Book author
    pub author: Option<String>,
    /// Normalized cover URL
    pub cover_url: Option<String>,
    /// Rating as reported by the service
    pub rating: Option<Scalar>,
    /// Publisher
    pub publisher: Option<String>,
    /// ISBN
    pub isbn: Option<String>,
    /// Chapter identifier
    pub chapter_uid: Option<Scalar>,
    /// Chapter title (empty when the chapter is unknown)
    pub chapter_title: String,
    /// Text range within the chapter
    pub range: String,
    /// Highlighted text
    pub mark_text: String,
    /// Review attached to the same chapter and range
    pub review_text: Option<String>,
    /// Creation time (unix seconds)
    pub created_at: Option<i64>,
    /// Highlight style code
    pub style: Option<i64>,
    /// Total reading time in seconds
    pub reading_time: Option<i64>,
    /// Time reading started (unix seconds)
    pub start_time: Option<i64>,
    /// Time reading finished (unix seconds)
    pub finish_time: Option<i64>,
}

/// One book's full export
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedBook {
    /// Book identifier
    pub book_id: String,
    /// Book title
    pub title: String,
    /// Rendered Markdown body (with cover line when a cover exists)
    pub markdown: String,
    /// Normalized cover URL
    pub cover_url: Option<String>,
    /// Author
    pub author: Option<String>,
    /// Rating
    pub rating: Option<Scalar>,
    /// Publisher
    pub publisher: Option<String>,
    /// ISBN
    pub isbn: Option<String>,
    /// Highlights in source order
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
    /// Time reading finished (unix seconds)
    pub finish_time: Option<i64>,
    /// Time reading started (unix seconds)
    pub start_time: Option<i64>,
    /// Total reading time in seconds
    pub reading_time: Option<i64>,
}

/// Target format of an export
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Markdown document
    Markdown,
    /// Pretty-printed JSON array of note rows
    Json,
    /// CSV with one note per line
    Csv,
}

impl ExportFormat {
    /// File name used for combined exports
    pub fn combined_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "weread-export.md",
            ExportFormat::Json => "weread-export.json",
            ExportFormat::Csv => "weread-export.csv",
        }
    }

    /// MIME type of the payload
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown;charset=utf-8",
            ExportFormat::Json => "application/json;charset=utf-8",
            ExportFormat::Csv => "text/csv;charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A ready-to-write export: what a download sink receives
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    /// Suggested file name
    pub file_name: String,
    /// File content
    pub content: String,
    /// MIME type including charset
    pub mime_type: String,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_accepts_numbers_and_strings() {
        let n: Scalar = serde_json::from_str("95").unwrap();
        let s: Scalar = serde_json::from_str("\"8.5\"").unwrap();
        assert_eq!(n, Scalar::from(95));
        assert_eq!(s, Scalar::from("8.5"));
        assert_eq!(n.to_string(), "95");
        assert_eq!(s.to_string(), "8.5");
    }

    #[test]
    fn scalar_blankness_matches_empty_and_zero() {
        assert!(Scalar::empty().is_blank());
        assert!(Scalar::from(0).is_blank());
        assert!(!Scalar::from(3).is_blank());
        assert!(!Scalar::from("0").is_blank());
    }

    #[test]
    fn export_format_parses_known_names() {
        assert_eq!("markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
    }

    #[test]
    fn export_format_rejects_unknown_names() {
        let err = "xml".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref f) if f == "xml"));
    }

    #[test]
    fn export_format_names_and_mime_types() {
        assert_eq!(ExportFormat::Json.combined_file_name(), "weread-export.json");
        assert_eq!(ExportFormat::Csv.mime_type(), "text/csv;charset=utf-8");
        assert_eq!(ExportFormat::Markdown.to_string(), "markdown");
    }

    #[test]
    fn exported_book_deserializes_without_notes() {
        let book: ExportedBook = serde_json::from_str(
            r#"{"bookId":"1","title":"T","markdown":"m","coverUrl":null,"author":null,
                "rating":null,"publisher":null,"isbn":null,"finishTime":null,
                "startTime":null,"readingTime":null}"#,
        )
        .unwrap();
        assert!(book.notes.is_empty());
        assert_eq!(book.title, "T");
    }
}
