//! Response shapes of the four per-book endpoints
//!
//! Every field is optional: the service omits keys freely and the exporter
//! falls back rather than failing on a sparse response.

use serde::{Deserialize, Deserializer};

use crate::types::Scalar;

/// Bookmark type code for user highlights
pub const HIGHLIGHT_TYPE: i64 = 1;

/// Review type code for reviews anchored to a highlighted range
pub const RANGE_REVIEW_TYPE: i64 = 1;

/// A response key that is absent (`None`), explicitly `null` (`Some(None)`) or set
pub type Field<T> = Option<Option<T>>;

/// Value of a key that is present and not `null`
pub fn value<T>(field: &Field<T>) -> Option<&T> {
    field.as_ref().and_then(Option::as_ref)
}

fn present<'de, D, T>(deserializer: D) -> Result<Field<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Book metadata as embedded in the bookmark list or returned by the info endpoint
///
/// Keys keep their presence so a `null` in one source can mask the other.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSource {
    #[serde(default, deserialize_with = "present")]
    pub title: Field<String>,
    #[serde(default, deserialize_with = "present")]
    pub author: Field<String>,
    #[serde(default, deserialize_with = "present")]
    pub cover: Field<String>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Field<Scalar>,
    #[serde(default, deserialize_with = "present")]
    pub score: Field<Scalar>,
    #[serde(default, deserialize_with = "present")]
    pub new_rating: Field<Scalar>,
    #[serde(default, deserialize_with = "present")]
    pub star: Field<Scalar>,
    #[serde(default, deserialize_with = "present")]
    pub rating_detail: Field<RatingDetail>,
    #[serde(default, deserialize_with = "present")]
    pub isbn: Field<String>,
    #[serde(default, deserialize_with = "present")]
    pub isbn13: Field<String>,
    #[serde(default, deserialize_with = "present")]
    pub publisher: Field<String>,
    #[serde(default, deserialize_with = "present")]
    pub publish: Field<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RatingDetail {
    pub recent: Option<Scalar>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub chapter_uid: Option<Scalar>,
    pub chapter_idx: Option<i64>,
    pub title: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub book_id: Option<String>,
    pub chapter_uid: Option<Scalar>,
    #[serde(rename = "type")]
    pub kind: Option<i64>,
    pub range: Option<String>,
    pub mark_text: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub create_time: Option<i64>,
    pub style: Option<i64>,
}

/// `/web/book/bookmarklist`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MarkData {
    pub book: Option<BookSource>,
    pub chapters: Option<Vec<Option<Chapter>>>,
    pub updated: Option<Vec<Option<Bookmark>>>,
}

impl MarkData {
    /// Chapters in table-of-contents order; `null` entries are skipped
    pub fn chapters(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.iter().flatten().flatten()
    }

    /// Bookmarks in response order; `null` entries are skipped
    pub fn bookmarks(&self) -> impl Iterator<Item = &Bookmark> {
        self.updated.iter().flatten().flatten()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub chapter_uid: Option<Scalar>,
    #[serde(rename = "type")]
    pub kind: Option<i64>,
    pub range: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub create_time: Option<i64>,
}

/// One entry of the review list: either `{ "review": {...} }` or the review inline
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ReviewEntry {
    pub review: Option<Review>,
    #[serde(flatten)]
    pub inline: Review,
}

impl ReviewEntry {
    pub fn review(&self) -> &Review {
        self.review.as_ref().unwrap_or(&self.inline)
    }
}

/// `/web/review/list`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ReviewData {
    pub reviews: Option<Vec<Option<ReviewEntry>>>,
}

impl ReviewData {
    /// Reviews in response order; `null` entries are skipped
    pub fn reviews(&self) -> impl Iterator<Item = &Review> {
        self.reviews.iter().flatten().flatten().map(ReviewEntry::review)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub progress: Option<i64>,
    pub reading_time: Option<i64>,
    pub start_reading_time: Option<i64>,
    pub finish_time: Option<i64>,
}

/// `/web/book/getProgress`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ProgressData {
    pub book: Option<Progress>,
}

impl ProgressData {
    pub fn progress(&self) -> Progress {
        self.book.clone().unwrap_or_default()
    }
}

/// `/web/book/info` is a bare [`BookSource`]
pub type InfoData = BookSource;

/// The three sources handed to the text renderer
#[derive(Clone, Copy, Debug)]
pub struct RenderSources<'a> {
    pub marks: &'a MarkData,
    pub reviews: &'a ReviewData,
    pub progress: &'a ProgressData,
}
