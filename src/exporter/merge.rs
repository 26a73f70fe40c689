//! Merge step: combine the four sources into book metadata and note records
//!
//! Metadata precedence (the mark source's embedded book wins over the info
//! endpoint on every key it carries, including keys set to `null`):
//!
//! | field     | resolution                                                    |
//! |-----------|---------------------------------------------------------------|
//! | title     | mark.title, info.title, book id (empty strings skipped)       |
//! | author    | merged author                                                 |
//! | cover     | merged cover                                                  |
//! | rating    | rating, score, newRating, star, ratingDetail.recent, ""       |
//! | isbn      | isbn, isbn13, "" (empty strings skipped)                      |
//! | publisher | publisher, publish, "" (empty strings skipped)                |

use std::collections::HashMap;

use super::sources::{
    BookSource, Chapter, Field, HIGHLIGHT_TYPE, MarkData, ProgressData, RANGE_REVIEW_TYPE,
    RatingDetail, ReviewData, value,
};
use crate::types::{NoteRecord, Scalar};

/// Merged book metadata, alive only while one export is assembled
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BookMeta {
    pub book_id: String,
    pub title: String,
    pub author: Option<String>,
    pub cover_url: Option<String>,
    pub rating: Scalar,
    pub isbn: String,
    pub publisher: String,
}

/// Book keys after the shallow right-biased merge
struct Combined {
    author: Option<String>,
    cover: Option<String>,
    rating: Option<Scalar>,
    score: Option<Scalar>,
    new_rating: Option<Scalar>,
    star: Option<Scalar>,
    rating_detail: Option<RatingDetail>,
    isbn: Option<String>,
    isbn13: Option<String>,
    publisher: Option<String>,
    publish: Option<String>,
}

/// A key present in `mark` wins even when it is `null`
fn pick<T: Clone>(mark: &Field<T>, info: &Field<T>) -> Option<T> {
    match mark {
        Some(set) => set.clone(),
        None => info.clone().flatten(),
    }
}

fn overlay(info: &BookSource, mark: &BookSource) -> Combined {
    Combined {
        author: pick(&mark.author, &info.author),
        cover: pick(&mark.cover, &info.cover),
        rating: pick(&mark.rating, &info.rating),
        score: pick(&mark.score, &info.score),
        new_rating: pick(&mark.new_rating, &info.new_rating),
        star: pick(&mark.star, &info.star),
        rating_detail: pick(&mark.rating_detail, &info.rating_detail),
        isbn: pick(&mark.isbn, &info.isbn),
        isbn13: pick(&mark.isbn13, &info.isbn13),
        publisher: pick(&mark.publisher, &info.publisher),
        publish: pick(&mark.publish, &info.publish),
    }
}

fn non_empty(value: Option<&String>) -> Option<&String> {
    value.filter(|s| !s.is_empty())
}

pub(crate) fn build_book_meta(
    book_id: &str,
    mark: Option<&BookSource>,
    info: Option<&BookSource>,
) -> BookMeta {
    let empty = BookSource::default();
    let mark = mark.unwrap_or(&empty);
    let info = info.unwrap_or(&empty);
    let combined = overlay(info, mark);

    let title = non_empty(value(&mark.title))
        .or_else(|| non_empty(value(&info.title)))
        .cloned()
        .unwrap_or_else(|| book_id.to_string());

    let rating = combined
        .rating
        .or(combined.score)
        .or(combined.new_rating)
        .or(combined.star)
        .or_else(|| combined.rating_detail.and_then(|d| d.recent))
        .unwrap_or_else(Scalar::empty);

    let isbn = non_empty(combined.isbn.as_ref())
        .or_else(|| non_empty(combined.isbn13.as_ref()))
        .cloned()
        .unwrap_or_default();

    let publisher = non_empty(combined.publisher.as_ref())
        .or_else(|| non_empty(combined.publish.as_ref()))
        .cloned()
        .unwrap_or_default();

    BookMeta {
        book_id: book_id.to_string(),
        title,
        author: combined.author,
        cover_url: normalize_cover_url(combined.cover.as_deref()),
        rating,
        isbn,
        publisher,
    }
}

/// Swap the small-thumbnail marker `s_` for the `t6_` size
///
/// Applied once while merging; export formatting uses the stored value as-is.
pub fn normalize_cover_url(raw: Option<&str>) -> Option<String> {
    match raw {
        Some(url) if !url.is_empty() => Some(url.replace("s_", "t6_")),
        _ => None,
    }
}

pub(crate) fn merge_key(chapter_uid: Option<&Scalar>, range: &str) -> String {
    match chapter_uid {
        Some(uid) => format!("{uid}-{range}"),
        None => format!("-{range}"),
    }
}

/// Index range-anchored reviews by `chapterUid-range`; later entries overwrite earlier ones
pub(crate) fn build_review_map(reviews: &ReviewData) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for review in reviews.reviews() {
        if review.kind != Some(RANGE_REVIEW_TYPE) {
            continue;
        }
        let Some(range) = review.range.as_deref().filter(|r| !r.is_empty()) else {
            continue;
        };
        let text = non_empty(review.content.as_ref())
            .or_else(|| non_empty(review.abstract_text.as_ref()))
            .cloned()
            .unwrap_or_default();
        map.insert(merge_key(review.chapter_uid.as_ref(), range), text);
    }
    map
}

pub(crate) fn find_chapter_title<'a>(
    chapters: impl IntoIterator<Item = &'a Chapter>,
    chapter_uid: Option<&Scalar>,
) -> String {
    let Some(uid) = chapter_uid else {
        return String::new();
    };
    chapters
        .into_iter()
        .find(|c| c.chapter_uid.as_ref() == Some(uid))
        .and_then(|c| c.title.clone())
        .unwrap_or_default()
}

/// One record per highlight-type bookmark, in bookmark order
pub(crate) fn build_note_records(
    marks: &MarkData,
    reviews: &ReviewData,
    progress: &ProgressData,
    meta: &BookMeta,
) -> Vec<NoteRecord> {
    let progress = progress.progress();
    let review_map = build_review_map(reviews);

    marks
        .bookmarks()
        .filter(|mark| mark.kind == Some(HIGHLIGHT_TYPE))
        .map(|mark| {
            let range = mark.range.clone().unwrap_or_default();
            let key = merge_key(mark.chapter_uid.as_ref(), &range);
            NoteRecord {
                book_id: non_empty(mark.book_id.as_ref())
                    .cloned()
                    .unwrap_or_else(|| meta.book_id.clone()),
                title: meta.title.clone(),
                author: meta.author.clone(),
                cover_url: meta.cover_url.clone(),
                rating: Some(meta.rating.clone()),
                publisher: Some(meta.publisher.clone()),
                isbn: Some(meta.isbn.clone()),
                chapter_uid: mark.chapter_uid.clone(),
                chapter_title: find_chapter_title(marks.chapters(), mark.chapter_uid.as_ref()),
                mark_text: non_empty(mark.mark_text.as_ref())
                    .or_else(|| non_empty(mark.abstract_text.as_ref()))
                    .cloned()
                    .unwrap_or_default(),
                review_text: review_map.get(&key).filter(|t| !t.is_empty()).cloned(),
                range,
                created_at: mark.create_time,
                style: mark.style,
                reading_time: progress.reading_time,
                start_time: progress.start_reading_time,
                finish_time: progress.finish_time,
            }
        })
        .collect()
}
