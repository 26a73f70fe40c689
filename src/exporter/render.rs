//! Markdown rendering of a book's raw sources

use std::collections::HashMap;
use std::fmt::Write;

use super::merge::{build_review_map, merge_key};
use super::sources::{Bookmark, HIGHLIGHT_TYPE, RANGE_REVIEW_TYPE, RenderSources, Review, value};

/// Turns a book's mark, review and progress sources into a Markdown body
pub trait TextRenderer: Send + Sync {
    /// Render the body; must be a pure function of `sources`
    fn render(&self, sources: RenderSources<'_>) -> String;
}

/// Default renderer: book header, reading summary, then highlights grouped by chapter
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownRenderer;

impl TextRenderer for MarkdownRenderer {
    fn render(&self, sources: RenderSources<'_>) -> String {
        let mut out = String::new();
        let book = sources.marks.book.clone().unwrap_or_default();

        if let Some(title) = value(&book.title).filter(|t| !t.is_empty()) {
            let _ = writeln!(out, "## {title}\n");
        }
        if let Some(author) = value(&book.author).filter(|a| !a.is_empty()) {
            let _ = writeln!(out, "作者: {author}\n");
        }

        let progress = sources.progress.progress();
        if let Some(secs) = progress.reading_time.filter(|s| *s > 0) {
            let _ = writeln!(out, "阅读时长: {}\n", format_reading_time(secs));
        }
        if let Some(percent) = progress.progress.filter(|p| *p > 0) {
            let _ = writeln!(out, "阅读进度: {percent}%\n");
        }

        let reviews = build_review_map(sources.reviews);
        let highlights: Vec<&Bookmark> = sources
            .marks
            .bookmarks()
            .filter(|m| m.kind == Some(HIGHLIGHT_TYPE))
            .collect();

        for (heading, marks) in group_by_chapter(&sources, &highlights) {
            if !heading.is_empty() {
                let _ = writeln!(out, "### {heading}\n");
            }
            for mark in marks {
                write_highlight(&mut out, mark, &reviews);
            }
        }

        let standalone: Vec<&str> = sources
            .reviews
            .reviews()
            .filter(|r| !is_anchored(r))
            .filter_map(|r| r.content.as_deref().filter(|c| !c.trim().is_empty()))
            .collect();
        if !standalone.is_empty() {
            let _ = writeln!(out, "### 书评\n");
            for content in standalone {
                let _ = writeln!(out, "{}\n", content.trim());
            }
        }

        out.trim_end().to_string()
    }
}

/// Chapters in table-of-contents order, followed by highlights whose chapter is unknown
fn group_by_chapter<'a>(
    sources: &RenderSources<'_>,
    highlights: &[&'a Bookmark],
) -> Vec<(String, Vec<&'a Bookmark>)> {
    let mut groups: Vec<(String, Vec<&'a Bookmark>)> = Vec::new();
    let mut placed = vec![false; highlights.len()];

    for chapter in sources.marks.chapters() {
        let Some(uid) = chapter.chapter_uid.as_ref() else {
            continue;
        };
        let marks: Vec<&Bookmark> = highlights
            .iter()
            .enumerate()
            .filter(|(_, m)| m.chapter_uid.as_ref() == Some(uid))
            .map(|(i, m)| {
                placed[i] = true;
                *m
            })
            .collect();
        if !marks.is_empty() {
            groups.push((chapter.title.clone().unwrap_or_default(), marks));
        }
    }

    let rest: Vec<&Bookmark> = highlights
        .iter()
        .zip(&placed)
        .filter(|(_, placed)| !**placed)
        .map(|(m, _)| *m)
        .collect();
    if !rest.is_empty() {
        groups.push((String::new(), rest));
    }
    groups
}

/// Reviews attached to a highlighted range are rendered with that highlight
fn is_anchored(review: &Review) -> bool {
    review.kind == Some(RANGE_REVIEW_TYPE) && review.range.as_deref().is_some_and(|r| !r.is_empty())
}

fn write_highlight(out: &mut String, mark: &Bookmark, reviews: &HashMap<String, String>) {
    let text = mark
        .mark_text
        .as_deref()
        .filter(|t| !t.is_empty())
        .or(mark.abstract_text.as_deref())
        .unwrap_or_default();
    for line in text.lines() {
        let _ = writeln!(out, "> {line}");
    }
    out.push('\n');

    let range = mark.range.as_deref().unwrap_or_default();
    let key = merge_key(mark.chapter_uid.as_ref(), range);
    if let Some(review) = reviews.get(&key).filter(|r| !r.is_empty()) {
        let _ = writeln!(out, "想法: {review}\n");
    }
}

fn format_reading_time(secs: i64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    match (hours, minutes) {
        (0, m) => format!("{m}分钟"),
        (h, 0) => format!("{h}小时"),
        (h, m) => format!("{h}小时{m}分钟"),
    }
}
