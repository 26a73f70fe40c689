//! Mock WeRead endpoints and canned responses

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Canned responses for one book
#[derive(Clone, Debug)]
pub struct BookFixture {
    pub book_id: String,
    pub marks: Value,
    pub reviews: Value,
    pub progress: Value,
    pub info: Value,
}

impl BookFixture {
    /// A book with one highlighted, reviewed passage per chapter title given
    pub fn new(book_id: &str, title: &str, finish_time: i64, chapters: &[&str]) -> Self {
        let chapter_list: Vec<Value> = chapters
            .iter()
            .enumerate()
            .map(|(i, name)| json!({"chapterUid": i + 1, "chapterIdx": i + 1, "title": name}))
            .collect();
        let marks: Vec<Value> = chapters
            .iter()
            .enumerate()
            .map(|(i, name)| {
                json!({
                    "bookId": book_id,
                    "chapterUid": i + 1,
                    "type": 1,
                    "range": format!("{}-{}", i * 10, i * 10 + 5),
                    "markText": format!("{name} highlight"),
                    "createTime": finish_time - 100 + i as i64
                })
            })
            .collect();
        let reviews: Vec<Value> = chapters
            .iter()
            .enumerate()
            .map(|(i, name)| {
                json!({"review": {
                    "chapterUid": i + 1,
                    "type": 1,
                    "range": format!("{}-{}", i * 10, i * 10 + 5),
                    "content": format!("thoughts on {name}")
                }})
            })
            .collect();

        Self {
            book_id: book_id.to_string(),
            marks: json!({
                "book": {"title": title, "author": "Author", "cover": "https://cdn.example/s_1.jpg"},
                "chapters": chapter_list,
                "updated": marks
            }),
            reviews: json!({"reviews": reviews}),
            progress: json!({"book": {
                "progress": 100,
                "readingTime": 3600,
                "startReadingTime": finish_time - 86400,
                "finishTime": finish_time
            }}),
            info: json!({"title": title, "isbn": "978-0", "publisher": "Press", "newRating": 812}),
        }
    }

    /// Mount all four endpoints for this book, matched on its id
    pub async fn mount(&self, server: &MockServer) {
        for (endpoint, body) in [
            ("/web/book/bookmarklist", &self.marks),
            ("/web/review/list", &self.reviews),
            ("/web/book/getProgress", &self.progress),
            ("/web/book/info", &self.info),
        ] {
            Mock::given(method("GET"))
                .and(path(endpoint))
                .and(query_param("bookId", self.book_id.as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
                .mount(server)
                .await;
        }
    }
}

/// Make every request for `book_id` to `endpoint` answer with `status`
pub async fn mount_failure(server: &MockServer, book_id: &str, endpoint: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .and(query_param("bookId", book_id))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
