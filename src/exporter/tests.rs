use super::*;
use crate::config::{BatchConfig, RetryConfig};
use crate::types::Scalar;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOOK_ID: &str = "b1";
const USER_VID: &str = "vid-1";

fn marks() -> Value {
    json!({
        "book": {
            "title": "Test Book",
            "author": "Ann",
            "cover": "https://img.example/s_cover.jpg"
        },
        "chapters": [
            {"chapterUid": 1, "chapterIdx": 1, "title": "Ch1"},
            {"chapterUid": 2, "chapterIdx": 2, "title": "Ch2"}
        ],
        "updated": [
            {"bookId": BOOK_ID, "chapterUid": 1, "type": 1, "range": "10-20",
             "markText": "highlight one", "createTime": 1700000000},
            {"bookId": BOOK_ID, "chapterUid": 2, "type": 0, "range": "1-2",
             "markText": "bookmark only"}
        ]
    })
}

fn reviews() -> Value {
    json!({
        "reviews": [
            {"review": {"chapterUid": 1, "type": 1, "range": "10-20",
                        "content": "my note", "abstract": "quoted text"}}
        ]
    })
}

fn progress() -> Value {
    json!({
        "book": {
            "progress": 50,
            "readingTime": 5400,
            "startReadingTime": 1690000000,
            "finishTime": 1700000500
        }
    })
}

fn info() -> Value {
    json!({"title": "Info Title", "isbn": "978-1", "publisher": "Pub", "rating": 4.5})
}

async fn mount_ok(server: &MockServer, endpoint: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_book(server: &MockServer, marks: Value, info: Value) {
    mount_ok(server, "/web/book/bookmarklist", marks).await;
    mount_ok(server, "/web/review/list", reviews()).await;
    mount_ok(server, "/web/book/getProgress", progress()).await;
    mount_ok(server, "/web/book/info", info).await;
}

fn exporter_for(server: &MockServer) -> BookExporter {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.user_vid = USER_VID.to_string();
    config.retry = RetryConfig::none();
    config.batch = BatchConfig {
        concurrency: 2,
        delay: Duration::ZERO,
    };
    BookExporter::new(config).unwrap()
}

async fn requests_to(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == endpoint)
        .count()
}

#[tokio::test]
async fn exports_merged_book_from_four_sources() {
    let server = MockServer::start().await;
    mount_book(&server, marks(), info()).await;

    let book = exporter_for(&server)
        .export_book(BOOK_ID, USER_VID, &[])
        .await
        .unwrap();

    assert_eq!(book.book_id, BOOK_ID);
    assert_eq!(book.title, "Test Book");
    assert_eq!(book.author.as_deref(), Some("Ann"));
    assert_eq!(
        book.cover_url.as_deref(),
        Some("https://img.example/t6_cover.jpg")
    );
    assert!(
        book.markdown
            .starts_with("![Test Book 封面](https://img.example/t6_cover.jpg)\n\n"),
        "markdown should open with the cover line: {}",
        book.markdown
    );
    assert!(book.markdown.contains("### Ch1"));
    assert!(book.markdown.contains("highlight one"));
    assert_eq!(book.isbn.as_deref(), Some("978-1"));
    assert_eq!(book.publisher.as_deref(), Some("Pub"));
    assert_eq!(book.rating.as_ref().map(ToString::to_string).as_deref(), Some("4.5"));
    assert_eq!(book.finish_time, Some(1700000500));
    assert_eq!(book.start_time, Some(1690000000));
    assert_eq!(book.reading_time, Some(5400));

    assert_eq!(book.notes.len(), 1, "only highlights become notes");
    let note = &book.notes[0];
    assert_eq!(note.chapter_title, "Ch1");
    assert_eq!(note.mark_text, "highlight one");
    assert_eq!(note.review_text.as_deref(), Some("my note"));
    assert_eq!(note.created_at, Some(1700000000));

    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn review_request_carries_user_and_fixed_query() {
    let server = MockServer::start().await;
    mount_ok(&server, "/web/book/bookmarklist", marks()).await;
    mount_ok(&server, "/web/book/getProgress", progress()).await;
    mount_ok(&server, "/web/book/info", info()).await;
    Mock::given(method("GET"))
        .and(path("/web/review/list"))
        .and(query_param("bookId", BOOK_ID))
        .and(query_param("userVid", "someone"))
        .and(query_param("mine", "1"))
        .and(query_param("listType", "11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reviews()))
        .expect(1)
        .mount(&server)
        .await;

    exporter_for(&server)
        .export_book(BOOK_ID, "someone", &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn retries_group_after_server_error() {
    let server = MockServer::start().await;
    // first mounted mock wins until exhausted; the delay lets the other three land first
    Mock::given(method("GET"))
        .and(path("/web/book/bookmarklist"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(200)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_book(&server, marks(), info()).await;

    let book = exporter_for(&server)
        .export_book(BOOK_ID, USER_VID, &[Duration::ZERO])
        .await
        .unwrap();

    assert_eq!(book.title, "Test Book");
    for endpoint in [
        "/web/book/bookmarklist",
        "/web/review/list",
        "/web/book/getProgress",
        "/web/book/info",
    ] {
        assert_eq!(
            requests_to(&server, endpoint).await,
            2,
            "{endpoint} should be fetched once per attempt"
        );
    }
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;
    mount_ok(&server, "/web/book/bookmarklist", marks()).await;
    mount_ok(&server, "/web/review/list", reviews()).await;
    mount_ok(&server, "/web/book/getProgress", progress()).await;
    Mock::given(method("GET"))
        .and(path("/web/book/info"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = exporter_for(&server)
        .export_book(BOOK_ID, USER_VID, &[Duration::ZERO, Duration::ZERO])
        .await
        .unwrap_err();

    match err {
        Error::Request(e) => {
            assert_eq!(e.status(), Some(404));
            assert!(!e.should_retry());
        }
        other => panic!("expected request error, got {other:?}"),
    }
}

#[tokio::test]
async fn retryable_failure_stops_after_one_attempt_per_delay_plus_one() {
    let server = MockServer::start().await;
    mount_ok(&server, "/web/book/bookmarklist", marks()).await;
    mount_ok(&server, "/web/review/list", reviews()).await;
    mount_ok(&server, "/web/book/getProgress", progress()).await;
    Mock::given(method("GET"))
        .and(path("/web/book/info"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = exporter_for(&server)
        .export_book(BOOK_ID, USER_VID, &[Duration::ZERO, Duration::ZERO])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Request(ref e) if e.status() == Some(503) && e.should_retry()));
}

#[tokio::test]
async fn rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/web/book/getProgress"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_book(&server, marks(), info()).await;

    let book = exporter_for(&server)
        .export_book(BOOK_ID, USER_VID, &[Duration::ZERO])
        .await
        .unwrap();
    assert_eq!(book.reading_time, Some(5400));
}

#[tokio::test]
async fn malformed_body_counts_as_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/web/book/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .expect(2)
        .mount(&server)
        .await;
    mount_ok(&server, "/web/book/bookmarklist", marks()).await;
    mount_ok(&server, "/web/review/list", reviews()).await;
    mount_ok(&server, "/web/book/getProgress", progress()).await;

    let err = exporter_for(&server)
        .export_book(BOOK_ID, USER_VID, &[Duration::ZERO])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Request(ref e) if e.status().is_none() && e.should_retry()));
}

#[tokio::test]
async fn null_list_entries_are_skipped_without_retrying() {
    let server = MockServer::start().await;
    let mut marks = marks();
    marks["updated"]
        .as_array_mut()
        .unwrap()
        .insert(0, Value::Null);
    mount_ok(&server, "/web/book/bookmarklist", marks).await;
    mount_ok(
        &server,
        "/web/review/list",
        json!({"reviews": [
            null,
            {"review": {"chapterUid": 1, "type": 1, "range": "10-20", "content": "my note"}}
        ]}),
    )
    .await;
    mount_ok(&server, "/web/book/getProgress", progress()).await;
    mount_ok(&server, "/web/book/info", info()).await;

    let book = exporter_for(&server)
        .export_book(BOOK_ID, USER_VID, &[Duration::ZERO])
        .await
        .unwrap();

    assert_eq!(book.notes.len(), 1);
    assert_eq!(book.notes[0].mark_text, "highlight one");
    assert_eq!(book.notes[0].review_text.as_deref(), Some("my note"));
    assert_eq!(requests_to(&server, "/web/review/list").await, 1);
    assert_eq!(requests_to(&server, "/web/book/bookmarklist").await, 1);
}

#[tokio::test]
async fn null_mark_key_masks_info_value() {
    let server = MockServer::start().await;
    let mut marks = marks();
    marks["book"]["cover"] = Value::Null;
    marks["book"]["rating"] = Value::Null;
    marks["book"]["score"] = json!(7);
    let mut info = info();
    info["cover"] = json!("https://img.example/s_info.png");
    mount_book(&server, marks, info).await;

    let book = exporter_for(&server)
        .export_book(BOOK_ID, USER_VID, &[])
        .await
        .unwrap();

    assert_eq!(book.cover_url, None);
    assert_eq!(book.rating, Some(Scalar::from(7)));
}

#[tokio::test]
async fn missing_cover_leaves_markdown_unprefixed() {
    let server = MockServer::start().await;
    let mut marks = marks();
    marks["book"]["cover"] = Value::Null;
    mount_book(&server, marks, info()).await;

    let book = exporter_for(&server)
        .export_book(BOOK_ID, USER_VID, &[])
        .await
        .unwrap();

    assert_eq!(book.cover_url, None);
    assert!(book.markdown.starts_with("## Test Book"));
}

#[tokio::test]
async fn title_falls_back_to_book_id() {
    let server = MockServer::start().await;
    mount_book(&server, json!({}), json!({})).await;

    let book = exporter_for(&server)
        .export_book(BOOK_ID, USER_VID, &[])
        .await
        .unwrap();

    assert_eq!(book.title, BOOK_ID);
    assert!(book.notes.is_empty());
    assert_eq!(book.isbn.as_deref(), Some(""));
    assert_eq!(book.rating.as_ref().map(ToString::to_string).as_deref(), Some(""));
}

#[tokio::test]
async fn custom_renderer_supplies_body() {
    struct Fixed;
    impl TextRenderer for Fixed {
        fn render(&self, _sources: RenderSources<'_>) -> String {
            "body".to_string()
        }
    }

    let server = MockServer::start().await;
    mount_book(&server, marks(), info()).await;

    let book = exporter_for(&server)
        .with_renderer(Fixed)
        .export_book(BOOK_ID, USER_VID, &[])
        .await
        .unwrap();

    assert_eq!(
        book.markdown,
        "![Test Book 封面](https://img.example/t6_cover.jpg)\n\nbody"
    );
}

#[tokio::test]
async fn export_books_reports_every_outcome_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/web/book/info"))
        .and(query_param("bookId", "missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_book(&server, marks(), info()).await;

    let outcomes = exporter_for(&server)
        .export_books(vec![
            "a".to_string(),
            "missing".to_string(),
            "c".to_string(),
        ])
        .await;

    let ids: Vec<&str> = outcomes.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, ["a", "missing", "c"]);
    assert!(outcomes[0].1.is_ok());
    assert!(outcomes[1].1.is_err());
    assert_eq!(outcomes[2].1.as_ref().unwrap().book_id, "c");
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = Config::default();
    config.batch.concurrency = 0;
    assert!(matches!(
        BookExporter::new(config),
        Err(Error::Config { .. })
    ));
}
