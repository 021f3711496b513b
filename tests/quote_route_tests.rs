use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use quoteboard::config::DatabaseConfig;
use quoteboard::db::{self, DbActorHandle, ListOrder, NewQuote, Quote, QuoteStore};
use quoteboard::error::StoreError;
use quoteboard::server::router::{BoardState, RouterOptions, board_router};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

const PAGE_SIZE: u32 = 2;

struct TestApp {
    app: Router,
    store: DbActorHandle,
    path: PathBuf,
}

impl TestApp {
    async fn new(tag: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();

        let mut path = std::env::temp_dir();
        path.push(format!(
            "quoteboard-route-{tag}-{}-{}.sqlite",
            std::process::id(),
            nanos
        ));

        let cfg = DatabaseConfig::with_url(format!("sqlite:{}", path.display()));
        let store = db::spawn(&cfg).await.expect("failed to spawn DbActor");
        let app = app_with(Arc::new(store.clone()));
        Self { app, store, path }
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        send(&self.app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, form: &'static str) -> (StatusCode, String) {
        send(
            &self.app,
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.store.shutdown();
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

fn app_with(store: Arc<dyn QuoteStore>) -> Router {
    board_router(
        BoardState::new(store, PAGE_SIZE),
        &RouterOptions {
            static_dir: Path::new("static"),
            request_timeout: Duration::from_secs(5),
        },
    )
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn insert(store: &DbActorHandle, text: &str, minute: u32) -> i64 {
    use chrono::TimeZone;
    store
        .create(NewQuote {
            text: text.to_string(),
            comment: None,
            submitted_at: chrono::Utc
                .with_ymd_and_hms(2024, 6, 1, 8, minute, 0)
                .unwrap(),
            source_address: "198.51.100.1:1234".to_string(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn add_quote_normalizes_newlines_and_redirects() {
    let t = TestApp::new("add").await;

    let (status, _) = t
        .post_form("/add", "quote=line+one%0Aline+two&comment=%3Cb%3Enice%3C%2Fb%3E")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let stored = t.store.list_by_recency(1, 10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text, "line one<br />line two");
    assert_eq!(stored[0].comment.as_deref(), Some("<b>nice</b>"));
    assert_eq!(stored[0].source_address, "unknown");

    let (status, body) = t.get(&format!("/quote/{}", stored[0].id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("line one<br>line two"));
    assert!(body.contains("&lt;b&gt;nice&lt;/b&gt;"));
}

#[tokio::test]
async fn add_quote_rejects_blank_text_and_wrong_method() {
    let t = TestApp::new("add-bad").await;

    let (status, _) = t.post_form("/add", "quote=++&comment=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.get("/add").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    assert!(t.store.list_by_recency(1, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_escapes_markup_and_pages() {
    let t = TestApp::new("list").await;
    insert(&t.store, "<script>alert(1)</script>", 1).await;
    insert(&t.store, "second", 2).await;
    insert(&t.store, "third", 3).await;

    let (status, body) = t.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("third"));
    assert!(body.contains("second"));
    assert!(!body.contains("alert(1)"));
    assert!(body.contains("href=\"/?page=2\""));
    assert!(!body.contains("rel=\"prev\""));

    let (status, body) = t.get("/?page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!body.contains("<script>alert"));
    assert!(body.contains("href=\"/?page=1\""));
    assert!(!body.contains("rel=\"next\""));

    let (_, garbage_page) = t.get("/?page=abc").await;
    let (_, first_page) = t.get("/").await;
    assert_eq!(garbage_page, first_page);
}

#[tokio::test]
async fn top_lists_highest_score_first() {
    let t = TestApp::new("top").await;
    let low = insert(&t.store, "low", 1).await;
    let high = insert(&t.store, "high", 2).await;
    t.store.upvote(high).await.unwrap();
    t.store.downvote(low).await.unwrap();

    let (status, body) = t.get("/top").await;
    assert_eq!(status, StatusCode::OK);
    let high_at = body.find("<blockquote>high</blockquote>").unwrap();
    let low_at = body.find("<blockquote>low</blockquote>").unwrap();
    assert!(high_at < low_at);
}

#[tokio::test]
async fn view_handles_bad_and_missing_ids() {
    let t = TestApp::new("view").await;

    let (status, _) = t.get("/quote/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.get("/quote/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn random_is_not_found_until_a_quote_exists() {
    let t = TestApp::new("random").await;

    let (status, _) = t.get("/random").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    insert(&t.store, "the only one", 5).await;
    let (status, body) = t.get("/random").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("the only one"));
}

#[tokio::test]
async fn vote_returns_updated_card() {
    let t = TestApp::new("vote").await;
    let id = insert(&t.store, "vote target", 1).await;

    let (status, body) = t.get(&format!("/vote?id={id}&type=up")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&format!("id=\"quote-{id}\"")));
    assert!(body.contains("title=\"1 votes\">1</span>"));

    let (status, body) = t.get(&format!("/vote?id={id}&type=down")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("title=\"2 votes\">0</span>"));
}

#[tokio::test]
async fn vote_validates_before_touching_the_store() {
    let t = TestApp::new("vote-bad").await;
    let id = insert(&t.store, "guarded", 1).await;

    for uri in [
        format!("/vote?id={id}&type=sideways"),
        format!("/vote?id={id}"),
        "/vote?id=abc&type=up".to_string(),
    ] {
        let (status, _) = t.get(&uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }

    let q = t.store.get_by_id(id).await.unwrap();
    assert_eq!(q.vote_count, 0);

    let (status, _) = t.get("/vote?id=424242&type=up").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_paths_are_not_found_and_request_id_is_reflected() {
    let t = TestApp::new("fallback").await;

    let resp = t
        .app
        .clone()
        .oneshot(
            Request::get("/nope")
                .header("x-request-id", "abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()["x-request-id"], "abc123");
}

/// Store double whose every call fails the way a dropped database connection would.
struct UnavailableStore;

#[async_trait]
impl QuoteStore for UnavailableStore {
    async fn create(&self, _quote: NewQuote) -> Result<i64, StoreError> {
        Err(StoreError::WriteFailure("database is gone".into()))
    }

    async fn get_by_id(&self, _id: i64) -> Result<Quote, StoreError> {
        Err(StoreError::ReadFailure("database is gone".into()))
    }

    async fn list(
        &self,
        _order: ListOrder,
        _page: i64,
        _page_size: u32,
    ) -> Result<Vec<Quote>, StoreError> {
        Err(StoreError::ReadFailure("database is gone".into()))
    }

    async fn pick_random(&self) -> Result<Quote, StoreError> {
        Err(StoreError::ReadFailure("database is gone".into()))
    }

    async fn upvote(&self, _id: i64) -> Result<(), StoreError> {
        Err(StoreError::WriteFailure("database is gone".into()))
    }

    async fn downvote(&self, _id: i64) -> Result<(), StoreError> {
        Err(StoreError::WriteFailure("database is gone".into()))
    }
}

#[tokio::test]
async fn store_failures_map_to_internal_error() {
    let app = app_with(Arc::new(UnavailableStore));

    for uri in ["/", "/top", "/random", "/quote/1", "/vote?id=1&type=up"] {
        let (status, body) = send(&app, Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert!(!body.contains("database is gone"));
    }

    let (status, _) = send(
        &app,
        Request::post("/add")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("quote=hi"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

struct StalledStore;

#[async_trait]
impl QuoteStore for StalledStore {
    async fn create(&self, _quote: NewQuote) -> Result<i64, StoreError> {
        std::future::pending().await
    }

    async fn get_by_id(&self, _id: i64) -> Result<Quote, StoreError> {
        std::future::pending().await
    }

    async fn list(
        &self,
        _order: ListOrder,
        _page: i64,
        _page_size: u32,
    ) -> Result<Vec<Quote>, StoreError> {
        std::future::pending().await
    }

    async fn pick_random(&self) -> Result<Quote, StoreError> {
        std::future::pending().await
    }

    async fn upvote(&self, _id: i64) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn downvote(&self, _id: i64) -> Result<(), StoreError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn slow_requests_time_out_with_408() {
    let app = board_router(
        BoardState::new(Arc::new(StalledStore), PAGE_SIZE),
        &RouterOptions {
            static_dir: Path::new("static"),
            request_timeout: Duration::from_millis(50),
        },
    );

    let (status, _) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
}
