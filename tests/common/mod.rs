// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tower::ServiceExt;
use url::form_urlencoded;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use oembed_resolver::{config::DEFAULT_USER_AGENT, handlers, state::AppState};

/// Host every upstream mock server binds to.
pub const MOCK_HOST: &str = "127.0.0.1";

/// Build the application router the way `main` does, minus metrics.
pub fn create_test_app() -> Router {
    let state = AppState::new(DEFAULT_USER_AGENT).expect("Failed to build HTTP client");
    Router::new()
        .route("/health", get(handlers::health_check))
        .fallback(handlers::oembed::resolve_oembed)
        .with_state(state)
}

/// `/?url=<target>` with the target percent-encoded.
pub fn oembed_uri(target: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("/?url={encoded}")
}

// ── Request helpers ──────────────────────────────────────────────────────────

/// Status, headers and body text of a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body is not JSON")
    }
}

pub async fn request(app: Router, method: Method, uri: &str, host: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(host) = host {
        builder = builder.header(header::HOST, host);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn get_from(app: Router, uri: &str, host: &str) -> TestResponse {
    request(app, Method::GET, uri, Some(host)).await
}

/// GET the resolver for `target` as a caller addressing the mock host.
pub async fn resolve(target: &str) -> TestResponse {
    get_from(create_test_app(), &oembed_uri(target), MOCK_HOST).await
}

async fn send(app: Router, req: Request<Body>) -> TestResponse {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

// ── Upstream helpers ─────────────────────────────────────────────────────────

/// Start an upstream that serves `body` at `route` with the given status and
/// content type. Returns the server (keep it alive) and the full page URL.
pub async fn serve(route: &str, status: u16, content_type: &str, body: &str) -> (MockServer, String) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body.to_owned(), content_type))
        .mount(&server)
        .await;
    let url = format!("{}{}", server.uri(), route);
    (server, url)
}

pub async fn serve_html(body: &str) -> (MockServer, String) {
    serve("/page", 200, "text/html; charset=utf-8", body).await
}

pub async fn serve_json(body: &str) -> (MockServer, String) {
    serve("/page.json", 200, "application/json", body).await
}

// ── Log capture ──────────────────────────────────────────────────────────────

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's logs into a fresh buffer until the guard is dropped.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
