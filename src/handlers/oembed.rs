use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::Instrument;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::extract::{
    parse_json_ld, parse_upstream_json, resolve, stream_html_signals, MetaSignals, Sources,
};
use crate::models::TargetRequest;
use crate::state::AppState;

const JSON_MEDIA_TYPE: &str = "application/json";

// ── Validation ─────────────────────────────────────────────────────────────

/// Host name of a `host[:port]` authority, lowercased, port dropped.
fn authority_host(authority: &str) -> Option<String> {
    Url::parse(&format!("http://{authority}"))
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Check the incoming request and return the target URL it names.
///
/// Checks run in order and the first failure is returned. Host names are
/// compared case-insensitively and without ports.
pub fn validate_request(req: &TargetRequest) -> AppResult<Url> {
    if req.method != Method::GET {
        return Err(AppError::MethodNotAllowed);
    }

    let raw = req.url.as_deref().ok_or(AppError::MissingUrl)?;

    let target = Url::parse(raw).map_err(|_| AppError::InvalidUrl)?;
    let target_host = target.host_str().ok_or(AppError::InvalidUrl)?;

    let request_host = req.host.as_deref().and_then(authority_host);
    match request_host {
        Some(host) if host.eq_ignore_ascii_case(target_host) => Ok(target),
        _ => Err(AppError::HostMismatch),
    }
}

/// Reject targets that ask for an oEmbed format other than JSON.
pub fn check_format(target: &Url) -> AppResult<()> {
    let format = target
        .query_pairs()
        .find(|(key, _)| key == "format")
        .map(|(_, value)| value);

    match format {
        Some(value) if value != "json" => Err(AppError::UnsupportedFormat),
        _ => Ok(()),
    }
}

// ── Upstream ───────────────────────────────────────────────────────────────

/// Returns `true` if the upstream declared a JSON body.
///
/// Only the media type is compared, case-insensitively; parameters such as
/// `charset` are ignored. This is deliberately looser than an exact match on
/// the header value, which would send `application/json; charset=utf-8`
/// bodies down the HTML path.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

fn hop_by_hop_headers() -> [HeaderName; 8] {
    [
        header::CONNECTION,
        header::TRANSFER_ENCODING,
        header::TE,
        header::TRAILER,
        header::UPGRADE,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        HeaderName::from_static("keep-alive"),
    ]
}

/// Hand an unsuccessful upstream response back to the caller untouched,
/// apart from connection-level headers.
pub fn forward_upstream(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    for name in hop_by_hop_headers() {
        headers.remove(name);
    }

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

// ── Handler ────────────────────────────────────────────────────────────────

/// `GET <any path>?url=<absolute-url>`
///
/// Fetches `url` (which must be on the same host as the request) and returns
/// an oEmbed `link` descriptor built from its JSON-LD, meta tags and title.
/// Upstream failures are passed through as-is. Everything logged while
/// handling the request, error responses included, carries the target URL.
pub async fn resolve_oembed(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let request = TargetRequest::from_parts(&method, &uri, &headers);
    let span = tracing::info_span!("oembed", url = request.url.as_deref().unwrap_or_default());

    let result = resolve_target(&state, &request)
        .instrument(span.clone())
        .await;
    span.in_scope(|| result.unwrap_or_else(IntoResponse::into_response))
}

async fn resolve_target(state: &AppState, request: &TargetRequest) -> AppResult<Response> {
    let target = validate_request(request)?;
    check_format(&target)?;

    let upstream = state
        .http_client
        .get(target)
        .send()
        .await
        .map_err(AppError::UpstreamFetch)?;

    let status = upstream.status();
    if !status.is_success() {
        tracing::info!(
            "-> {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        return Ok(forward_upstream(upstream));
    }

    let (schema, meta) = if is_json_content_type(upstream.headers()) {
        let body = upstream
            .bytes()
            .await
            .map_err(|e| AppError::UpstreamJson(e.to_string()))?;
        (parse_upstream_json(&body)?, MetaSignals::default())
    } else {
        let signals = stream_html_signals(upstream.bytes_stream()).await?;
        (parse_json_ld(&signals.json_ld)?, signals.meta)
    };

    let descriptor = resolve(&Sources {
        schema: schema.as_ref(),
        meta: &meta,
    });
    tracing::debug!(title = ?descriptor.title, "Resolved oEmbed descriptor");

    Ok(Json(descriptor).into_response())
}

// ── Unit tests ─────────────────────────────────────────────────────────────
