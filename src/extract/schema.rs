use std::str::FromStr;

use serde_json::Value;
use strum::EnumString;

use crate::error::{AppError, AppResult};

/// schema.org types that describe a page's content.
///
/// Identity nodes such as `WebSite`, `Organization` or `Person` are left out
/// so a content node is always preferred when an upstream returns a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum PageType {
    Article,
    BlogPosting,
    ImageGallery,
    Recipe,
    TechArticle,
    WebPage,
}

impl PageType {
    /// Returns `true` if `node` carries a string `@type` on the allow-list.
    pub fn matches(node: &Value) -> bool {
        node.get("@type")
            .and_then(Value::as_str)
            .is_some_and(|t| PageType::from_str(t).is_ok())
    }
}

/// Pick the node to use from an array of schema.org nodes: the last one in
/// document order whose type is on the allow-list.
pub fn select_last_page_node(nodes: Vec<Value>) -> Option<Value> {
    nodes.into_iter().filter(PageType::matches).last()
}

/// Structured data carried by a JSON upstream body.
///
/// A single value is used as-is; an array is narrowed with
/// [`select_last_page_node`].
pub fn structured_data_from_json(value: Value) -> Option<Value> {
    match value {
        Value::Array(nodes) => select_last_page_node(nodes),
        other => Some(other),
    }
}

/// Parse an `application/json` upstream body into structured data.
pub fn parse_upstream_json(body: &[u8]) -> AppResult<Option<Value>> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| AppError::UpstreamJson(e.to_string()))?;
    Ok(structured_data_from_json(value))
}

/// Parse the concatenated JSON-LD text of an HTML page.
///
/// The parsed value is used directly, arrays included; no allow-list
/// narrowing happens on this path. Empty input means the page had no JSON-LD.
pub fn parse_json_ld(raw: &str) -> AppResult<Option<Value>> {
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw).map(Some).map_err(AppError::JsonLd)
}
