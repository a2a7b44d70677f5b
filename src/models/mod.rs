use axum::http::{header, HeaderMap, Method, Uri};
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

// ============================================================================
// Request Models
// ============================================================================

/// The parts of an incoming request the validator looks at.
///
/// `url` stays optional so a missing parameter can be told apart from one
/// that does not parse.
#[derive(Debug, Clone)]
pub struct TargetRequest {
    pub method: Method,
    /// Host the caller addressed, from an absolute-form URI or the `Host`
    /// header, port included.
    pub host: Option<String>,
    /// First `url` query parameter, percent-decoded.
    pub url: Option<String>,
}

impl TargetRequest {
    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let host = uri.host().map(str::to_string).or_else(|| {
            headers
                .get(header::HOST)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        });

        let url = uri.query().and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "url")
                .map(|(_, value)| value.into_owned())
        });

        TargetRequest {
            method: method.clone(),
            host,
            url,
        }
    }
}

// ============================================================================
// Response Models
// ============================================================================

pub const OEMBED_TYPE: &str = "link";
pub const OEMBED_VERSION: &str = "1.0";

/// Optional fields of the descriptor filled in by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorField {
    Title,
    ProviderName,
    AuthorName,
}

/// oEmbed `link` descriptor returned on success.
///
/// Optional fields hold the candidate's JSON value as found, normally a
/// string. They are omitted from the output when unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OEmbedDescriptor {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<Value>,
}

impl Default for OEmbedDescriptor {
    fn default() -> Self {
        OEmbedDescriptor {
            kind: OEMBED_TYPE,
            version: OEMBED_VERSION,
            title: None,
            provider_name: None,
            author_name: None,
        }
    }
}

impl OEmbedDescriptor {
    fn slot_mut(&mut self, field: DescriptorField) -> &mut Option<Value> {
        match field {
            DescriptorField::Title => &mut self.title,
            DescriptorField::ProviderName => &mut self.provider_name,
            DescriptorField::AuthorName => &mut self.author_name,
        }
    }

    /// Write `value` into `field` unless the field already holds a value.
    /// Returns whether the write happened.
    pub fn set_if_unset(&mut self, field: DescriptorField, value: Value) -> bool {
        let slot = self.slot_mut(field);
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }
}
