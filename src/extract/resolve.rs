use serde_json::Value;

use crate::extract::MetaSignals;
use crate::models::{DescriptorField, OEmbedDescriptor};

/// Signals available to the resolver for one upstream document.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub schema: Option<&'a Value>,
    pub meta: &'a MetaSignals,
}

/// One place a descriptor field can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// Top-level key of the structured-data object.
    Schema(&'static str),
    /// `<meta property=…>`, e.g. Open Graph.
    MetaProperty(&'static str),
    /// `<meta name=…>`.
    MetaName(&'static str),
    /// `<meta itemprop=…>` microdata.
    MetaItemprop(&'static str),
    /// Text of `<head><title>`.
    DocumentTitle,
}

impl Candidate {
    /// The candidate's value, or `None` when it is absent. JSON `null` counts
    /// as absent; an empty string does not.
    pub fn lookup(&self, sources: &Sources<'_>) -> Option<Value> {
        match *self {
            Candidate::Schema(key) => sources
                .schema
                .and_then(|schema| schema.get(key))
                .filter(|value| !value.is_null())
                .cloned(),
            Candidate::MetaProperty(key) => sources.meta.property(key).map(Value::from),
            Candidate::MetaName(key) => sources.meta.name(key).map(Value::from),
            Candidate::MetaItemprop(key) => sources.meta.itemprop(key).map(Value::from),
            Candidate::DocumentTitle => sources.meta.title.as_deref().map(Value::from),
        }
    }
}

/// Fields the resolver fills in, each with its candidates in priority order.
pub const PRECEDENCE: &[(DescriptorField, &[Candidate])] = &[
    (
        DescriptorField::Title,
        &[
            Candidate::Schema("headline"),
            Candidate::Schema("name"),
            Candidate::MetaProperty("og:title"),
            Candidate::MetaName("twitter:title"),
            Candidate::MetaItemprop("name"),
            Candidate::DocumentTitle,
        ],
    ),
    (
        DescriptorField::ProviderName,
        &[Candidate::MetaName("application-name")],
    ),
    (
        DescriptorField::AuthorName,
        &[Candidate::MetaName("publisher")],
    ),
];

/// First defined value among `candidates`.
pub fn resolve_field(candidates: &[Candidate], sources: &Sources<'_>) -> Option<Value> {
    candidates
        .iter()
        .find_map(|candidate| candidate.lookup(sources))
}

/// Build the descriptor for `sources` using [`PRECEDENCE`].
pub fn resolve(sources: &Sources<'_>) -> OEmbedDescriptor {
    let mut descriptor = OEmbedDescriptor::default();
    for (field, candidates) in PRECEDENCE {
        if let Some(value) = resolve_field(candidates, sources) {
            descriptor.set_if_unset(*field, value);
        }
    }
    descriptor
}
