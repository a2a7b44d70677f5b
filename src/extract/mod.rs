//! Signal extraction and field resolution for upstream documents.
//!
//! JSON upstreams go through [`schema`], HTML upstreams through [`html`]; both
//! feed [`resolve`], which turns whatever was found into an oEmbed descriptor.

pub mod html;
pub mod resolve;
pub mod schema;

pub use html::{collect_html_signals, stream_html_signals, HtmlSignals, MetaSignals};
pub use resolve::{resolve, Candidate, Sources, PRECEDENCE};
pub use schema::{parse_json_ld, parse_upstream_json, PageType};
