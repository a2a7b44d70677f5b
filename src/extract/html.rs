use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use lol_html::errors::RewritingError;
use lol_html::send::{HtmlRewriter, Settings};
use lol_html::{element, text};

use crate::error::{AppError, AppResult};

const TITLE: &str = "head title";
const META_NAME: &str = "head meta[name]";
const META_PROPERTY: &str = "head meta[property]";
const META_ITEMPROP: &str = "head meta[itemprop]";
const JSON_LD: &str = r#"head script[type="application/ld+json"]"#;

/// Attribute value -> `content` attribute. A meta tag without `content`
/// still records its key, mapped to `None`.
pub type MetaMap = HashMap<String, Option<String>>;

/// Fallback signals gathered from the `<head>` of an HTML page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaSignals {
    pub title: Option<String>,
    pub by_name: MetaMap,
    pub by_property: MetaMap,
    pub by_itemprop: MetaMap,
}

impl MetaSignals {
    pub fn name(&self, key: &str) -> Option<&str> {
        lookup(&self.by_name, key)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        lookup(&self.by_property, key)
    }

    pub fn itemprop(&self, key: &str) -> Option<&str> {
        lookup(&self.by_itemprop, key)
    }
}

fn lookup<'a>(map: &'a MetaMap, key: &str) -> Option<&'a str> {
    map.get(key).and_then(|content| content.as_deref())
}

/// Everything one pass over an HTML document produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlSignals {
    pub meta: MetaSignals,
    /// Text of every JSON-LD script block, concatenated in document order.
    pub json_ld: String,
}

/// Mutable state shared by the rewriter callbacks for a single transform.
#[derive(Default)]
struct Collector {
    title: Option<String>,
    by_name: MetaMap,
    by_property: MetaMap,
    by_itemprop: MetaMap,
    json_ld: String,
}

impl Collector {
    fn start_title(&mut self) {
        self.title = Some(String::new());
    }

    fn push_title(&mut self, fragment: &str) {
        self.title.get_or_insert_with(String::new).push_str(fragment);
    }

    fn finish(self) -> HtmlSignals {
        HtmlSignals {
            meta: MetaSignals {
                title: self.title,
                by_name: self.by_name,
                by_property: self.by_property,
                by_itemprop: self.by_itemprop,
            },
            json_ld: self.json_ld,
        }
    }
}

/// Run `f` against the collector. The lock is held only for the duration of
/// one callback.
fn with_collector(collector: &Mutex<Collector>, f: impl FnOnce(&mut Collector)) {
    let mut guard = collector.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard);
}

fn discard(_: &[u8]) {}

/// Build a rewriter whose callbacks record head signals into `collector`.
///
/// Each `<title>` element restarts the title, so a page with several keeps
/// the last one. Meta tags seen later overwrite earlier ones with the same key.
fn signal_rewriter(collector: &Mutex<Collector>) -> HtmlRewriter<'_, fn(&[u8])> {
    HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!(TITLE, |_el| {
                    with_collector(collector, Collector::start_title);
                    Ok(())
                }),
                text!(TITLE, |t| {
                    with_collector(collector, |c| c.push_title(t.as_str()));
                    Ok(())
                }),
                element!(META_NAME, |el| {
                    if let Some(key) = el.get_attribute("name") {
                        let content = el.get_attribute("content");
                        with_collector(collector, |c| {
                            c.by_name.insert(key, content);
                        });
                    }
                    Ok(())
                }),
                element!(META_PROPERTY, |el| {
                    if let Some(key) = el.get_attribute("property") {
                        let content = el.get_attribute("content");
                        with_collector(collector, |c| {
                            c.by_property.insert(key, content);
                        });
                    }
                    Ok(())
                }),
                element!(META_ITEMPROP, |el| {
                    if let Some(key) = el.get_attribute("itemprop") {
                        let content = el.get_attribute("content");
                        with_collector(collector, |c| {
                            c.by_itemprop.insert(key, content);
                        });
                    }
                    Ok(())
                }),
                text!(JSON_LD, |t| {
                    with_collector(collector, |c| c.json_ld.push_str(t.as_str()));
                    Ok(())
                }),
            ],
            ..Settings::new_send()
        },
        discard as fn(&[u8]),
    )
}

fn finish(collector: Mutex<Collector>) -> HtmlSignals {
    collector
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .finish()
}

/// Run the rewriter over in-memory `chunks` in order and collect head signals.
pub fn collect_html_signals<I>(chunks: I) -> Result<HtmlSignals, RewritingError>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let collector = Mutex::new(Collector::default());

    {
        let mut rewriter = signal_rewriter(&collector);
        for chunk in chunks {
            rewriter.write(chunk.as_ref())?;
        }
        rewriter.end()?;
    }

    Ok(finish(collector))
}

/// Stream an upstream HTML body through the signal rewriter.
///
/// Each chunk is written to the rewriter as it arrives, on the calling task,
/// so the body is never held in memory as a whole and no thread waits on the
/// network. Dropping the returned future abandons the transform.
pub async fn stream_html_signals<S, E>(body: S) -> AppResult<HtmlSignals>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let collector = Mutex::new(Collector::default());

    {
        let mut rewriter = signal_rewriter(&collector);
        let mut body = std::pin::pin!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| AppError::UpstreamHtml(e.to_string()))?;
            rewriter
                .write(&chunk)
                .map_err(|e| AppError::UpstreamHtml(e.to_string()))?;
        }
        rewriter
            .end()
            .map_err(|e| AppError::UpstreamHtml(e.to_string()))?;
    }

    Ok(finish(collector))
}
