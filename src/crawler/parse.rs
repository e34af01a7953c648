//! Controller-internal HTML parse
//!
//! A single pass over the document extracts the page title, meta
//! description, canonical link, and every link-carrying element in document
//! order. Malformed HTML is never an error; whatever can be extracted is.

use crate::crawler::controller::Link;
use crate::url::PageUrl;
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Default)]
pub(crate) struct ParsedDocument {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub links: Vec<Link>,
}

/// Extracts metadata and links from an HTML body.
///
/// Links come from `<a href>`, `<link href>` (except `rel="canonical"`),
/// `<script src>`, `<img src>`, and `<source src>`, in document order.
/// Hrefs with a scheme other than http/https are dropped; everything else
/// is resolved against the page URL.
pub(crate) fn parse_document(body: &[u8], page_url: &PageUrl) -> ParsedDocument {
    let html = String::from_utf8_lossy(body);
    let doc = Html::parse_document(&html);

    let mut parsed = ParsedDocument {
        title: extract_title(&doc),
        ..Default::default()
    };

    if let Ok(selector) = Selector::parse(r#"head meta[name="description"]"#) {
        if let Some(meta) = doc.select(&selector).next() {
            parsed.description = meta.value().attr("content").unwrap_or("").to_string();
        }
    }

    let link_selector = Selector::parse("a[href], link[href], script[src], img[src], source[src]");
    if let Ok(selector) = link_selector {
        for element in doc.select(&selector) {
            match element.value().name() {
                "a" => {
                    let href = element.value().attr("href").unwrap_or("");
                    if let Some(url) = resolve_link(href, page_url) {
                        parsed.links.push(Link {
                            url,
                            text: element.text().collect::<String>().trim().to_string(),
                            rel: element.value().attr("rel").unwrap_or("").to_string(),
                        });
                    }
                }
                "link" => {
                    let rel = element.value().attr("rel").unwrap_or("");
                    let href = element.value().attr("href").unwrap_or("");
                    if rel == "canonical" {
                        if parsed.canonical.is_empty() && !href.is_empty() {
                            parsed.canonical = href.to_string();
                        }
                        continue;
                    }
                    if let Some(url) = resolve_link(href, page_url) {
                        parsed.links.push(Link {
                            url,
                            text: String::new(),
                            rel: rel.to_string(),
                        });
                    }
                }
                _ => {
                    let src = element.value().attr("src").unwrap_or("");
                    if let Some(url) = resolve_link(src, page_url) {
                        parsed.links.push(Link {
                            url,
                            text: String::new(),
                            rel: String::new(),
                        });
                    }
                }
            }
        }
    }

    parsed
}

/// The title is the text of the first `<title>` in the head; titles inside
/// SVG subtrees do not count.
fn extract_title(doc: &Html) -> String {
    let Ok(selector) = Selector::parse("head title") else {
        return String::new();
    };
    doc.select(&selector)
        .find(|el| !inside_svg(el))
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

pub(crate) fn inside_svg(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "svg")
}

/// Resolves an href against the page URL, dropping values whose scheme is
/// neither empty nor http(s).
fn resolve_link(href: &str, page_url: &PageUrl) -> Option<PageUrl> {
    if href.is_empty() {
        return None;
    }

    match ::url::Url::parse(href) {
        Ok(absolute) => {
            if absolute.scheme() != "http" && absolute.scheme() != "https" {
                return None;
            }
        }
        Err(::url::ParseError::RelativeUrlWithoutBase) => {}
        Err(_) => return None,
    }

    page_url.resolve(href).ok()
}
