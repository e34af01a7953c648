//! Standalone page analyzer used by the report pipeline
//!
//! Extracts the metadata the reporter displays: title, meta description,
//! canonical URL, and every image on the page with its alt text and
//! dimensions. Malformed HTML is tolerated; missing pieces come back empty.

use crate::url::PageUrl;
use scraper::{Html, Selector};

/// An image found on a page.
#[derive(Debug, Clone)]
pub struct Image {
    /// The image URL resolved against the page URL.
    pub url: String,
    /// The raw `src` (or srcset candidate) attribute value.
    pub src: String,
    pub alt: String,
    pub width: String,
    pub height: String,
}

/// Results of analyzing a page.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub images: Vec<Image>,
}

/// Parses an HTML body and extracts metadata and images.
pub fn analyze(body: &[u8], page_url: &PageUrl) -> Analysis {
    let html = String::from_utf8_lossy(body);
    let doc = Html::parse_document(&html);

    let mut analysis = Analysis {
        title: select_first_text(&doc, "head title"),
        description: select_first_attr(&doc, r#"head meta[name="description"]"#, "content"),
        canonical: select_first_attr(&doc, r#"head link[rel="canonical"]"#, "href"),
        images: Vec::new(),
    };

    if let Ok(selector) = Selector::parse("img[src]") {
        for img in doc.select(&selector) {
            let src = img.value().attr("src").unwrap_or("").to_string();
            if src.is_empty() {
                continue;
            }
            let resolved = page_url
                .resolve(&src)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| src.clone());
            analysis.images.push(Image {
                url: resolved,
                src,
                alt: img.value().attr("alt").unwrap_or("").to_string(),
                width: img.value().attr("width").unwrap_or("").to_string(),
                height: img.value().attr("height").unwrap_or("").to_string(),
            });
        }
    }

    // Picture sources: the first URL of each comma-separated srcset candidate.
    if let Ok(selector) = Selector::parse("img[srcset], source[srcset]") {
        for element in doc.select(&selector) {
            let srcset = element.value().attr("srcset").unwrap_or("");
            for candidate in srcset.split(',') {
                let Some(src) = candidate.split_whitespace().next() else {
                    continue;
                };
                let resolved = page_url
                    .resolve(src)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| src.to_string());
                analysis.images.push(Image {
                    url: resolved,
                    src: src.to_string(),
                    alt: String::new(),
                    width: String::new(),
                    height: String::new(),
                });
            }
        }
    }

    analysis
}

fn select_first_text(doc: &Html, css: &str) -> String {
    let Ok(selector) = Selector::parse(css) else {
        return String::new();
    };
    doc.select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn select_first_attr(doc: &Html, css: &str, attr: &str) -> String {
    let Ok(selector) = Selector::parse(css) else {
        return String::new();
    };
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .unwrap_or("")
        .to_string()
}
