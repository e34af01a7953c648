//! XML sitemap URL extraction
//!
//! A small textual helper in the same content-type-agnostic spirit as the
//! rewriter: `<loc>` values are pulled straight out of the markup, which
//! handles both `<urlset>` sitemaps and `<sitemapindex>` indexes (for
//! indexes the extracted URLs are the child sitemaps, not pages).

/// Extracts all `<loc>` URLs from sitemap XML content.
pub fn parse_sitemap_urls(content: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(content);
    if !is_sitemap_text(&text) {
        return Vec::new();
    }

    let mut urls = Vec::new();
    let mut rest = text.as_ref();
    while let Some(start) = rest.find("<loc>") {
        rest = &rest[start + "<loc>".len()..];
        let Some(end) = rest.find("</loc>") else { break };
        let loc = rest[..end].trim();
        if !loc.is_empty() {
            urls.push(loc.to_string());
        }
        rest = &rest[end + "</loc>".len()..];
    }
    urls
}

/// Checks whether content looks like sitemap XML.
pub fn is_sitemap_content(content: &[u8]) -> bool {
    is_sitemap_text(&String::from_utf8_lossy(content))
}

fn is_sitemap_text(text: &str) -> bool {
    text.contains("<urlset") || text.contains("<sitemapindex")
}
