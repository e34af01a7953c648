//! Noindex detection for the sitemap lint inputs

use scraper::{Html, Selector};

/// Checks whether HTML content carries a noindex directive in a
/// `<meta name="robots">` or `<meta name="googlebot">` tag.
pub fn is_noindex_html(body: &[u8]) -> bool {
    let html = String::from_utf8_lossy(body);
    let doc = Html::parse_document(&html);

    let Ok(selector) = Selector::parse("meta[name]") else {
        return false;
    };
    doc.select(&selector).any(|meta| {
        let name = meta.value().attr("name").unwrap_or("").to_lowercase();
        if name != "robots" && name != "googlebot" {
            return false;
        }
        meta.value()
            .attr("content")
            .map(|content| content.to_lowercase().contains("noindex"))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noindex_robots_meta() {
        assert!(is_noindex_html(
            br#"<html><head><meta name="robots" content="noindex, nofollow"></head></html>"#
        ));
        assert!(is_noindex_html(
            br#"<html><head><meta name="ROBOTS" content="NOINDEX"></head></html>"#
        ));
    }

    #[test]
    fn test_noindex_googlebot_meta() {
        assert!(is_noindex_html(
            br#"<html><head><meta name="googlebot" content="noindex"></head></html>"#
        ));
    }

    #[test]
    fn test_indexable_pages() {
        assert!(!is_noindex_html(
            br#"<html><head><meta name="robots" content="index, follow"></head></html>"#
        ));
        assert!(!is_noindex_html(b"<html><head></head></html>"));
    }
}
