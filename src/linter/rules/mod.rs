//! The lint rule catalog
//!
//! Each submodule registers its rules into the process-wide registry via
//! [`register_all`], which the registry invokes exactly once before the
//! first lint run.

pub(crate) mod internal;
pub(crate) mod links;
pub(crate) mod on_page;
pub(crate) mod redirects;
pub(crate) mod security;
pub(crate) mod site_links;
pub(crate) mod xml_sitemaps;

use crate::linter::Registry;
use scraper::{ElementRef, Html, Selector};

pub(crate) fn register_all(reg: &mut Registry) {
    on_page::register(reg);
    internal::register(reg);
    links::register(reg);
    redirects::register(reg);
    security::register(reg);
    site_links::register(reg);
    xml_sitemaps::register(reg);
}

/// Collects the elements matching a selector; an invalid selector matches
/// nothing.
pub(crate) fn select<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    Selector::parse(css)
        .map(|sel| doc.select(&sel).collect())
        .unwrap_or_default()
}

/// True when the element sits inside an `<svg>` subtree, where some
/// otherwise-suspicious tags (like `<title>`) are legitimate.
pub(crate) fn inside_svg(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "svg")
}

/// Trimmed text content of the first element matching the selector.
pub(crate) fn first_text(doc: &Html, css: &str) -> Option<String> {
    select(doc, css)
        .first()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Attribute of the first element matching the selector.
pub(crate) fn first_attr(doc: &Html, css: &str, attr: &str) -> Option<String> {
    select(doc, css)
        .first()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}
