//! Security rules: mixed content and insecure protocol use.

use crate::linter::rules::select;
use crate::linter::{Category, Context, Registry, Rule, Severity, Tag};
use std::collections::HashSet;

/// Element/attribute pairs that load subresources.
const ASSET_SOURCES: &[(&str, &str)] = &[
    ("img[src]", "src"),
    ("script[src]", "src"),
    ("link[href]", "href"),
    ("video[src]", "src"),
    ("audio[src]", "src"),
    ("source[src]", "src"),
    ("video[poster]", "poster"),
    ("iframe[src]", "src"),
    ("object[data]", "data"),
    ("embed[src]", "src"),
    ("form[action]", "action"),
];

fn is_non_network(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.starts_with("data:") || lower.starts_with("javascript:") || lower.starts_with("blob:")
}

/// Collects every asset reference on the page, raw attribute values, in
/// document-source order per attribute kind. Srcset attributes contribute
/// the first URL of each candidate.
fn asset_refs(ctx: &Context) -> Vec<String> {
    let mut refs = Vec::new();
    for (css, attr) in ASSET_SOURCES {
        for element in select(&ctx.doc, css) {
            if let Some(value) = element.value().attr(attr) {
                refs.push(value.trim().to_string());
            }
        }
    }
    for element in select(&ctx.doc, "img[srcset], source[srcset]") {
        let srcset = element.value().attr("srcset").unwrap_or("");
        for candidate in srcset.split(',') {
            if let Some(url) = candidate.split_whitespace().next() {
                refs.push(url.to_string());
            }
        }
    }
    refs
}

pub(crate) fn register(reg: &mut Registry) {
    reg.register(Rule {
        id: "mixed-content",
        name: "HTTPS page loads HTTP resources (mixed content)",
        severity: Severity::Critical,
        category: Category::Security,
        tag: Tag::Issue,
        check: |ctx| {
            if ctx.url.scheme() != "https" {
                return Vec::new();
            }

            let mut seen = HashSet::new();
            let mut findings = Vec::new();
            for reference in asset_refs(ctx) {
                if reference.is_empty() || is_non_network(&reference) {
                    continue;
                }
                let Ok(resolved) = ctx.url.resolve(&reference) else {
                    continue;
                };
                if resolved.scheme() == "http" {
                    let url = resolved.to_string();
                    if seen.insert(url.clone()) {
                        findings.push(url);
                    }
                }
            }
            findings
        },
    });

    reg.register(Rule {
        id: "internal-http-url",
        name: "Internal URL uses insecure HTTP protocol",
        severity: Severity::Critical,
        category: Category::Security,
        tag: Tag::Issue,
        check: |ctx| {
            if ctx.url.scheme() == "http" && ctx.status_code == 200 {
                vec![String::new()]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "https-links-to-http",
        name: "HTTPS page links to internal HTTP URL",
        severity: Severity::High,
        category: Category::Security,
        tag: Tag::Issue,
        check: |ctx| {
            if ctx.url.scheme() != "https" {
                return Vec::new();
            }
            select(&ctx.doc, "a[href]")
                .iter()
                .filter_map(|a| {
                    let href = a.value().attr("href")?.trim();
                    if href.is_empty() || is_non_network(href) {
                        return None;
                    }
                    let resolved = ctx.url.resolve(href).ok()?;
                    if resolved.scheme() == "http" && resolved.is_internal(ctx.url) {
                        Some(resolved.to_string())
                    } else {
                        None
                    }
                })
                .collect()
        },
    });

    reg.register(Rule {
        id: "https-form-to-http",
        name: "HTTPS page submits a form to an HTTP URL",
        severity: Severity::High,
        category: Category::Security,
        tag: Tag::Issue,
        check: |ctx| {
            if ctx.url.scheme() != "https" {
                return Vec::new();
            }
            select(&ctx.doc, "form[action]")
                .iter()
                .filter_map(|form| {
                    let action = form.value().attr("action")?.trim();
                    if action.is_empty() {
                        return None;
                    }
                    let resolved = ctx.url.resolve(action).ok()?;
                    if resolved.scheme() == "http" {
                        Some(resolved.to_string())
                    } else {
                        None
                    }
                })
                .collect()
        },
    });

    reg.register(Rule {
        id: "protocol-relative-uri",
        name: "Has an asset with a protocol-relative URI",
        severity: Severity::High,
        category: Category::Security,
        tag: Tag::PotentialIssue,
        check: |ctx| {
            asset_refs(ctx)
                .into_iter()
                .filter(|reference| reference.starts_with("//"))
                .collect()
        },
    });
}
