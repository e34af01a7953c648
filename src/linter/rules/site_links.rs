//! Site-level link graph rules.

use crate::linter::{Category, Severity, SiteFinding, SiteLintInput, SiteRule, Tag};
use std::collections::{HashMap, HashSet};

pub(crate) fn broken_crawl_error_rule() -> SiteRule {
    SiteRule {
        id: "broken-internal-url-crawl-error",
        name: "Internal URL failed to crawl",
        severity: Severity::High,
        category: Category::Internal,
        tag: Tag::Issue,
        check: |pages| {
            pages
                .iter()
                .filter(|page| !page.crawl_error.is_empty())
                .map(|page| {
                    let evidence = if page.is_timeout {
                        "Request timed out"
                    } else {
                        "Crawl error"
                    };
                    SiteFinding {
                        url: page.url.clone(),
                        evidence: vec![evidence.to_string()],
                    }
                })
                .collect()
        },
    }
}

pub(crate) fn register(reg: &mut crate::linter::Registry) {
    reg.register_site_rule(SiteRule {
        id: "single-incoming-link",
        name: "Has only one followed internal linking URL",
        severity: Severity::Medium,
        category: Category::Links,
        tag: Tag::Opportunity,
        check: |pages| {
            let page_urls: HashSet<&str> = pages.iter().map(|p| p.url.as_str()).collect();

            // Reverse index: target URL -> distinct source URLs, followed
            // links to crawled pages only.
            let mut incoming: HashMap<&str, HashSet<&str>> = HashMap::new();
            for page in pages {
                for link in &page.internal_links {
                    if !link.is_follow {
                        continue;
                    }
                    if !page_urls.contains(link.target_url.as_str()) {
                        continue;
                    }
                    incoming
                        .entry(link.target_url.as_str())
                        .or_default()
                        .insert(page.url.as_str());
                }
            }

            incoming
                .into_iter()
                .filter(|(_, sources)| sources.len() == 1)
                .map(|(target, sources)| {
                    let source = sources.into_iter().next().unwrap_or_default();
                    SiteFinding {
                        url: target.to_string(),
                        evidence: vec![format!("only linked from {}", source)],
                    }
                })
                .collect()
        },
    });
}
