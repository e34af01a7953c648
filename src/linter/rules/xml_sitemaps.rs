//! Rules over XML sitemap membership.

use crate::linter::{Category, Registry, Severity, SiteFinding, SiteLintInput, SiteRule, Tag};

/// Emits one finding per sitemap page matching the predicate.
fn sitemap_findings(
    pages: &[SiteLintInput],
    matches: fn(&SiteLintInput) -> Option<String>,
) -> Vec<SiteFinding> {
    pages
        .iter()
        .filter(|page| page.in_sitemap)
        .filter_map(|page| {
            matches(page).map(|evidence| SiteFinding {
                url: page.url.clone(),
                evidence: vec![evidence],
            })
        })
        .collect()
}

pub(crate) fn register(reg: &mut Registry) {
    reg.register_site_rule(SiteRule {
        id: "sitemap-has-5xx-url",
        name: "URL in XML sitemap returns server error (5XX)",
        severity: Severity::Critical,
        category: Category::XmlSitemaps,
        tag: Tag::Issue,
        check: |pages| {
            sitemap_findings(pages, |page| {
                (500..600)
                    .contains(&page.status_code)
                    .then(|| format!("HTTP {}", page.status_code))
            })
        },
    });

    reg.register_site_rule(SiteRule {
        id: "sitemap-has-4xx-url",
        name: "URL in XML sitemap returns not found (4XX)",
        severity: Severity::Critical,
        category: Category::XmlSitemaps,
        tag: Tag::Issue,
        check: |pages| {
            sitemap_findings(pages, |page| {
                (400..500)
                    .contains(&page.status_code)
                    .then(|| format!("HTTP {}", page.status_code))
            })
        },
    });

    reg.register_site_rule(SiteRule {
        id: "sitemap-has-3xx-url",
        name: "URL in XML sitemap returns redirect (3XX)",
        severity: Severity::Medium,
        category: Category::XmlSitemaps,
        tag: Tag::Issue,
        check: |pages| {
            sitemap_findings(pages, |page| {
                (300..400)
                    .contains(&page.status_code)
                    .then(|| format!("HTTP {}", page.status_code))
            })
        },
    });

    reg.register_site_rule(SiteRule {
        id: "sitemap-has-noindex-url",
        name: "URL in XML sitemap is noindex",
        severity: Severity::Critical,
        category: Category::XmlSitemaps,
        tag: Tag::Issue,
        check: |pages| sitemap_findings(pages, |page| page.is_noindex.then(String::new)),
    });

    reg.register_site_rule(SiteRule {
        id: "sitemap-has-canonicalized-url",
        name: "URL in XML sitemap has non-self-referencing canonical",
        severity: Severity::High,
        category: Category::XmlSitemaps,
        tag: Tag::Issue,
        check: |pages| {
            sitemap_findings(pages, |page| {
                (!page.canonical.is_empty() && page.canonical != page.url)
                    .then(|| page.canonical.clone())
            })
        },
    });

    reg.register_site_rule(SiteRule {
        id: "sitemap-has-disallowed-url",
        name: "URL in XML sitemap is disallowed by robots.txt",
        severity: Severity::High,
        category: Category::XmlSitemaps,
        tag: Tag::Issue,
        check: |pages| sitemap_findings(pages, |page| page.is_disallowed.then(String::new)),
    });

    reg.register_site_rule(SiteRule {
        id: "sitemap-has-timeout-url",
        name: "URL in XML sitemap timed out",
        severity: Severity::Medium,
        category: Category::XmlSitemaps,
        tag: Tag::Issue,
        check: |pages| sitemap_findings(pages, |page| page.is_timeout.then(String::new)),
    });
}
