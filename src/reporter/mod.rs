//! SEO report aggregation and rendering
//!
//! Collects one record per crawled page (metadata, images, findings),
//! feeds the aggregate through the site-wide rules, and renders a
//! self-contained HTML report.

mod html;

pub use html::render_report;

use crate::analyzer::Image;
use crate::linter::{sort_lints, Lint, SiteLink, SiteLintInput};
use std::collections::HashMap;

/// An internal link going out from a reported page.
#[derive(Debug, Clone)]
pub struct InternalLink {
    pub target_url: String,
    /// False when the link carries `nofollow`.
    pub is_follow: bool,
}

/// Everything the report shows for one page.
#[derive(Debug, Clone, Default)]
pub struct PageReport {
    pub url: String,
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub status_code: u16,
    pub images: Vec<Image>,
    pub lints: Vec<Lint>,
    pub internal_links: Vec<InternalLink>,
    pub is_noindex: bool,
}

/// A page that failed to crawl; it still participates in site-wide rules.
#[derive(Debug, Clone)]
pub struct CrawlFailure {
    pub url: String,
    pub error: String,
    pub is_timeout: bool,
}

/// The full report.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub site_url: String,
    pub generated_at: String,
    pub pages: Vec<PageReport>,
    pub failures: Vec<CrawlFailure>,
}

impl Report {
    pub fn total_images(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }

    pub fn total_lints(&self) -> usize {
        self.pages.iter().map(|p| p.lints.len()).sum()
    }

    /// Lint counts keyed by severity name.
    pub fn lint_counts(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for page in &self.pages {
            for lint in &page.lints {
                *counts.entry(lint.severity.as_str()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Runs the site-wide rules over the collected pages and merges their
    /// findings into the owning pages, then sorts every page's findings
    /// for presentation.
    ///
    /// `sitemap_urls` are the URLs listed in the site's XML sitemap;
    /// `is_disallowed` answers whether robots.txt disallows a URL.
    pub fn finalize(&mut self, sitemap_urls: &[String], is_disallowed: impl Fn(&str) -> bool) {
        let in_sitemap = |url: &str| {
            sitemap_urls
                .iter()
                .any(|s| s == url || s.trim_end_matches('/') == url.trim_end_matches('/'))
        };

        let mut inputs: Vec<SiteLintInput> = self
            .pages
            .iter()
            .map(|page| SiteLintInput {
                url: page.url.clone(),
                status_code: page.status_code,
                in_sitemap: in_sitemap(&page.url),
                is_noindex: page.is_noindex,
                is_disallowed: is_disallowed(&page.url),
                is_timeout: false,
                crawl_error: String::new(),
                canonical: page.canonical.clone(),
                internal_links: page
                    .internal_links
                    .iter()
                    .map(|link| SiteLink {
                        target_url: link.target_url.clone(),
                        is_follow: link.is_follow,
                    })
                    .collect(),
            })
            .collect();

        for failure in &self.failures {
            inputs.push(SiteLintInput {
                url: failure.url.clone(),
                in_sitemap: in_sitemap(&failure.url),
                is_timeout: failure.is_timeout,
                crawl_error: failure.error.clone(),
                ..Default::default()
            });
        }

        let mut site_lints = crate::linter::registry().run_site(&inputs);

        for page in &mut self.pages {
            if let Some(extra) = site_lints.remove(&page.url) {
                page.lints.extend(extra);
            }
            sort_lints(&mut page.lints);
        }

        // Findings for failed URLs get a stub page entry so they are not
        // silently dropped from the report.
        for (url, lints) in site_lints {
            let mut lints = lints;
            sort_lints(&mut lints);
            self.pages.push(PageReport {
                url,
                lints,
                ..Default::default()
            });
        }
    }
}
