//! Site-wide linting rules
//!
//! Site rules run once, after the whole crawl, over one input record per
//! page. They emit findings targeted at specific pages, which the reporter
//! merges with the per-page findings.

use crate::linter::{Category, Lint, Severity, Tag};

/// Everything a site-wide rule may observe about one crawled page.
#[derive(Debug, Clone, Default)]
pub struct SiteLintInput {
    pub url: String,
    pub status_code: u16,
    /// The URL appears in the site's XML sitemap.
    pub in_sitemap: bool,
    /// The page carries a noindex directive.
    pub is_noindex: bool,
    /// robots.txt disallows this URL.
    pub is_disallowed: bool,
    /// Fetching this URL timed out.
    pub is_timeout: bool,
    /// Non-empty when the URL failed to crawl.
    pub crawl_error: String,
    /// The page's canonical URL, empty when absent.
    pub canonical: String,
    /// Internal links going out from this page.
    pub internal_links: Vec<SiteLink>,
}

/// An internal link for site-level analysis.
#[derive(Debug, Clone)]
pub struct SiteLink {
    pub target_url: String,
    /// False when the link carries `nofollow`.
    pub is_follow: bool,
}

/// Findings a site rule emits for one page.
#[derive(Debug, Clone)]
pub struct SiteFinding {
    pub url: String,
    /// One entry per finding; evidence may be empty.
    pub evidence: Vec<String>,
}

/// A site-wide linting rule.
pub struct SiteRule {
    pub id: &'static str,
    pub name: &'static str,
    pub severity: Severity,
    pub category: Category,
    pub tag: Tag,
    pub check: fn(&[SiteLintInput]) -> Vec<SiteFinding>,
}

impl SiteRule {
    /// Creates a lint carrying this rule's metadata.
    pub fn emit(&self, evidence: String) -> Lint {
        Lint {
            rule: self.id,
            message: self.name,
            severity: self.severity,
            category: self.category,
            tag: self.tag,
            evidence,
        }
    }
}
