//! Rule-based HTML linter
//!
//! Two registries of rules produce structured findings: per-page rules
//! observe a read-only [`Context`] built from one fetched page, site-wide
//! rules observe the aggregated crawl. Rules are data; the engine never
//! needs to change when a rule is added.

mod noindex;
mod registry;
pub mod rules;
mod site;
mod sitemap;

pub use noindex::is_noindex_html;
pub use registry::{registry, sort_lints, Registry};
pub use site::{SiteFinding, SiteLink, SiteLintInput, SiteRule};
pub use sitemap::{is_sitemap_content, parse_sitemap_urls};

use crate::analyzer::Analysis;
use crate::crawler::Redirect;
use crate::url::PageUrl;
use scraper::Html;
use std::fmt;

/// How serious a finding is. Presentation order runs from `Critical` down
/// to `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of lint categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Accessibility,
    Amp,
    DuplicateContent,
    Indexability,
    Internal,
    International,
    Links,
    MobileFriendly,
    OnPage,
    Performance,
    Redirects,
    Rendered,
    SearchTraffic,
    Security,
    XmlSitemaps,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Accessibility => "accessibility",
            Category::Amp => "amp",
            Category::DuplicateContent => "duplicate_content",
            Category::Indexability => "indexability",
            Category::Internal => "internal",
            Category::International => "international",
            Category::Links => "links",
            Category::MobileFriendly => "mobile_friendly",
            Category::OnPage => "on_page",
            Category::Performance => "performance",
            Category::Redirects => "redirects",
            Category::Rendered => "rendered",
            Category::SearchTraffic => "search_traffic",
            Category::Security => "security",
            Category::XmlSitemaps => "xml_sitemaps",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Issue,
    Opportunity,
    PotentialIssue,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Issue => "issue",
            Tag::Opportunity => "opportunity",
            Tag::PotentialIssue => "potential_issue",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding emitted by a rule against one page.
#[derive(Debug, Clone)]
pub struct Lint {
    pub rule: &'static str,
    pub message: &'static str,
    pub severity: Severity,
    pub category: Category,
    pub tag: Tag,
    pub evidence: String,
}

/// Everything a per-page rule may observe. One per page; read-only.
pub struct Context<'a> {
    pub doc: Html,
    pub url: &'a PageUrl,
    pub body: &'a [u8],
    pub analysis: &'a Analysis,
    pub status_code: u16,
    pub redirect_chain: &'a [Redirect],
}

/// Optional parameters for building a lint context.
#[derive(Debug, Default)]
pub struct CheckOptions<'a> {
    pub status_code: u16,
    pub redirect_chain: &'a [Redirect],
}

impl<'a> Context<'a> {
    pub fn new(
        body: &'a [u8],
        url: &'a PageUrl,
        analysis: &'a Analysis,
        opts: CheckOptions<'a>,
    ) -> Self {
        let html = String::from_utf8_lossy(body);
        Self {
            doc: Html::parse_document(&html),
            url,
            body,
            analysis,
            status_code: opts.status_code,
            redirect_chain: opts.redirect_chain,
        }
    }
}

/// A per-page linting rule.
///
/// `check` is a pure function returning one evidence string per finding
/// (evidence may be empty); the engine stamps the rule's metadata onto each.
pub struct Rule {
    pub id: &'static str,
    pub name: &'static str,
    pub severity: Severity,
    pub category: Category,
    pub tag: Tag,
    pub check: fn(&Context) -> Vec<String>,
}

impl Rule {
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

/// Builds a context and runs every registered per-page rule over it.
pub fn check_page(
    body: &[u8],
    url: &PageUrl,
    analysis: &Analysis,
    opts: CheckOptions<'_>,
) -> Vec<Lint> {
    let ctx = Context::new(body, url, analysis, opts);
    registry().run(&ctx)
}
