//! Process-wide rule registries
//!
//! Built once, on first use, by a single registration entry point; frozen
//! thereafter. Rule check functions are pure and safe for concurrent
//! invocation.

use crate::linter::site::{SiteLintInput, SiteRule};
use crate::linter::{rules, Context, Lint, Rule, Severity};
use std::collections::HashMap;
use std::sync::OnceLock;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Returns the process-wide registry, building it on first use.
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let mut reg = Registry::empty();
        rules::register_all(&mut reg);
        reg
    })
}

/// Holds the per-page and site-wide rule sets.
pub struct Registry {
    rules: Vec<Rule>,
    site_rules: Vec<SiteRule>,
}

impl Registry {
    fn empty() -> Self {
        Self {
            rules: Vec::new(),
            site_rules: Vec::new(),
        }
    }

    pub fn register(&mut self, rule: Rule) {
        debug_assert!(
            self.rules.iter().all(|r| r.id != rule.id),
            "duplicate rule id {}",
            rule.id
        );
        self.rules.push(rule);
    }

    pub fn register_site_rule(&mut self, rule: SiteRule) {
        self.site_rules.push(rule);
    }

    /// Looks up a per-page rule by id.
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Returns all per-page rules sorted by category, then severity.
    pub fn all(&self) -> Vec<&Rule> {
        let mut result: Vec<&Rule> = self.rules.iter().collect();
        result.sort_by(|a, b| {
            (a.category.as_str(), severity_rank(a.severity))
                .cmp(&(b.category.as_str(), severity_rank(b.severity)))
        });
        result
    }

    pub fn all_site_rules(&self) -> &[SiteRule] {
        &self.site_rules
    }

    /// Runs every per-page rule against the context, concatenating findings.
    pub fn run(&self, ctx: &Context) -> Vec<Lint> {
        let mut all = Vec::new();
        for rule in &self.rules {
            for evidence in (rule.check)(ctx) {
                all.push(rule.emit(evidence));
            }
        }
        all
    }

    /// Runs every site-wide rule over the aggregated crawl and groups the
    /// emitted findings by target URL.
    pub fn run_site(&self, pages: &[SiteLintInput]) -> HashMap<String, Vec<Lint>> {
        let mut results: HashMap<String, Vec<Lint>> = HashMap::new();
        for rule in &self.site_rules {
            for finding in (rule.check)(pages) {
                let lints = finding
                    .evidence
                    .into_iter()
                    .map(|evidence| rule.emit(evidence));
                results.entry(finding.url).or_default().extend(lints);
            }
        }
        results
    }
}

pub(crate) fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::Critical => 0,
        Severity::High => 1,
        Severity::Medium => 2,
        Severity::Low => 3,
    }
}

/// Sorts lints for presentation: by category, then severity.
pub fn sort_lints(lints: &mut [Lint]) {
    lints.sort_by(|a, b| {
        (a.category.as_str(), severity_rank(a.severity))
            .cmp(&(b.category.as_str(), severity_rank(b.severity)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_populated() {
        let reg = registry();
        assert!(reg.all().len() > 30, "expected a full rule catalog");
        assert!(!reg.all_site_rules().is_empty());
    }

    #[test]
    fn test_all_sorted_by_category_then_severity() {
        let all = registry().all();
        for pair in all.windows(2) {
            let a = (pair[0].category.as_str(), severity_rank(pair[0].severity));
            let b = (pair[1].category.as_str(), severity_rank(pair[1].severity));
            assert!(a <= b, "rules out of order: {} before {}", pair[0].id, pair[1].id);
        }
    }

    #[test]
    fn test_rule_lookup() {
        assert!(registry().rule("missing-title").is_some());
        assert!(registry().rule("no-such-rule").is_none());
    }
}
