//! Internal URL hygiene rules, plus the site-level crawl-error rule.

use crate::linter::rules::site_links;
use crate::linter::{Category, Registry, Rule, Severity, Tag};
use percent_encoding::percent_decode_str;

/// Query parameters added by analytics and ad platforms.
const TRACKING_PARAMS: &[&str] = &[
    // Google Ads
    "gclid", "gclsrc", "dclid", "gbraid", "wbraid",
    // Facebook/Meta
    "fbclid", "fb_action_ids", "fb_action_types", "fb_source",
    // Microsoft/Bing
    "msclkid",
    // HubSpot
    "_hsenc", "_hsmi", "hsCtaTracking", "__hstc", "__hsfp", "__hssc",
    // Mailchimp
    "mc_cid", "mc_eid",
    // Matomo/Piwik
    "pk_campaign", "pk_kwd", "pk_source", "pk_medium", "pk_content",
    "mtm_campaign", "mtm_source", "mtm_medium", "mtm_keyword", "mtm_content",
    // Social
    "igshid", "twclid",
    // Adobe Analytics
    "s_kwcid",
    // Other
    "ref", "affiliate", "trk", "clickid",
];

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

fn decoded_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().to_string()
}

pub(crate) fn register(reg: &mut Registry) {
    reg.register(Rule {
        id: "broken-internal-url",
        name: "Broken internal URL",
        severity: Severity::High,
        category: Category::Internal,
        tag: Tag::Issue,
        check: |ctx| {
            if ctx.status_code >= 400 {
                vec![format!("HTTP {}", ctx.status_code)]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "tracking-parameters",
        name: "Query string contains tracking parameters",
        severity: Severity::Medium,
        category: Category::Internal,
        tag: Tag::Issue,
        check: |ctx| {
            let found: Vec<String> = ctx
                .url
                .as_url()
                .query_pairs()
                .map(|(key, _)| key.to_string())
                .filter(|key| is_tracking_param(key))
                .collect();
            if found.is_empty() {
                Vec::new()
            } else {
                vec![found.join(", ")]
            }
        },
    });

    reg.register(Rule {
        id: "non-ascii-url",
        name: "URL contains non-ASCII characters",
        severity: Severity::Low,
        category: Category::Internal,
        tag: Tag::PotentialIssue,
        check: |ctx| {
            let mut to_check = decoded_path(ctx.url.path());
            if let Some(query) = ctx.url.query() {
                to_check.push('?');
                to_check.push_str(&decoded_path(query));
            }
            if to_check.chars().any(|c| c as u32 > 127) {
                vec![to_check]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "double-slash-url",
        name: "URL contains a double slash",
        severity: Severity::Low,
        category: Category::Internal,
        tag: Tag::Issue,
        check: |ctx| {
            let path = ctx.url.path();
            if path.contains("//") {
                vec![path.to_string()]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "uppercase-url",
        name: "URL contains upper case characters",
        severity: Severity::Medium,
        category: Category::Internal,
        tag: Tag::PotentialIssue,
        check: |ctx| {
            let path = decoded_path(ctx.url.path());
            if path.to_lowercase() != path {
                vec![path]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "whitespace-url",
        name: "URL contains whitespace",
        severity: Severity::Medium,
        category: Category::Internal,
        tag: Tag::Issue,
        check: |ctx| {
            let raw = ctx.url.path();
            let decoded = decoded_path(raw);
            if decoded.contains(' ') || raw.contains('+') || raw.to_lowercase().contains("%20") {
                vec![raw.to_string()]
            } else {
                Vec::new()
            }
        },
    });

    reg.register_site_rule(site_links::broken_crawl_error_rule());
}
