//! Outgoing link rules.

use crate::linter::rules::select;
use crate::linter::{Category, Registry, Rule, Severity, Tag};

/// Schemes that are valid in an href even though they are not web links.
const KNOWN_SCHEMES: &[&str] = &[
    "blob", "data", "file", "ftp", "http", "https", "javascript", "mailto", "resource", "ssh",
    "tel", "urn", "view-source", "ws", "wss",
];

/// Valid but unusual protocols for web links.
const NON_HTTP_SCHEMES: &[&str] = &[
    "ftp", "file", "ssh", "ws", "wss", "blob", "urn", "resource", "view-source",
];

fn is_windows_drive_path(href: &str) -> bool {
    let bytes = href.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

fn has_special_scheme(href: &str) -> bool {
    let lower = href.to_lowercase();
    lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
}

pub(crate) fn register(reg: &mut Registry) {
    reg.register(Rule {
        id: "localhost-link",
        name: "Has link with a URL referencing LocalHost or 127.0.0.1",
        severity: Severity::Critical,
        category: Category::Links,
        tag: Tag::Issue,
        check: |ctx| {
            select(&ctx.doc, "a[href]")
                .iter()
                .filter_map(|a| {
                    let href = a.value().attr("href")?;
                    let lower = href.to_lowercase();
                    if lower.contains("://localhost") || lower.contains("://127.0.0.1") {
                        Some(href.to_string())
                    } else {
                        None
                    }
                })
                .collect()
        },
    });

    reg.register(Rule {
        id: "local-file-link",
        name: "Has link with a URL referencing a local or UNC file path",
        severity: Severity::Critical,
        category: Category::Links,
        tag: Tag::Issue,
        check: |ctx| {
            select(&ctx.doc, "a[href]")
                .iter()
                .filter_map(|a| {
                    let href = a.value().attr("href")?;
                    let is_local = href.starts_with("\\\\")
                        || href.to_lowercase().starts_with("file://")
                        || is_windows_drive_path(href);
                    if is_local {
                        Some(href.to_string())
                    } else {
                        None
                    }
                })
                .collect()
        },
    });

    reg.register(Rule {
        id: "whitespace-href",
        name: "Has a link with whitespace in href attribute",
        severity: Severity::High,
        category: Category::Links,
        tag: Tag::Issue,
        check: |ctx| {
            select(&ctx.doc, "a[href]")
                .iter()
                .filter_map(|a| {
                    let href = a.value().attr("href")?;
                    if !href.is_empty() && href.trim() != href {
                        Some(href.to_string())
                    } else {
                        None
                    }
                })
                .collect()
        },
    });

    reg.register(Rule {
        id: "no-outgoing-links",
        name: "Has no outgoing links",
        severity: Severity::High,
        category: Category::Links,
        tag: Tag::PotentialIssue,
        check: |ctx| {
            let has_valid_link = select(&ctx.doc, "a[href]").iter().any(|a| {
                let href = a.value().attr("href").unwrap_or("").trim();
                !href.is_empty() && !href.starts_with('#') && !has_special_scheme(href)
            });
            if has_valid_link {
                Vec::new()
            } else {
                vec![String::new()]
            }
        },
    });

    reg.register(Rule {
        id: "malformed-href",
        name: "Has outgoing links with malformed href data",
        severity: Severity::High,
        category: Category::Links,
        tag: Tag::Issue,
        check: |ctx| {
            select(&ctx.doc, "a[href]")
                .iter()
                .filter_map(|a| {
                    let href = a.value().attr("href")?.trim();
                    if href.is_empty() || href.starts_with('#') || has_special_scheme(href) {
                        return None;
                    }

                    match ::url::Url::parse(href) {
                        Ok(parsed) => {
                            let scheme = parsed.scheme();
                            if scheme == "http" || scheme == "https" {
                                if parsed.host_str().unwrap_or("").is_empty() {
                                    return Some(href.to_string());
                                }
                            } else if !KNOWN_SCHEMES.contains(&scheme) {
                                return Some(href.to_string());
                            }
                            None
                        }
                        // A relative reference is fine; anything else is
                        // genuinely malformed.
                        Err(::url::ParseError::RelativeUrlWithoutBase) => None,
                        Err(_) => Some(href.to_string()),
                    }
                })
                .collect()
        },
    });

    reg.register(Rule {
        id: "non-http-protocol",
        name: "Has link to a non-HTTP protocol",
        severity: Severity::High,
        category: Category::Links,
        tag: Tag::PotentialIssue,
        check: |ctx| {
            select(&ctx.doc, "a[href]")
                .iter()
                .filter_map(|a| {
                    let href = a.value().attr("href")?.trim();
                    let parsed = ::url::Url::parse(href).ok()?;
                    if NON_HTTP_SCHEMES.contains(&parsed.scheme()) {
                        Some(href.to_string())
                    } else {
                        None
                    }
                })
                .collect()
        },
    });
}

#[cfg(test)]
mod tests {
    use crate::linter::testutil::run_rule;

    const URL: &str = "https://example.com/";

    #[test]
    fn test_localhost_link() {
        let html = r#"<html><body>
            <a href="http://localhost:3000/dev">dev</a>
            <a href="https://127.0.0.1/admin">admin</a>
            <a href="https://example.com/ok">ok</a>
        </body></html>"#;
        assert_eq!(run_rule("localhost-link", html, URL).len(), 2);
    }

    #[test]
    fn test_local_file_link() {
        let html = r#"<html><body>
            <a href="\\server\share\doc">unc</a>
            <a href="file:///etc/passwd">file</a>
            <a href="C:\Users\me\doc.html">drive</a>
            <a href="/fine">fine</a>
        </body></html>"#;
        assert_eq!(run_rule("local-file-link", html, URL).len(), 3);
    }

    #[test]
    fn test_whitespace_href() {
        let html = r#"<html><body><a href=" /padded ">padded</a><a href="/ok">ok</a></body></html>"#;
        let lints = run_rule("whitespace-href", html, URL);
        assert_eq!(lints.len(), 1);
        assert_eq!(lints[0].evidence, " /padded ");
    }

    #[test]
    fn test_no_outgoing_links() {
        let html = r##"<html><body>
            <a href="#top">top</a>
            <a href="javascript:void(0)">js</a>
            <a href="mailto:a@b.c">mail</a>
        </body></html>"##;
        assert_eq!(run_rule("no-outgoing-links", html, URL).len(), 1);

        let html = r#"<html><body><a href="/somewhere">go</a></body></html>"#;
        assert!(run_rule("no-outgoing-links", html, URL).is_empty());
    }

    #[test]
    fn test_malformed_href() {
        let html = r#"<html><body>
            <a href="http://">no host</a>
            <a href="gibberish://x">unknown scheme</a>
            <a href="/relative">relative is fine</a>
            <a href="https://example.com/abs">absolute is fine</a>
            <a href="ftp://example.com/f">known scheme is fine</a>
        </body></html>"#;
        assert_eq!(run_rule("malformed-href", html, URL).len(), 2);
    }

    #[test]
    fn test_non_http_protocol() {
        let html = r#"<html><body>
            <a href="ftp://example.com/f">ftp</a>
            <a href="ssh://example.com">ssh</a>
            <a href="wss://example.com/socket">wss</a>
            <a href="https://example.com/ok">ok</a>
            <a href="mailto:a@b.c">mail</a>
        </body></html>"#;
        assert_eq!(run_rule("non-http-protocol", html, URL).len(), 3);
    }
}
