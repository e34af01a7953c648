//! Redirect chain rules.

use crate::linter::{Category, Registry, Rule, Severity, Tag};

pub(crate) fn register(reg: &mut Registry) {
    reg.register(Rule {
        id: "redirects-to-self",
        name: "Internal URL redirects back to itself",
        severity: Severity::High,
        category: Category::Redirects,
        tag: Tag::Issue,
        check: |ctx| {
            if ctx.redirect_chain.is_empty() {
                return Vec::new();
            }
            let page_url = ctx.url.to_string();
            ctx.redirect_chain
                .iter()
                .find(|hop| hop.url == page_url)
                .map(|hop| vec![hop.url.clone()])
                .unwrap_or_default()
        },
    });

    reg.register(Rule {
        id: "redirect-broken",
        name: "URL redirect broken (4XX or 5XX)",
        severity: Severity::High,
        category: Category::Redirects,
        tag: Tag::Issue,
        check: |ctx| {
            if !ctx.redirect_chain.is_empty() && ctx.status_code >= 400 {
                vec![format!("redirected to {}", ctx.status_code)]
            } else {
                Vec::new()
            }
        },
    });
}

#[cfg(test)]
mod tests {
    use crate::linter::testutil::run_rule_with;
    use crate::crawler::Redirect;
    use crate::linter::CheckOptions;

    const HTML: &str = "<html><body>x</body></html>";

    #[test]
    fn test_redirects_to_self() {
        // /a -> /b -> /a, final status 200 at /a.
        let chain = vec![
            Redirect { url: "https://example.com/a".to_string(), status: 301 },
            Redirect { url: "https://example.com/b".to_string(), status: 302 },
        ];
        let opts = CheckOptions { status_code: 200, redirect_chain: &chain };
        let lints = run_rule_with("redirects-to-self", HTML, "https://example.com/a", opts);
        assert_eq!(lints.len(), 1);
        assert_eq!(lints[0].evidence, "https://example.com/a");
    }

    #[test]
    fn test_redirects_to_self_requires_chain() {
        let opts = CheckOptions { status_code: 200, redirect_chain: &[] };
        assert!(run_rule_with("redirects-to-self", HTML, "https://example.com/a", opts).is_empty());
    }

    #[test]
    fn test_redirect_broken() {
        let chain = vec![Redirect { url: "https://example.com/old".to_string(), status: 301 }];
        let opts = CheckOptions { status_code: 404, redirect_chain: &chain };
        let lints = run_rule_with("redirect-broken", HTML, "https://example.com/old", opts);
        assert_eq!(lints.len(), 1);
        assert_eq!(lints[0].evidence, "redirected to 404");

        let opts = CheckOptions { status_code: 404, redirect_chain: &[] };
        assert!(run_rule_with("redirect-broken", HTML, "https://example.com/old", opts).is_empty());
    }
}
