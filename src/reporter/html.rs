//! HTML rendering for the SEO report

use crate::reporter::Report;

/// Renders the report as a self-contained HTML document.
pub fn render_report(report: &Report) -> String {
    let mut out = String::with_capacity(16 * 1024);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!(
        "<title>SEO report for {}</title>\n",
        escape(&report.site_url)
    ));
    out.push_str("<style>\n");
    out.push_str(STYLE);
    out.push_str("</style>\n</head>\n<body>\n");

    out.push_str(&format!("<h1>SEO report for {}</h1>\n", escape(&report.site_url)));
    out.push_str(&format!(
        "<p class=\"meta\">Generated at {}</p>\n",
        escape(&report.generated_at)
    ));

    let counts = report.lint_counts();
    out.push_str("<ul class=\"totals\">\n");
    out.push_str(&format!("<li><b>{}</b> pages</li>\n", report.pages.len()));
    out.push_str(&format!("<li><b>{}</b> images</li>\n", report.total_images()));
    out.push_str(&format!("<li><b>{}</b> findings</li>\n", report.total_lints()));
    for severity in ["critical", "high", "medium", "low"] {
        let count = counts.get(severity).copied().unwrap_or(0);
        out.push_str(&format!(
            "<li class=\"sev-{}\"><b>{}</b> {}</li>\n",
            severity, count, severity
        ));
    }
    out.push_str("</ul>\n");

    for page in &report.pages {
        out.push_str("<section class=\"page\">\n");
        out.push_str(&format!(
            "<h2><a href=\"{url}\">{url}</a> <span class=\"status\">HTTP {status}</span></h2>\n",
            url = escape(&page.url),
            status = page.status_code
        ));

        out.push_str("<dl>\n");
        out.push_str(&format!("<dt>Title</dt><dd>{}</dd>\n", escape(&page.title)));
        out.push_str(&format!(
            "<dt>Description</dt><dd>{}</dd>\n",
            escape(&page.description)
        ));
        if !page.canonical.is_empty() {
            out.push_str(&format!(
                "<dt>Canonical</dt><dd>{}</dd>\n",
                escape(&page.canonical)
            ));
        }
        out.push_str("</dl>\n");

        if !page.images.is_empty() {
            out.push_str("<h3>Images</h3>\n<table>\n<tr><th>URL</th><th>Alt</th><th>Size</th></tr>\n");
            for image in &page.images {
                out.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}x{}</td></tr>\n",
                    escape(&image.url),
                    escape(&image.alt),
                    escape(&image.width),
                    escape(&image.height)
                ));
            }
            out.push_str("</table>\n");
        }

        if !page.lints.is_empty() {
            out.push_str("<h3>Findings</h3>\n<table>\n");
            out.push_str("<tr><th>Severity</th><th>Category</th><th>Finding</th><th>Evidence</th></tr>\n");
            for lint in &page.lints {
                out.push_str(&format!(
                    "<tr class=\"sev-{sev}\"><td>{sev}</td><td>{cat}</td><td>{msg}</td><td>{ev}</td></tr>\n",
                    sev = lint.severity,
                    cat = lint.category,
                    msg = escape(lint.message),
                    ev = escape(&lint.evidence)
                ));
            }
            out.push_str("</table>\n");
        }

        out.push_str("</section>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2rem auto; max-width: 70rem; color: #222; }
h1 { border-bottom: 2px solid #ddd; padding-bottom: .5rem; }
.meta { color: #777; }
.totals { list-style: none; padding: 0; display: flex; gap: 1.5rem; }
.page { border: 1px solid #ddd; border-radius: 6px; padding: 1rem; margin: 1rem 0; }
.status { font-size: .8em; color: #777; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: .3rem .6rem; text-align: left; font-size: .9em; }
tr.sev-critical td:first-child { color: #b00020; font-weight: bold; }
tr.sev-high td:first-child { color: #d2691e; font-weight: bold; }
tr.sev-medium td:first-child { color: #b8860b; }
tr.sev-low td:first-child { color: #666; }
"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::PageReport;

    #[test]
    fn test_render_smoke() {
        let report = Report {
            site_url: "https://example.com".to_string(),
            generated_at: "2024-01-01 00:00:00".to_string(),
            pages: vec![PageReport {
                url: "https://example.com/".to_string(),
                title: "Home".to_string(),
                status_code: 200,
                lints: vec![crate::linter::registry()
                    .rule("missing-h1")
                    .unwrap()
                    .emit(String::new())],
                ..Default::default()
            }],
            ..Default::default()
        };

        let html = render_report(&report);
        assert!(html.contains("SEO report for https://example.com"));
        assert!(html.contains("https://example.com/"));
        assert!(html.contains("H1 tag is missing"));
        assert!(html.contains("HTTP 200"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&"#), "&lt;a href=&quot;x&quot;&gt;&amp;");
    }
}
