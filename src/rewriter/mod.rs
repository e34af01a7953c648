//! Mirror URL rewriter
//!
//! Walks the mirror directory and replaces absolute URLs pointing at files
//! that exist in the mirror with root-relative paths, so the exported site
//! is self-contained. The rewrite is textual, not AST-based: a single
//! scanner handles HTML, XML sitemaps, JSON, and inline scripts alike,
//! and links to pages the crawl did not capture stay visibly absolute.
//!
//! A `norewrite` token in the query string keeps a URL absolute; the token
//! itself is stripped from the output.

use crate::url::PageUrl;
use crate::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Bytes that end a URL run in the textual scan.
fn is_terminator(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b'<' | b'>' | b'"' | b'\'')
}

/// Rewrites absolute URLs in a mirror directory to root-relative ones.
pub struct Rewriter {
    output_dir: PathBuf,
    base_url: PageUrl,
}

impl Rewriter {
    pub fn new(output_dir: impl Into<PathBuf>, base_url: PageUrl) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_url,
        }
    }

    /// Indexes the mirror, then rewrites every file once. Files are written
    /// back only when their content changed, so a second run is a no-op.
    pub fn run(&self) -> Result<()> {
        let index = self.build_index()?;
        let prefix = format!("{}://{}", self.base_url.scheme(), self.base_url.authority());

        for entry in WalkDir::new(&self.output_dir) {
            let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let content = std::fs::read(entry.path())?;
            let rewritten = rewrite_content(&content, &prefix, &index);
            if rewritten != content {
                std::fs::write(entry.path(), rewritten)?;
                tracing::debug!("rewrote {}", entry.path().display());
            }
        }

        Ok(())
    }

    /// Records every file's URL path; `index.html` files also get their
    /// directory form, so both `/a/b/index.html` and `/a/b/` resolve.
    fn build_index(&self) -> Result<HashSet<String>> {
        let mut index = HashSet::new();

        for entry in WalkDir::new(&self.output_dir) {
            let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.output_dir)
                .unwrap_or(entry.path());
            let url_path = format!("/{}", path_to_url(relative));

            if entry.file_name() == "index.html" {
                let dir_form = url_path
                    .strip_suffix("index.html")
                    .unwrap_or(&url_path)
                    .to_string();
                index.insert(dir_form);
            }
            index.insert(url_path);
        }

        Ok(index)
    }
}

fn path_to_url(path: &Path) -> String {
    path.iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Scans content for `<prefix><url-run>` occurrences and applies the
/// rewrite rules to each.
fn rewrite_content(content: &[u8], prefix: &str, index: &HashSet<String>) -> Vec<u8> {
    let needle = prefix.as_bytes();
    let mut out = Vec::with_capacity(content.len());
    let mut pos = 0;

    while pos < content.len() {
        if content[pos..].starts_with(needle) {
            let run_start = pos + needle.len();
            let mut run_end = run_start;
            while run_end < content.len() && !is_terminator(content[run_end]) {
                run_end += 1;
            }

            match relativize(&content[run_start..run_end], prefix, index) {
                Some(replacement) => out.extend_from_slice(replacement.as_bytes()),
                None => out.extend_from_slice(&content[pos..run_end]),
            }
            pos = run_end;
        } else {
            out.push(content[pos]);
            pos += 1;
        }
    }

    out
}

/// Decides what one absolute URL occurrence becomes.
///
/// Returns the full replacement text, or `None` to leave the occurrence
/// untouched.
fn relativize(run: &[u8], prefix: &str, index: &HashSet<String>) -> Option<String> {
    let run = std::str::from_utf8(run).ok()?;

    let (before_fragment, fragment) = match run.find('#') {
        Some(i) => run.split_at(i),
        None => (run, ""),
    };
    let (path, query) = match before_fragment.find('?') {
        Some(i) => before_fragment.split_at(i),
        None => (before_fragment, ""),
    };
    let path = if path.is_empty() { "/" } else { path };

    let (stripped_query, had_norewrite) = strip_norewrite(query);

    if !index.contains(path) {
        return None;
    }

    if had_norewrite {
        // The URL is meant to stay absolute; only the token goes away.
        Some(format!("{}{}{}{}", prefix, path, stripped_query, fragment))
    } else {
        Some(format!("{}{}{}", path, query, fragment))
    }
}

/// Removes a whole `norewrite` token from a query string (including the
/// leading `?`). Returns the cleaned query and whether the token was
/// present.
fn strip_norewrite(query: &str) -> (String, bool) {
    let Some(raw) = query.strip_prefix('?') else {
        return (query.to_string(), false);
    };

    let mut found = false;
    let kept: Vec<&str> = raw
        .split('&')
        .filter(|token| {
            if *token == "norewrite" {
                found = true;
                false
            } else {
                true
            }
        })
        .collect();

    if !found {
        return (query.to_string(), false);
    }
    if kept.is_empty() {
        (String::new(), true)
    } else {
        (format!("?{}", kept.join("&")), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(files: &[(&str, &str)]) -> (tempfile::TempDir, Rewriter) {
        let dir = tempfile::tempdir().expect("temp dir");
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("mkdir");
            }
            std::fs::write(path, content).expect("write fixture");
        }
        let base = PageUrl::parse("http://example.com").unwrap();
        let rewriter = Rewriter::new(dir.path(), base);
        (dir, rewriter)
    }

    fn read(dir: &tempfile::TempDir, name: &str) -> String {
        String::from_utf8(std::fs::read(dir.path().join(name)).expect("read")).expect("utf8")
    }

    #[test]
    fn test_rewrites_existing_targets_only() {
        let (dir, rewriter) = setup(&[
            (
                "index.html",
                concat!(
                    "<html><head><link href=\"http://example.com/style.css\"></head><body>\n",
                    "<a href=\"http://example.com/about.html\">About</a>\n",
                    "<a href=\"http://example.com/contact/\">Contact</a>\n",
                    "<a href=\"http://external.com/page\">External</a>\n",
                    "<a href=\"http://example.com/missing.html\">Missing</a>\n",
                    "</body></html>",
                ),
            ),
            ("style.css", "body { color: blue; }"),
            ("about.html", "<h1>About</h1>"),
            ("contact/index.html", "<h1>Contact</h1>"),
        ]);

        rewriter.run().expect("rewrite");
        let html = read(&dir, "index.html");

        assert!(html.contains(r#"href="/style.css""#));
        assert!(html.contains(r#"href="/about.html""#));
        assert!(html.contains(r#"href="/contact/""#));
        assert!(html.contains(r#"href="http://external.com/page""#));
        assert!(html.contains(r#"href="http://example.com/missing.html""#));
    }

    #[test]
    fn test_rewrites_sitemap() {
        let (dir, rewriter) = setup(&[
            ("index.html", "<h1>Home</h1>"),
            ("about.html", "<h1>About</h1>"),
            ("contact/index.html", "<h1>Contact</h1>"),
            (
                "sitemap.xml",
                concat!(
                    "<?xml version=\"1.0\"?>\n<urlset>\n",
                    "<url><loc>http://example.com/</loc></url>\n",
                    "<url><loc>http://example.com/about.html</loc></url>\n",
                    "<url><loc>http://example.com/contact/</loc></url>\n",
                    "</urlset>",
                ),
            ),
        ]);

        rewriter.run().expect("rewrite");
        let sitemap = read(&dir, "sitemap.xml");

        assert!(sitemap.contains("<loc>/</loc>"));
        assert!(sitemap.contains("<loc>/about.html</loc>"));
        assert!(sitemap.contains("<loc>/contact/</loc>"));
    }

    #[test]
    fn test_norewrite_token() {
        let (dir, rewriter) = setup(&[
            (
                "index.html",
                concat!(
                    "<a href=\"http://example.com/about.html?norewrite\">Keep absolute</a>\n",
                    "<a href=\"http://example.com/about.html\">Make relative</a>\n",
                    "<a href=\"http://example.com/about.html?norewrite&foo=bar\">Keep with params</a>\n",
                    "<a href=\"http://example.com/about.html?foo=bar&norewrite\">Keep with params before</a>\n",
                ),
            ),
            ("about.html", "<h1>About</h1>"),
        ]);

        rewriter.run().expect("rewrite");
        let html = read(&dir, "index.html");

        assert!(html.contains(r#"href="http://example.com/about.html""#));
        assert!(html.contains(r#"href="/about.html""#));
        assert!(html.contains(r#"href="http://example.com/about.html?foo=bar""#));
        assert!(!html.contains("norewrite"));
    }

    #[test]
    fn test_norewrite_with_missing_target_untouched() {
        let (dir, rewriter) = setup(&[(
            "index.html",
            r#"<a href="http://example.com/gone.html?norewrite">Gone</a>"#,
        )]);

        rewriter.run().expect("rewrite");
        let html = read(&dir, "index.html");
        assert!(html.contains("http://example.com/gone.html?norewrite"));
    }

    #[test]
    fn test_query_and_fragment_preserved() {
        let (dir, rewriter) = setup(&[
            (
                "index.html",
                r#"<a href="http://example.com/about.html?a=1&b=2#team">About</a>"#,
            ),
            ("about.html", "<h1>About</h1>"),
        ]);

        rewriter.run().expect("rewrite");
        let html = read(&dir, "index.html");
        assert!(html.contains(r##"href="/about.html?a=1&b=2#team""##));
    }

    #[test]
    fn test_idempotent() {
        let (dir, rewriter) = setup(&[
            (
                "index.html",
                concat!(
                    "<a href=\"http://example.com/about.html\">About</a>\n",
                    "<a href=\"http://example.com/missing.html\">Missing</a>\n",
                ),
            ),
            ("about.html", "<h1>About</h1>"),
        ]);

        rewriter.run().expect("first run");
        let first = std::fs::read(dir.path().join("index.html")).expect("read");
        rewriter.run().expect("second run");
        let second = std::fs::read(dir.path().join("index.html")).expect("read");
        assert_eq!(first, second);
    }

    #[test]
    fn test_host_with_port() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join("index.html"),
            r#"<a href="http://127.0.0.1:8080/about.html">About</a>"#,
        )
        .expect("write");
        std::fs::write(dir.path().join("about.html"), "hi").expect("write");

        let base = PageUrl::parse("http://127.0.0.1:8080").unwrap();
        Rewriter::new(dir.path(), base).run().expect("rewrite");

        let html = String::from_utf8(std::fs::read(dir.path().join("index.html")).unwrap()).unwrap();
        assert!(html.contains(r#"href="/about.html""#));
    }

    #[test]
    fn test_strip_norewrite() {
        assert_eq!(strip_norewrite("?norewrite"), (String::new(), true));
        assert_eq!(
            strip_norewrite("?norewrite&foo=bar"),
            ("?foo=bar".to_string(), true)
        );
        assert_eq!(
            strip_norewrite("?foo=bar&norewrite"),
            ("?foo=bar".to_string(), true)
        );
        assert_eq!(strip_norewrite("?foo=bar"), ("?foo=bar".to_string(), false));
        assert_eq!(strip_norewrite(""), (String::new(), false));
    }
}
