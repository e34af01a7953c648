use crate::{UrlError, UrlResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// A parsed URL as the crawler sees it.
///
/// Thin wrapper around [`url::Url`] that adds the site-mirroring semantics:
/// internal/external classification, URL-to-filesystem-path mapping, and
/// the normalization used by the crawl controller's visited set.
/// Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageUrl(::url::Url);

impl PageUrl {
    /// Parses a raw URL string.
    pub fn parse(raw: &str) -> UrlResult<Self> {
        let url = ::url::Url::parse(raw)
            .map_err(|e| UrlError::Parse(format!("could not parse url {}: {}", raw, e)))?;
        Ok(Self(url))
    }

    /// Wraps an already-parsed [`url::Url`].
    pub fn from_url(url: ::url::Url) -> Self {
        Self(url)
    }

    /// Returns the underlying parsed URL.
    pub fn as_url(&self) -> &::url::Url {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Hostname without the port, empty string when absent.
    pub fn hostname(&self) -> &str {
        self.0.host_str().unwrap_or("")
    }

    /// `host` or `host:port` as it appears in an absolute URL.
    pub fn authority(&self) -> String {
        match self.0.port() {
            Some(port) => format!("{}:{}", self.hostname(), port),
            None => self.hostname().to_string(),
        }
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.0.query()
    }

    /// Checks if the URL is internal to the given base URL.
    ///
    /// A URL with no host is internal; otherwise internality is strictly by
    /// hostname. Subdomains are different hosts.
    pub fn is_internal(&self, base: &PageUrl) -> bool {
        if self.hostname().is_empty() {
            return true;
        }
        self.hostname() == base.hostname()
    }

    /// Converts the URL's path to a filesystem path under `root`.
    ///
    /// `index.html` is appended when the path ends with `/` or its final
    /// segment has no extension. Query and fragment never participate.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        let path = self.0.path();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            out.push(segment);
        }

        let extensionless = path
            .rsplit('/')
            .next()
            .map(|last| !last.contains('.'))
            .unwrap_or(true);
        if path.ends_with('/') || extensionless {
            out.push("index.html");
        }
        out
    }

    /// Resolves a reference (possibly relative) against this URL.
    pub fn resolve(&self, reference: &str) -> UrlResult<PageUrl> {
        let joined = self.0.join(reference).map_err(|e| UrlError::Resolve {
            base: self.0.to_string(),
            reference: reference.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self(joined))
    }

    /// Returns the canonical string used by the crawl controller to
    /// deduplicate URLs.
    ///
    /// The fragment is stripped, the scheme is coerced to match the base
    /// URL's scheme, and a trailing `/` is removed from paths longer than
    /// the root path.
    pub fn normalized_key(&self, base: &PageUrl) -> String {
        let mut url = self.0.clone();
        url.set_fragment(None);
        let _ = url.set_scheme(base.0.scheme());

        let path = url.path().to_string();
        if path.len() > 1 {
            if let Some(stripped) = path.strip_suffix('/') {
                url.set_path(stripped);
            }
        }
        url.to_string()
    }

    /// Whether a page at this URL can be parsed for more links.
    ///
    /// True for extensionless paths and explicit `.html` files.
    pub fn is_html_like(&self) -> bool {
        let last = self.0.path().rsplit('/').next().unwrap_or("");
        match last.rsplit_once('.') {
            Some((_, ext)) => ext == "html",
            None => true,
        }
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> PageUrl {
        PageUrl::parse(raw).unwrap()
    }

    #[test]
    fn test_to_path_root() {
        assert_eq!(
            url("http://example.com/").to_path(Path::new("dist")),
            PathBuf::from("dist/index.html")
        );
        assert_eq!(
            url("http://example.com").to_path(Path::new("dist")),
            PathBuf::from("dist/index.html")
        );
    }

    #[test]
    fn test_to_path_trailing_slash() {
        assert_eq!(
            url("http://example.com/about/").to_path(Path::new("dist")),
            PathBuf::from("dist/about/index.html")
        );
        assert_eq!(
            url("http://example.com/some/deep/path/").to_path(Path::new("output")),
            PathBuf::from("output/some/deep/path/index.html")
        );
    }

    #[test]
    fn test_to_path_extensionless() {
        assert_eq!(
            url("http://example.com/contact").to_path(Path::new("dist")),
            PathBuf::from("dist/contact/index.html")
        );
        assert_eq!(
            url("http://example.com/some/deep/path").to_path(Path::new("output")),
            PathBuf::from("output/some/deep/path/index.html")
        );
    }

    #[test]
    fn test_to_path_with_extension() {
        assert_eq!(
            url("http://example.com/page.html").to_path(Path::new("dist")),
            PathBuf::from("dist/page.html")
        );
        assert_eq!(
            url("http://example.com/style.css").to_path(Path::new("dist")),
            PathBuf::from("dist/style.css")
        );
        assert_eq!(
            url("http://example.com/assets/app.js").to_path(Path::new("dist")),
            PathBuf::from("dist/assets/app.js")
        );
    }

    #[test]
    fn test_to_path_ignores_query() {
        assert_eq!(
            url("http://example.com/search?q=test").to_path(Path::new("dist")),
            PathBuf::from("dist/search/index.html")
        );
    }

    #[test]
    fn test_is_internal_same_host() {
        let base = url("https://example.com/");
        assert!(url("https://example.com/about").is_internal(&base));
        assert!(url("http://example.com/about").is_internal(&base));
    }

    #[test]
    fn test_is_internal_no_subdomain_wildcard() {
        let base = url("https://example.com/");
        assert!(!url("https://blog.example.com/").is_internal(&base));
        assert!(!url("https://other.com/").is_internal(&base));
    }

    #[test]
    fn test_normalized_key_strips_fragment() {
        let base = url("http://example.com/");
        assert_eq!(
            url("http://example.com/p#a").normalized_key(&base),
            url("http://example.com/p#b").normalized_key(&base)
        );
        assert_eq!(
            url("http://example.com/p#a").normalized_key(&base),
            "http://example.com/p"
        );
    }

    #[test]
    fn test_normalized_key_coerces_scheme() {
        let base = url("http://example.com/");
        assert_eq!(
            url("https://example.com/about").normalized_key(&base),
            url("http://example.com/about").normalized_key(&base)
        );
    }

    #[test]
    fn test_normalized_key_strips_trailing_slash() {
        let base = url("http://example.com/");
        assert_eq!(
            url("http://example.com/about/").normalized_key(&base),
            url("http://example.com/about").normalized_key(&base)
        );
        // The root path keeps its slash.
        assert_eq!(url("http://example.com/").normalized_key(&base), "http://example.com/");
    }

    #[test]
    fn test_display_round_trip() {
        for raw in [
            "http://example.com/",
            "https://example.com/a/b?x=1#frag",
            "http://example.com:8080/path",
        ] {
            let once = url(raw).to_string();
            let twice = url(&once).to_string();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_is_html_like() {
        assert!(url("http://example.com/").is_html_like());
        assert!(url("http://example.com/about").is_html_like());
        assert!(url("http://example.com/page.html").is_html_like());
        assert!(!url("http://example.com/style.css").is_html_like());
        assert!(!url("http://example.com/doc.pdf").is_html_like());
    }

    #[test]
    fn test_authority_includes_port() {
        assert_eq!(url("http://example.com/").authority(), "example.com");
        assert_eq!(url("http://127.0.0.1:4321/x").authority(), "127.0.0.1:4321");
    }
}
