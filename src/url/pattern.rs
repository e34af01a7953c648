use std::fmt;

/// A URL path pattern for matching against request paths.
///
/// Patterns are slash-separated with two wildcards:
///
/// - `*` matches exactly one path segment.
/// - `**` matches zero or more path segments.
///
/// Leading and trailing slashes are ignored on both the pattern and the
/// candidate. The empty pattern matches the empty path and `/`.
///
/// Examples:
///
/// - `/posts/*` matches `/posts/my-first-post` but not `/posts/a/b` or `/posts/`.
/// - `/posts/**` matches `/posts/my-first-post`, `/posts/a/b`, and `/posts/`.
/// - `/**/secret` matches `/top/secret` and `/secret`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern(String);

impl PathPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Checks whether `candidate` matches this pattern.
    ///
    /// Two-pointer scan with a backtrack checkpoint at the most recently
    /// passed `**`: on mismatch the pattern pointer rewinds to one past the
    /// last `**` and the saved candidate position advances by one, so `**`
    /// consumes one more segment. Total over any input.
    pub fn matches(&self, candidate: &str) -> bool {
        let pattern = self.0.trim_matches('/');
        let path = candidate.trim_matches('/');

        let p_segs: Vec<&str> = pattern.split('/').collect();
        let s_segs: Vec<&str> = path.split('/').collect();

        let mut p_idx = 0;
        let mut s_idx = 0;
        // Position of the last `**` in the pattern, and the candidate
        // position we are trying to match from.
        let mut star_idx: Option<usize> = None;
        let mut s_tmp_idx = 0;

        while s_idx < s_segs.len() {
            if p_idx < p_segs.len() && (p_segs[p_idx] == "*" || p_segs[p_idx] == s_segs[s_idx]) {
                p_idx += 1;
                s_idx += 1;
                continue;
            }

            if p_idx < p_segs.len() && p_segs[p_idx] == "**" {
                star_idx = Some(p_idx);
                s_tmp_idx = s_idx;
                p_idx += 1;
                continue;
            }

            if let Some(star) = star_idx {
                p_idx = star + 1;
                s_tmp_idx += 1;
                s_idx = s_tmp_idx;
                continue;
            }

            return false;
        }

        // The candidate is exhausted; the rest of the pattern must be `**`s,
        // which can match an empty sequence.
        while p_idx < p_segs.len() && p_segs[p_idx] == "**" {
            p_idx += 1;
        }

        p_idx == p_segs.len()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PathPattern {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PathPattern {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A collection of path patterns.
#[derive(Debug, Clone, Default)]
pub struct PathPatterns(Vec<PathPattern>);

impl PathPatterns {
    pub fn new(patterns: Vec<PathPattern>) -> Self {
        Self(patterns)
    }

    pub fn from_strings<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self(patterns.iter().map(|p| PathPattern::new(p.as_ref())).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks whether the candidate matches any pattern in the collection.
    pub fn match_any(&self, candidate: &str) -> bool {
        self.0.iter().any(|p| p.matches(candidate))
    }
}

impl fmt::Display for PathPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", joined.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(pattern: &str, path: &str, want: bool) {
        let got = PathPattern::new(pattern).matches(path);
        assert_eq!(got, want, "PathPattern({:?}).matches({:?})", pattern, path);
    }

    #[test]
    fn test_exact_matches() {
        check("/posts/a-post", "/posts/a-post", true);
        check("posts/a-post/", "/posts/a-post", true);
        check("/articles/*", "/posts/my-post", false);
    }

    #[test]
    fn test_single_star() {
        check("/posts/*", "/posts/my-first-post", true);
        check("/posts/*", "/posts/123", true);
        check("/posts/*", "/posts/a/b", false);
        check("/posts/*", "/posts/", false);
        check("*/posts", "anything/posts", true);
        check("/posts/*/comments", "/posts/123/comments", true);
        check("/posts/*/comments", "/posts/123/author", false);
        check("/*/secret", "/admin/secret", true);
        check("/*/secret", "/a/b/secret", false);
    }

    #[test]
    fn test_double_star_terminal() {
        check("/internal/**", "/internal/page", true);
        check("/internal/**", "/internal/sub/page", true);
        check("/internal/**", "/internal/", true);
        check("/internal/**", "/internal", true);
        check("/internal/**", "/internal-affairs/page", false);
        check("/posts/**", "/posts/2024/x", true);
        check("/a/b/**", "/a", false);
    }

    #[test]
    fn test_double_star_leading_and_middle() {
        check("**/secret.html", "/api/v1/secret.html", true);
        check("**/secret.html", "/secret.html", true);
        check("/api/**/data", "/api/v1/users/data", true);
        check("/api/**/data", "/api/data", true);
        check("/api/**/data", "/api/v1/users/metadata", false);
        check("/a/**/b/**/c", "/a/x/y/b/z/c", true);
        check("/a/**/**/c", "/a/b/c", true);
    }

    #[test]
    fn test_double_star_alone() {
        check("**", "/any/thing/at/all", true);
        check("**", "/", true);
        check("**", "", true);
    }

    #[test]
    fn test_edge_cases() {
        check("/", "/", true);
        check("/", "", true);
        check("/", "/posts", false);
        check("", "/", true);
        check("", "", true);
        check("*", "", true);
        check("a/b", "", false);
    }

    #[test]
    fn test_match_any() {
        let patterns = PathPatterns::from_strings(&["/posts/**", "/about"]);
        assert!(patterns.match_any("/posts/2024/x"));
        assert!(patterns.match_any("/about"));
        assert!(!patterns.match_any("/contact"));

        let empty = PathPatterns::default();
        assert!(!empty.match_any("/anything"));
    }
}
