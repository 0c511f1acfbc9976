//! The path-match, domain-match, and default-path rules of RFC 6265 §5.1.

/// Whether `request_path` falls under the cookie path `cookie_path`.
///
/// True on equality, or when `request_path` starts with `cookie_path` and
/// either `cookie_path` ends in `/` or the first character of `request_path`
/// past the prefix is `/`.
///
/// # Example
///
/// ```rust
/// use setcookie::path_matches;
///
/// assert!(path_matches("/label1/label2", "/label1"));
/// assert!(!path_matches("/label1/label2", "/label"));
/// assert!(path_matches("/a", "/"));
/// ```
pub fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }

    if !request_path.starts_with(cookie_path) {
        return false;
    }

    cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/')
}

/// Whether `request_domain` is covered by the cookie domain `cookie_domain`:
/// case-insensitive equality, or `request_domain` ends with
/// `"." + cookie_domain`.
///
/// # Example
///
/// ```rust
/// use setcookie::domain_matches;
///
/// assert!(domain_matches("youtube.com", "youtube.com"));
/// assert!(domain_matches("www.youtube.com", "youtube.com"));
/// assert!(!domain_matches("yyoutube.com", "youtube.com"));
/// ```
pub fn domain_matches(request_domain: &str, cookie_domain: &str) -> bool {
    if request_domain.eq_ignore_ascii_case(cookie_domain) {
        return true;
    }

    if request_domain.len() <= cookie_domain.len() {
        return false;
    }

    let split = request_domain.len() - cookie_domain.len();
    request_domain.as_bytes()[split - 1] == b'.'
        && request_domain[split..].eq_ignore_ascii_case(cookie_domain)
}

/// Computes the default cookie path from a request URI path: `/` when the
/// path is empty, does not start with `/`, or contains no `/` past the first
/// character; otherwise the path truncated before its final `/`.
///
/// # Example
///
/// ```rust
/// use setcookie::default_path;
///
/// assert_eq!(default_path(""), "/");
/// assert_eq!(default_path("/a"), "/");
/// assert_eq!(default_path("/a/b"), "/a");
/// assert_eq!(default_path("/a/b/"), "/a/b");
/// ```
pub fn default_path(uri_path: &str) -> String {
    if uri_path.is_empty() || !uri_path.starts_with('/') {
        return "/".to_string();
    }

    match uri_path[1..].rfind('/') {
        Some(idx) => uri_path[..idx + 1].to_string(),
        None => "/".to_string(),
    }
}
