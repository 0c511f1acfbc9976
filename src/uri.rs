//! Decomposition of URI strings into their generic components (RFC 3986).
//!
//! Only the pieces cookie handling needs are modeled: scheme, userinfo, an
//! IPv4 literal or a host split into labels, port, path, query pairs, and
//! fragment. Errors here are fatal; unlike cookie attributes, a URI that
//! cannot be interpreted aborts the whole operation.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// Errors that can occur while parsing a URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriError {
    /// The string did not contain a `scheme://` prefix.
    MissingScheme,
    /// The scheme contained an invalid character.
    InvalidScheme,
    /// The authority contained no host.
    MissingHost,
    /// The port was empty, non-numeric, or out of range.
    InvalidPort,
    /// A query segment did not contain a `=`.
    MalformedQuery,
    /// The host was a bracketed IPv6 literal, which is not supported.
    Ipv6Unsupported,
}

impl UriError {
    /// Returns a description of this error as a string.
    pub fn as_str(&self) -> &'static str {
        match *self {
            UriError::MissingScheme => "the URI is missing a scheme",
            UriError::InvalidScheme => "the URI scheme contains an invalid character",
            UriError::MissingHost => "the URI authority contains no host",
            UriError::InvalidPort => "the URI port is not a number between 0 and 65535",
            UriError::MalformedQuery => "a query segment is missing a `=`",
            UriError::Ipv6Unsupported => "IPv6 literal hosts are not supported",
        }
    }
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error for UriError {}

/// A decomposed URI.
///
/// Exactly one of the IP literal and the host labels is set. The path is kept
/// as parsed: empty means "no path specified" and is distinct from `/`; any
/// non-empty path starts with `/`, and [`Uri::set_path()`] re-applies that
/// normalization on every assignment.
///
/// # Example
///
/// ```rust
/// use setcookie::Uri;
///
/// let uri = Uri::parse("https://user@127.0.0.1:8080/a/b?k=v#top").unwrap();
/// assert_eq!(uri.scheme(), "https");
/// assert_eq!(uri.userinfo(), Some("user"));
/// assert_eq!(uri.ip(), Some("127.0.0.1"));
/// assert_eq!(uri.port(), Some(8080));
/// assert_eq!(uri.path(), "/a/b");
/// assert_eq!(uri.query().get("k").map(|v| v.as_str()), Some("v"));
/// assert_eq!(uri.fragment(), Some("top"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Uri {
    scheme: String,
    ip: Option<String>,
    host: Option<Vec<String>>,
    port: Option<u16>,
    userinfo: Option<String>,
    path: String,
    query: HashMap<String, String>,
    fragment: Option<String>,
}

impl Uri {
    /// Parses a URI string into its components.
    ///
    /// The string must carry a `scheme://authority` prefix. The host is first
    /// tested as a dotted-decimal IPv4 literal and otherwise split on `.`
    /// into labels. Query segments must be `key=value` pairs; a segment
    /// without `=` fails the whole parse. Bracketed IPv6 hosts are reported
    /// as the distinct [`UriError::Ipv6Unsupported`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use setcookie::Uri;
    ///
    /// let uri = Uri::parse("http://example.com").unwrap();
    /// assert_eq!(uri.host(), Some(&["example".to_string(), "com".to_string()][..]));
    /// assert_eq!(uri.path(), "");
    /// assert_eq!(uri.domain(), "example.com");
    /// ```
    pub fn parse(s: &str) -> Result<Uri, UriError> {
        let (scheme, rest) = match s.find("://") {
            Some(idx) => (&s[..idx], &s[idx + 3..]),
            None => return Err(UriError::MissingScheme),
        };

        if !is_valid_scheme(scheme) {
            return Err(UriError::InvalidScheme);
        }

        let (rest, fragment) = match rest.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (rest, None),
        };

        let (rest, query_string) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };

        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => (Some(userinfo), host_port),
            None => (None, authority),
        };

        if host_port.starts_with('[') {
            return Err(UriError::Ipv6Unsupported);
        }

        let (host_string, port) = match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(parse_port(port)?)),
            None => (host_port, None),
        };

        if host_string.is_empty() {
            return Err(UriError::MissingHost);
        }

        let (ip, host) = if is_ipv4_literal(host_string) {
            (Some(host_string.to_string()), None)
        } else {
            let labels = host_string.split('.').map(str::to_string).collect();
            (None, Some(labels))
        };

        let mut query = HashMap::new();
        if let Some(query_string) = query_string {
            for segment in query_string.split('&').filter(|s| !s.is_empty()) {
                let (key, value) = segment.split_once('=').ok_or(UriError::MalformedQuery)?;
                // Duplicate keys keep the last occurrence.
                query.insert(key.to_string(), value.to_string());
            }
        }

        Ok(Uri {
            scheme: scheme.to_string(),
            ip,
            host,
            port,
            userinfo: userinfo.map(str::to_string),
            path: path.to_string(),
            query,
            fragment: fragment.filter(|f| !f.is_empty()).map(str::to_string),
        })
    }

    /// Returns the scheme of `self`.
    #[inline]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the IPv4 literal of `self`, if the host was one.
    #[inline]
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    /// Returns the host labels of `self`, if the host was not an IP literal.
    #[inline]
    pub fn host(&self) -> Option<&[String]> {
        self.host.as_deref()
    }

    /// Returns the port of `self`, if one was specified.
    #[inline]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the userinfo of `self`, if one was specified.
    #[inline]
    pub fn userinfo(&self) -> Option<&str> {
        self.userinfo.as_deref()
    }

    /// Returns the path of `self`. Empty means no path was specified.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query pairs of `self`.
    #[inline]
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Returns the fragment of `self`, if one was specified.
    #[inline]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Replaces the path of `self`, re-applying the leading-slash
    /// normalization: a non-empty path that does not start with `/` gets one
    /// prepended, and an empty path stays empty.
    ///
    /// # Example
    ///
    /// ```rust
    /// use setcookie::Uri;
    ///
    /// let mut uri = Uri::parse("https://google.com/path").unwrap();
    /// uri.set_path("new/path");
    /// assert_eq!(uri.path(), "/new/path");
    ///
    /// uri.set_path("");
    /// assert_eq!(uri.path(), "");
    /// assert_eq!(uri.to_string(), "https://google.com/");
    /// ```
    pub fn set_path(&mut self, path: &str) {
        if !path.is_empty() && !path.starts_with('/') {
            self.path = format!("/{}", path);
        } else {
            self.path = path.to_string();
        }
    }

    /// Returns the registrable host of `self`: the IP literal, or the host
    /// labels joined with `.`. This is the value cookies without a `Domain`
    /// attribute are bound to.
    pub fn domain(&self) -> String {
        match self.ip {
            Some(ref ip) => ip.clone(),
            None => match self.host {
                Some(ref labels) => labels.join("."),
                // Unreachable: exactly one of `ip`/`host` is always set.
                None => String::new(),
            },
        }
    }

    /// Renders the authority of `self`: `[userinfo@]host[:port]`.
    fn authority(&self) -> String {
        let mut authority = String::new();
        if let Some(ref userinfo) = self.userinfo {
            authority.push_str(userinfo);
            authority.push('@');
        }
        authority.push_str(&self.domain());
        if let Some(port) = self.port {
            authority.push(':');
            authority.push_str(&port.to_string());
        }
        authority
    }

    /// Resolves a relative reference against `self`, producing a new `Uri`.
    ///
    /// A network-path reference (`//host/...`) keeps only the scheme and
    /// replaces everything else. An absolute-path reference (`/path...`)
    /// keeps the scheme and authority and replaces the path, query, and
    /// fragment. Any other reference is merged onto the directory of the
    /// base path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use setcookie::Uri;
    ///
    /// let base = Uri::parse("https://google.com/path?name=test").unwrap();
    ///
    /// let moved = base.join("//test.com/path?name=test").unwrap();
    /// assert_eq!(moved.to_string(), "https://test.com/path?name=test");
    ///
    /// let repathed = base.join("/newpath#asd").unwrap();
    /// assert_eq!(repathed.to_string(), "https://google.com/newpath#asd");
    /// ```
    pub fn join(&self, reference: &str) -> Result<Uri, UriError> {
        if let Some(rest) = reference.strip_prefix("//") {
            return Uri::parse(&format!("{}://{}", self.scheme, rest));
        }

        let reference = if reference.starts_with('/') {
            reference.to_string()
        } else {
            // Merge a bare relative path onto the base path's directory.
            let mut directory = self.path.clone();
            match directory.rfind('/') {
                Some(idx) => directory.truncate(idx + 1),
                None => {
                    directory.clear();
                    directory.push('/');
                }
            }
            format!("{}{}", directory, reference)
        };

        Uri::parse(&format!("{}://{}{}", self.scheme, self.authority(), reference))
    }
}

impl fmt::Display for Uri {
    /// Renders `scheme://[userinfo@]host[:port][path][?k=v&...][#fragment]`,
    /// defaulting an empty path to `/` in the rendered form only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority())?;

        if self.path.is_empty() {
            f.write_str("/")?;
        } else {
            f.write_str(&self.path)?;
        }

        if !self.query.is_empty() {
            for (i, (key, value)) in self.query.iter().enumerate() {
                let separator = if i == 0 { '?' } else { '&' };
                write!(f, "{}{}={}", separator, key, value)?;
            }
        }

        if let Some(ref fragment) = self.fragment {
            write!(f, "#{}", fragment)?;
        }

        Ok(())
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
}

fn parse_port(port: &str) -> Result<u16, UriError> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UriError::InvalidPort);
    }

    port.parse().map_err(|_| UriError::InvalidPort)
}

/// Whether `host` is a dotted-decimal IPv4 literal: exactly four `.`-separated
/// runs of 1-3 digits, each at most 255.
fn is_ipv4_literal(host: &str) -> bool {
    let octets: Vec<&str> = host.split('.').collect();
    if octets.len() != 4 {
        return false;
    }

    octets.iter().all(|octet| {
        !octet.is_empty()
            && octet.len() <= 3
            && octet.bytes().all(|b| b.is_ascii_digit())
            && octet.parse::<u8>().is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::{Uri, UriError};

    #[test]
    fn host_labels() {
        let uri = Uri::parse("http://example.com").unwrap();
        assert_eq!(uri.scheme(), "http");
        assert_eq!(uri.ip(), None);
        assert_eq!(
            uri.host(),
            Some(&["example".to_string(), "com".to_string()][..])
        );
        assert_eq!(uri.port(), None);
        assert_eq!(uri.userinfo(), None);
        assert_eq!(uri.path(), "");
        assert!(uri.query().is_empty());
        assert_eq!(uri.fragment(), None);
    }

    #[test]
    fn ipv4_host() {
        let uri = Uri::parse("https://127.0.0.1/path?name=test#fr").unwrap();
        assert_eq!(uri.scheme(), "https");
        assert_eq!(uri.ip(), Some("127.0.0.1"));
        assert_eq!(uri.host(), None);
        assert_eq!(uri.path(), "/path");
        assert_eq!(uri.query().get("name").map(|v| v.as_str()), Some("test"));
        assert_eq!(uri.fragment(), Some("fr"));
    }

    #[test]
    fn userinfo_and_port() {
        let uri = Uri::parse("https://testdata@127.0.0.1:1010/path?name=test#fr").unwrap();
        assert_eq!(uri.userinfo(), Some("testdata"));
        assert_eq!(uri.ip(), Some("127.0.0.1"));
        assert_eq!(uri.port(), Some(1010));
        assert_eq!(uri.path(), "/path");
    }

    #[test]
    fn almost_ipv4_hosts_are_labels() {
        let uri = Uri::parse("https://256.0.0.1").unwrap();
        assert_eq!(uri.ip(), None);
        assert_eq!(uri.host().map(|h| h.len()), Some(4));

        let uri = Uri::parse("https://127.0.0").unwrap();
        assert_eq!(uri.ip(), None);
    }

    #[test]
    fn duplicate_query_keys_keep_the_last() {
        let uri = Uri::parse("https://example.com/?a=1&a=2&b=3").unwrap();
        assert_eq!(uri.query().get("a").map(|v| v.as_str()), Some("2"));
        assert_eq!(uri.query().get("b").map(|v| v.as_str()), Some("3"));
    }

    #[test]
    fn structural_errors() {
        assert_eq!(Uri::parse("example.com"), Err(UriError::MissingScheme));
        assert_eq!(Uri::parse("1http://example.com"), Err(UriError::InvalidScheme));
        assert_eq!(Uri::parse("ht!tp://example.com"), Err(UriError::InvalidScheme));
        assert_eq!(Uri::parse("https://"), Err(UriError::MissingHost));
        assert_eq!(Uri::parse("https://user@"), Err(UriError::MissingHost));
        assert_eq!(Uri::parse("https://example.com:abc"), Err(UriError::InvalidPort));
        assert_eq!(Uri::parse("https://example.com:"), Err(UriError::InvalidPort));
        assert_eq!(Uri::parse("https://example.com:70000"), Err(UriError::InvalidPort));
        assert_eq!(Uri::parse("https://example.com/?a"), Err(UriError::MalformedQuery));
    }

    #[test]
    fn ipv6_hosts_are_reported_distinctly() {
        assert_eq!(Uri::parse("https://[::1]/path"), Err(UriError::Ipv6Unsupported));
        assert_eq!(
            Uri::parse("https://user@[2001:db8::1]:8080/"),
            Err(UriError::Ipv6Unsupported)
        );
    }

    #[test]
    fn set_path_normalizes_the_leading_slash() {
        let mut uri = Uri::parse("https://google.com/path?name=test").unwrap();

        uri.set_path("/new/path");
        assert_eq!(uri.to_string(), "https://google.com/new/path?name=test");

        uri.set_path("new/path");
        assert_eq!(uri.to_string(), "https://google.com/new/path?name=test");

        uri.set_path("");
        assert_eq!(uri.path(), "");
        assert_eq!(uri.to_string(), "https://google.com/?name=test");
    }

    #[test]
    fn join_network_path_reference_replaces_the_authority() {
        let base = Uri::parse("https://google.com/path?name=test").unwrap();
        let joined = base.join("//test.com/path?name=test").unwrap();
        assert_eq!(joined.to_string(), "https://test.com/path?name=test");
        assert_eq!(joined.scheme(), "https");
        assert_eq!(
            joined.host(),
            Some(&["test".to_string(), "com".to_string()][..])
        );
    }

    #[test]
    fn join_absolute_path_reference_keeps_the_authority() {
        let base = Uri::parse("https://google.com/path?name=test").unwrap();
        let joined = base.join("/newpath#asd").unwrap();
        assert_eq!(joined.to_string(), "https://google.com/newpath#asd");
        assert_eq!(joined.path(), "/newpath");
        assert_eq!(joined.fragment(), Some("asd"));
        // The base query is not carried over.
        assert!(joined.query().is_empty());
    }

    #[test]
    fn join_preserves_userinfo_and_port() {
        let base = Uri::parse("https://u@127.0.0.1:1010/a/b").unwrap();
        let joined = base.join("/x").unwrap();
        assert_eq!(joined.to_string(), "https://u@127.0.0.1:1010/x");
        assert_eq!(joined.userinfo(), Some("u"));
        assert_eq!(joined.port(), Some(1010));
    }

    #[test]
    fn join_merges_bare_relative_paths() {
        let base = Uri::parse("https://google.com/a/b?name=test").unwrap();
        assert_eq!(base.join("c").unwrap().path(), "/a/c");

        let rootless = Uri::parse("https://google.com").unwrap();
        assert_eq!(rootless.join("c").unwrap().path(), "/c");
    }

    #[test]
    fn join_propagates_parse_errors() {
        let base = Uri::parse("https://google.com/path").unwrap();
        assert_eq!(base.join("//[::1]/x"), Err(UriError::Ipv6Unsupported));
        assert_eq!(base.join("/x?bad"), Err(UriError::MalformedQuery));
    }

    #[test]
    fn rendering_round_trips() {
        for input in [
            "https://127.0.0.1/path?name=test#fr",
            "https://testdata@127.0.0.1:1010/path?name=test&x=1#fr",
            "http://10.0.0.2:8080/a/b/c",
            "https://192.168.1.1/",
        ] {
            let parsed = Uri::parse(input).unwrap();
            let reparsed = Uri::parse(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed, "round trip failed for {}", input);
        }
    }
}
