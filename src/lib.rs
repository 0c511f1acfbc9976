//! Parsing and validation of `Set-Cookie` header values, the relaxed
//! cookie-date format, and request URIs.
//!
//! This crate provides the [`Cookie`] type, produced by feeding a single
//! `Set-Cookie` header value and the request [`Uri`] that carried it through
//! the RFC 6265 normalization algorithm, plus the supporting pieces that
//! algorithm needs: the URI component extractor ([`Uri::parse()`]), the
//! cookie-date interpreter ([`parse_cookie_date()`]), and the
//! [`path_matches()`] / [`domain_matches()`] / [`default_path()`] rules.
//!
//! Parsing is deliberately two-tiered. Structural problems (a URI that
//! cannot be decomposed, a header without a `name=value` pair, a `Domain`
//! attribute that does not cover the request host) fail the whole operation
//! with a typed error. Individual bad attributes never do: an unparsable
//! `Expires`, a malformed `Max-Age`, an empty `Domain`, or a relative `Path`
//! are silently dropped and the rest of the header is honored.
//!
//! # Usage
//!
//! ```rust
//! use setcookie::{Cookie, Uri};
//!
//! let uri = Uri::parse("https://youtube.com").unwrap();
//! let header = "GPS=1; Domain=youtube.com; Path=/; Secure; HttpOnly";
//! let cookie = Cookie::parse(header, &uri).unwrap();
//!
//! assert_eq!(cookie.name_value(), ("GPS", "1"));
//! assert_eq!(cookie.domain(), "youtube.com");
//! assert!(cookie.secure_only());
//! assert!(!cookie.host_only());
//! assert!(!cookie.persistent());
//! ```
//!
//! # Features
//!
//! * **percent-encode**
//!
//!   Enables percent encoding and decoding of names and values in cookies.
//!   When enabled, cookie names and values are percent-decoded during
//!   parsing and percent-encoded when a `Cookie` is rendered with
//!   `to_string`.

mod date;
mod matching;
mod parse;
mod uri;

use std::fmt;

use time::OffsetDateTime;

pub use crate::date::{parse_cookie_date, DateError};
pub use crate::matching::{default_path, domain_matches, path_matches};
pub use crate::parse::ParseError;
pub use crate::uri::{Uri, UriError};

#[cfg(feature = "percent-encode")]
use percent_encoding::{percent_encode, AsciiSet, CONTROLS};

/// https://url.spec.whatwg.org/#fragment-percent-encode-set
#[cfg(feature = "percent-encode")]
const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// https://url.spec.whatwg.org/#userinfo-percent-encode-set
#[cfg(feature = "percent-encode")]
const USERINFO: &AsciiSet = &FRAGMENT
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'|')
    .add(b'%')
    .add(b'+');

/// Representation of a received HTTP cookie, fully normalized against the
/// request URI that carried it.
///
/// A `Cookie` is constructed exactly once, by [`Cookie::parse()`], and is
/// immutable afterwards except for [`Cookie::touch()`]. The normalization
/// already happened: the domain is lower-cased with any leading dot
/// stripped, the path is non-empty and starts with `/` (falling back to the
/// default path computed from the request URI), and the expiry reflects the
/// `Max-Age`-over-`Expires` precedence rule.
///
/// # Example
///
/// ```rust
/// use setcookie::{Cookie, Uri};
///
/// let uri = Uri::parse("https://example.com/label1/label2").unwrap();
/// let cookie = Cookie::parse("id=a3fWa; HttpOnly", &uri).unwrap();
///
/// assert_eq!(cookie.name(), "id");
/// assert_eq!(cookie.value(), "a3fWa");
/// assert!(cookie.http_only());
/// // No Domain attribute: bound to the exact originating host.
/// assert!(cookie.host_only());
/// assert_eq!(cookie.domain(), "example.com");
/// // No Path attribute: the default path is computed from the URI.
/// assert_eq!(cookie.path(), "/label1");
/// ```
#[derive(Debug, Clone)]
pub struct Cookie {
    /// The cookie's name.
    pub(crate) name: String,
    /// The cookie's value.
    pub(crate) value: String,
    /// When this cookie was constructed.
    pub(crate) creation_time: OffsetDateTime,
    /// When this cookie was last handed to a caller.
    pub(crate) last_access_time: OffsetDateTime,
    /// Whether an `Expires` or `Max-Age` attribute was accepted.
    pub(crate) persistent: bool,
    /// The resolved expiry; `None` for session cookies.
    pub(crate) expiry_time: Option<OffsetDateTime>,
    /// The cookie's domain, lower-cased, leading dot stripped.
    pub(crate) domain: String,
    /// Whether the cookie is bound to the exact originating host.
    pub(crate) host_only: bool,
    /// The cookie's path. Non-empty, always starts with `/`.
    pub(crate) path: String,
    /// Whether this cookie carried `Secure`.
    pub(crate) secure_only: bool,
    /// Whether this cookie carried `HttpOnly`.
    pub(crate) http_only: bool,
}

impl Cookie {
    /// Parses a `Set-Cookie` header value against the request URI that
    /// produced it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use setcookie::{Cookie, Uri};
    ///
    /// let uri = Uri::parse("https://example.com").unwrap();
    /// let cookie = Cookie::parse("foo=bar; Secure", &uri).unwrap();
    /// assert_eq!(cookie.name_value(), ("foo", "bar"));
    /// assert!(cookie.secure_only());
    /// ```
    #[inline]
    pub fn parse(header: &str, uri: &Uri) -> Result<Cookie, ParseError> {
        parse::parse_set_cookie(header, uri)
    }

    /// Returns the name of `self`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of `self`.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the name and value of `self` as a `(name, value)` tuple.
    #[inline]
    pub fn name_value(&self) -> (&str, &str) {
        (&self.name, &self.value)
    }

    /// Returns the domain of `self`: the declared `Domain` attribute after
    /// normalization, or the request URI's registrable host.
    #[inline]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns whether `self` is bound only to the exact originating host.
    /// True iff no `Domain` attribute was accepted.
    #[inline]
    pub fn host_only(&self) -> bool {
        self.host_only
    }

    /// Returns the path of `self`.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns whether `self` was marked `Secure`.
    #[inline]
    pub fn secure_only(&self) -> bool {
        self.secure_only
    }

    /// Returns whether `self` was marked `HttpOnly`.
    #[inline]
    pub fn http_only(&self) -> bool {
        self.http_only
    }

    /// Returns whether `self` carries an explicit expiry. False means a
    /// session cookie.
    #[inline]
    pub fn persistent(&self) -> bool {
        self.persistent
    }

    /// Returns the expiry of `self`, or `None` for session cookies. When an
    /// accepted `Max-Age` and `Expires` were both present, this is the
    /// `Max-Age`-derived timestamp.
    #[inline]
    pub fn expiry_time(&self) -> Option<OffsetDateTime> {
        self.expiry_time
    }

    /// Returns when `self` was constructed.
    #[inline]
    pub fn creation_time(&self) -> OffsetDateTime {
        self.creation_time
    }

    /// Returns when `self` was last accessed.
    #[inline]
    pub fn last_access_time(&self) -> OffsetDateTime {
        self.last_access_time
    }

    /// Records an access to `self` by setting its last-access time to now.
    #[inline]
    pub fn touch(&mut self) {
        self.last_access_time = OffsetDateTime::now_utc();
    }

    /// Returns whether `self` is expired at `instant`. Session cookies are
    /// never expired.
    ///
    /// # Example
    ///
    /// ```rust
    /// use setcookie::{Cookie, Uri};
    /// use time::OffsetDateTime;
    ///
    /// let uri = Uri::parse("https://example.com").unwrap();
    ///
    /// let expired = Cookie::parse("k=v; Max-Age=0", &uri).unwrap();
    /// assert!(expired.is_expired_at(OffsetDateTime::now_utc()));
    ///
    /// let session = Cookie::parse("k=v", &uri).unwrap();
    /// assert!(!session.is_expired_at(OffsetDateTime::now_utc()));
    /// ```
    pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
        match self.expiry_time {
            Some(expiry) => expiry <= instant,
            None => false,
        }
    }
}

impl PartialEq for Cookie {
    /// Compares everything but the creation and last-access times; domains
    /// and paths are compared case-insensitively.
    fn eq(&self, other: &Cookie) -> bool {
        self.name == other.name
            && self.value == other.value
            && self.persistent == other.persistent
            && self.expiry_time == other.expiry_time
            && self.host_only == other.host_only
            && self.secure_only == other.secure_only
            && self.http_only == other.http_only
            && self.domain.eq_ignore_ascii_case(&other.domain)
            && self.path.eq_ignore_ascii_case(&other.path)
    }
}

impl fmt::Display for Cookie {
    /// Renders `self` in `Set-Cookie` form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[cfg(feature = "percent-encode")]
        {
            let name = percent_encode(self.name.as_bytes(), USERINFO);
            let value = percent_encode(self.value.as_bytes(), USERINFO);
            write!(f, "{}={}", name, value)?;
        }

        #[cfg(not(feature = "percent-encode"))]
        write!(f, "{}={}", self.name, self.value)?;

        if self.http_only {
            write!(f, "; HttpOnly")?;
        }

        if self.secure_only {
            write!(f, "; Secure")?;
        }

        write!(f, "; Path={}", self.path)?;

        if !self.host_only {
            write!(f, "; Domain={}", self.domain)?;
        }

        if self.persistent {
            if let Some(time) = self.expiry_time {
                let formatted = time
                    .format(&crate::date::EXPIRES_FORMAT)
                    .map_err(|_| fmt::Error)?;
                write!(f, "; Expires={}", formatted)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Cookie, Uri};

    #[test]
    fn format() {
        let uri = Uri::parse("https://example.com").unwrap();

        let cookie = Cookie::parse("foo=bar", &uri).unwrap();
        assert_eq!(cookie.to_string(), "foo=bar; Path=/");

        let cookie = Cookie::parse("foo=bar; HttpOnly; Secure; Path=/sub", &uri).unwrap();
        assert_eq!(cookie.to_string(), "foo=bar; HttpOnly; Secure; Path=/sub");

        let cookie = Cookie::parse("foo=bar; Domain=example.com", &uri).unwrap();
        assert_eq!(cookie.to_string(), "foo=bar; Path=/; Domain=example.com");

        let header = "foo=bar; Expires=Wed, 21 Oct 2015 07:28:00 GMT";
        let cookie = Cookie::parse(header, &uri).unwrap();
        assert_eq!(
            cookie.to_string(),
            "foo=bar; Path=/; Expires=Wed, 21 Oct 2015 07:28:00 GMT"
        );
    }

    #[test]
    fn equality_ignores_bookkeeping_times() {
        let uri = Uri::parse("https://example.com").unwrap();
        let a = Cookie::parse("foo=bar; Path=/x", &uri).unwrap();
        let mut b = Cookie::parse("foo=bar; Path=/X", &uri).unwrap();
        b.touch();
        assert_eq!(a, b);

        let c = Cookie::parse("foo=baz; Path=/x", &uri).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn touch_moves_last_access_forward() {
        let uri = Uri::parse("https://example.com").unwrap();
        let mut cookie = Cookie::parse("foo=bar", &uri).unwrap();
        let before = cookie.last_access_time();
        cookie.touch();
        assert!(cookie.last_access_time() >= before);
        assert_eq!(cookie.creation_time(), before);
    }

    #[test]
    #[cfg(feature = "percent-encode")]
    fn parse_decoded() {
        let uri = Uri::parse("https://example.com").unwrap();
        let cookie = Cookie::parse("foo%20bar=baz%3B%20qux", &uri).unwrap();
        assert_eq!(cookie.name_value(), ("foo bar", "baz; qux"));
    }

    #[test]
    #[cfg(feature = "percent-encode")]
    fn format_encoded() {
        let uri = Uri::parse("https://example.com").unwrap();
        let cookie = Cookie::parse("foo%20bar=baz%3B%20qux", &uri).unwrap();
        assert_eq!(cookie.to_string(), "foo%20bar=baz%3B%20qux; Path=/");
    }
}
