//! Parsing of `Set-Cookie` header values (RFC 6265 §5.2 and §5.3).
//!
//! Errors here are two-tiered. Structural problems (no name/value pair, an
//! empty name, a `Domain` attribute that does not cover the request host)
//! abort the whole parse. Everything attribute-level is lenient: an
//! unparsable `Expires`, a malformed `Max-Age`, an empty `Domain`, or an
//! invalid `Path` drop that one attribute and processing continues.

use std::error::Error;
use std::fmt;

use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::date::parse_cookie_date;
use crate::matching::{default_path, domain_matches};
use crate::uri::Uri;
use crate::Cookie;

/// Errors that can occur while parsing a `Set-Cookie` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The header value did not contain a `name=value` pair.
    MissingPair,
    /// The cookie name was empty.
    EmptyName,
    /// The `Domain` attribute does not cover the request URI's host.
    DomainMismatch,
    /// The cookie's name or value was not valid UTF-8 after percent-decoding.
    #[cfg(feature = "percent-encode")]
    Utf8Error,
}

impl ParseError {
    /// Returns a description of this error as a string.
    pub fn as_str(&self) -> &'static str {
        match *self {
            ParseError::MissingPair => "the header value is missing a name/value pair",
            ParseError::EmptyName => "the cookie name is empty",
            ParseError::DomainMismatch => {
                "the Domain attribute does not cover the request URI's host"
            }
            #[cfg(feature = "percent-encode")]
            ParseError::Utf8Error => {
                "the cookie's name or value is not valid UTF-8 after percent-decoding"
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error for ParseError {}

/// The cleaned attribute map: every recognized attribute after
/// normalization, with invalid occurrences already dropped.
#[derive(Debug, Default)]
struct Attributes {
    expires: Option<OffsetDateTime>,
    max_age: Option<i64>,
    domain: Option<String>,
    path: Option<String>,
    secure: bool,
    http_only: bool,
}

/// Validates a `Max-Age` value: an optional single leading sign followed by
/// one or more digits and nothing else.
fn parse_max_age(value: &str) -> Option<i64> {
    let digits = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    value.parse().ok()
}

#[cfg(feature = "percent-encode")]
fn decoded(raw: &str) -> Result<String, ParseError> {
    percent_encoding::percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| ParseError::Utf8Error)
}

pub(crate) fn parse_set_cookie(s: &str, uri: &Uri) -> Result<Cookie, ParseError> {
    let mut segments = s.split(';');

    // The portion before the first `;` is the name/value pair; everything
    // after is an attribute.
    let key_value = segments.next().expect("split always yields one segment");
    let (name, value) = key_value.split_once('=').ok_or(ParseError::MissingPair)?;
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() {
        return Err(ParseError::EmptyName);
    }

    #[cfg(not(feature = "percent-encode"))]
    let (name, value) = (name.to_string(), value.to_string());
    #[cfg(feature = "percent-encode")]
    let (name, value) = (decoded(name)?, decoded(value)?);

    let mut attributes = Attributes::default();
    for segment in segments {
        let (key, value) = match segment.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (segment.trim(), ""),
        };

        // Attribute names are case-insensitive, later occurrences overwrite
        // earlier ones, and anything unrecognized or invalid is skipped.
        match key.to_ascii_lowercase().as_str() {
            "expires" => {
                if let Ok(datetime) = parse_cookie_date(value) {
                    attributes.expires = Some(datetime);
                }
            }
            "max-age" => {
                if let Some(seconds) = parse_max_age(value) {
                    attributes.max_age = Some(seconds);
                }
            }
            "domain" => {
                let domain = value.strip_prefix('.').unwrap_or(value);
                if !domain.is_empty() {
                    attributes.domain = Some(domain.to_ascii_lowercase());
                }
            }
            "path" => {
                if value.starts_with('/') {
                    attributes.path = Some(value.to_string());
                }
            }
            "secure" => attributes.secure = true,
            "httponly" => attributes.http_only = true,
            _ => {}
        }
    }

    build_cookie(name, value, attributes, uri)
}

fn build_cookie(
    name: String,
    value: String,
    attributes: Attributes,
    uri: &Uri,
) -> Result<Cookie, ParseError> {
    let now = OffsetDateTime::now_utc();

    let (domain, host_only) = match attributes.domain {
        Some(domain) => {
            if !domain_matches(&uri.domain(), &domain) {
                return Err(ParseError::DomainMismatch);
            }
            (domain, false)
        }
        None => (uri.domain(), true),
    };

    // Max-Age takes precedence over Expires when both are present. A
    // non-positive Max-Age expires the cookie immediately.
    let expiry_time = match (attributes.max_age, attributes.expires) {
        (Some(seconds), _) if seconds <= 0 => Some(now),
        (Some(seconds), _) => Some(
            now.checked_add(Duration::seconds(seconds))
                .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc()),
        ),
        (None, Some(datetime)) => Some(datetime),
        (None, None) => None,
    };

    let path = attributes
        .path
        .unwrap_or_else(|| default_path(uri.path()));

    Ok(Cookie {
        name,
        value,
        creation_time: now,
        last_access_time: now,
        persistent: expiry_time.is_some(),
        expiry_time,
        domain,
        host_only,
        path,
        secure_only: attributes.secure,
        http_only: attributes.http_only,
    })
}
