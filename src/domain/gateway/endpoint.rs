//! Endpoint value object - a relative API path that is safe to join onto the base URL.
//!
//! Rejection happens on the first violation found, in this order:
//! traversal sequences, absolute URLs, other URL schemes, length.
//! Nothing is ever silently truncated or rewritten beyond trimming slashes.

use std::fmt;

use crate::domain::foundation::{EndpointViolation, ValidationError};

/// Maximum accepted endpoint length, in characters.
pub const MAX_ENDPOINT_LENGTH: usize = 500;

/// Percent-encoded forms of `..`, `//` and `\`, compared lower-cased.
const ENCODED_TRAVERSALS: [&str; 3] = ["%2e%2e", "%2f%2f", "%5c"];

/// Schemes that must never reach the HTTP client.
const FORBIDDEN_SCHEMES: [&str; 5] = ["file:", "ftp:", "gopher:", "ldap:", "data:"];

/// A sanitized relative API path (no leading or trailing slash).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Validates and normalizes a caller-supplied path.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEndpoint` for traversal sequences
    /// (plain or percent-encoded), absolute or non-HTTP URLs, and paths
    /// longer than [`MAX_ENDPOINT_LENGTH`].
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let path = raw.trim_matches('/');
        let lower = path.to_ascii_lowercase();

        let violation = if path.contains("..") {
            Some(EndpointViolation::ParentTraversal)
        } else if path.contains("//") {
            Some(EndpointViolation::DoubleSlash)
        } else if path.contains('\\') {
            Some(EndpointViolation::Backslash)
        } else if ENCODED_TRAVERSALS.iter().any(|enc| lower.contains(enc)) {
            Some(EndpointViolation::EncodedTraversal)
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(EndpointViolation::AbsoluteUrl)
        } else if FORBIDDEN_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
            Some(EndpointViolation::ForbiddenScheme)
        } else if path.chars().count() > MAX_ENDPOINT_LENGTH {
            Some(EndpointViolation::TooLong)
        } else {
            None
        };

        match violation {
            Some(v) => Err(ValidationError::InvalidEndpoint(v)),
            None => Ok(Self(path.to_string())),
        }
    }

    /// Returns the sanitized path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins this path onto a base URL with exactly one separating slash.
    pub fn join_onto(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sanitizes a raw endpoint string, returning the normalized path.
pub fn sanitize_endpoint(raw: &str) -> Result<String, ValidationError> {
    Endpoint::parse(raw).map(|endpoint| endpoint.0)
}

/// Sanitizes an identifier that will be interpolated as one path segment.
///
/// # Errors
///
/// `EmptyField` for a blank identifier, `InvalidEndpoint` for anything the
/// endpoint rules reject or that spans more than one segment.
pub fn path_segment(raw: &str, field: &str) -> Result<String, ValidationError> {
    let segment = sanitize_endpoint(raw.trim())?;
    if segment.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    if segment.contains('/') {
        return Err(ValidationError::InvalidEndpoint(EndpointViolation::NestedSegment));
    }
    Ok(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn violation(raw: &str) -> EndpointViolation {
        match Endpoint::parse(raw) {
            Err(ValidationError::InvalidEndpoint(v)) => v,
            other => panic!("expected rejection for {:?}, got {:?}", raw, other),
        }
    }

    #[test]
    fn trims_leading_and_trailing_slashes() {
        let endpoint = Endpoint::parse("/transactions/123/verify/").unwrap();
        assert_eq!(endpoint.as_str(), "transactions/123/verify");
    }

    #[test]
    fn rejects_parent_traversal() {
        assert_eq!(violation("../../etc/passwd"), EndpointViolation::ParentTraversal);
        assert_eq!(violation("payments/../admin"), EndpointViolation::ParentTraversal);
    }

    #[test]
    fn rejects_double_slash_and_backslash() {
        assert_eq!(violation("payments//admin"), EndpointViolation::DoubleSlash);
        assert_eq!(violation("payments\\admin"), EndpointViolation::Backslash);
    }

    #[test]
    fn rejects_percent_encoded_traversal() {
        assert_eq!(violation("payments/%2E%2E/admin"), EndpointViolation::EncodedTraversal);
        assert_eq!(violation("payments%2f%2fadmin"), EndpointViolation::EncodedTraversal);
    }

    #[test]
    fn rejects_absolute_urls() {
        // trimming does not help: the scheme separator trips the double-slash rule first
        assert_eq!(violation("https://evil.example/x"), EndpointViolation::DoubleSlash);
        assert_eq!(violation("HTTP:/\\evil"), EndpointViolation::Backslash);
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(violation("file:etc/passwd"), EndpointViolation::ForbiddenScheme);
        assert_eq!(violation("GOPHER:host"), EndpointViolation::ForbiddenScheme);
        assert_eq!(violation("data:text/plain,hi"), EndpointViolation::ForbiddenScheme);
    }

    #[test]
    fn length_limit_is_inclusive() {
        let ok = "a".repeat(MAX_ENDPOINT_LENGTH);
        assert!(Endpoint::parse(&ok).is_ok());

        let too_long = "a".repeat(MAX_ENDPOINT_LENGTH + 1);
        assert_eq!(violation(&too_long), EndpointViolation::TooLong);
    }

    #[test]
    fn join_onto_uses_single_separator() {
        let endpoint = Endpoint::parse("payments").unwrap();
        assert_eq!(
            endpoint.join_onto("https://api.flutterwave.com/v3/"),
            "https://api.flutterwave.com/v3/payments"
        );
        assert_eq!(
            endpoint.join_onto("https://api.flutterwave.com/v3"),
            "https://api.flutterwave.com/v3/payments"
        );
    }

    #[test]
    fn path_segment_accepts_single_identifier() {
        assert_eq!(path_segment(" 12345 ", "transfer_id").unwrap(), "12345");
        assert_eq!(path_segment("/RND_abc/", "transfer_id").unwrap(), "RND_abc");
    }

    #[test]
    fn path_segment_rejects_blank_nested_and_traversal() {
        assert_eq!(
            path_segment("  ", "bank_id"),
            Err(ValidationError::empty_field("bank_id"))
        );
        assert_eq!(
            path_segment("1/admin", "bank_id"),
            Err(ValidationError::InvalidEndpoint(EndpointViolation::NestedSegment))
        );
        assert!(path_segment("..", "bank_id").is_err());
    }

    fn arb_safe_path() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z0-9_-]{1,20}", 1..6).prop_map(|segments| segments.join("/"))
    }

    proptest! {
        #[test]
        fn safe_paths_are_returned_unchanged(path in arb_safe_path()) {
            prop_assert_eq!(sanitize_endpoint(&path).unwrap(), path.clone());
            let wrapped = format!("/{}/", path);
            prop_assert_eq!(sanitize_endpoint(&wrapped).unwrap(), path);
        }

        #[test]
        fn traversal_anywhere_is_rejected(
            prefix in "[a-z][a-z/]{0,9}",
            needle in prop_oneof![Just(".."), Just("//"), Just("\\"), Just("%2e%2e"), Just("%2F%2F")],
            suffix in "[a-z]{1,10}",
        ) {
            let raw = format!("{}{}{}", prefix, needle, suffix);
            prop_assert!(sanitize_endpoint(&raw).is_err());
        }

        #[test]
        fn overlong_paths_are_rejected(len in (MAX_ENDPOINT_LENGTH + 1)..(MAX_ENDPOINT_LENGTH + 200)) {
            prop_assert!(sanitize_endpoint(&"x".repeat(len)).is_err());
        }
    }
}
