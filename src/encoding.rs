//! Percent-encoding sets shared by the signature, proxy, and expression code.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
// self
use crate::error::EvalError;

/// RFC 3986 unreserved characters stay literal; everything else is escaped.
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');
/// Characters left alone by ECMAScript `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'!')
	.remove(b'~')
	.remove(b'*')
	.remove(b'\'')
	.remove(b'(')
	.remove(b')');

/// Strict RFC 3986 encoding used by OAuth 1.0a signatures.
pub fn encode_rfc3986(input: &str) -> String {
	utf8_percent_encode(input, RFC3986).to_string()
}

/// Encodes a value the way browsers do for `encodeURIComponent`.
pub fn encode_uri_component(input: &str) -> String {
	utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Reverses [`encode_uri_component`], rejecting sequences that do not decode to UTF-8.
pub fn decode_uri_component(input: &str) -> Result<String, EvalError> {
	percent_decode_str(input)
		.decode_utf8()
		.map(|decoded| decoded.into_owned())
		.map_err(|_| EvalError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rfc3986_escapes_reserved_characters() {
		assert_eq!(encode_rfc3986("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
		assert_eq!(encode_rfc3986("a-b.c_d~e*"), "a-b.c_d~e%2A");
		assert_eq!(encode_rfc3986("☃"), "%E2%98%83");
	}

	#[test]
	fn uri_component_matches_browser_set() {
		assert_eq!(encode_uri_component("it's (a) test!*"), "it's%20(a)%20test!*");
		assert_eq!(
			encode_uri_component("https://api.example.com/token?x=1"),
			"https%3A%2F%2Fapi.example.com%2Ftoken%3Fx%3D1"
		);
		assert_eq!(
			decode_uri_component("https%3A%2F%2Fapi.example.com").expect("Valid input decodes."),
			"https://api.example.com"
		);
		assert_eq!(decode_uri_component("%FF"), Err(EvalError::InvalidUtf8));
	}
}
