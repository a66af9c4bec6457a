//! Credential primitives shared by the OAuth 1 and OAuth 2 flows.

pub mod scope;
pub mod secret;

pub use scope::*;
pub use secret::*;

// crates.io
use rand::{Rng, distr::Alphanumeric};

/// Random `[A-Za-z0-9]` string used for OAuth 2 `state`, PKCE verifiers, and OAuth 1 nonces.
pub(crate) fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn random_strings_are_alphanumeric() {
		let value = random_string(32);

		assert_eq!(value.len(), 32);
		assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(value, random_string(32));
	}
}
