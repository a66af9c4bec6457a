//! OAuth 2.0 authorization: settings, redirect handling, token exchange, and the flow driver.
//!
//! [`AuthorizationFlow`] owns one attempt at a time. Redirect-based grants go through
//! [`AuthorizationFlow::begin`] and [`AuthorizationFlow::handle_redirect`] (or
//! [`AuthorizationFlow::authorize`] with an [`AuthorizationHost`](crate::host::AuthorizationHost));
//! client credentials and password grants go straight to the token endpoint.

pub mod exchange;
pub mod flow;
pub mod redirect;
pub mod session;
pub mod settings;
pub mod state;

pub use exchange::*;
pub use flow::*;
pub use redirect::*;
pub use session::*;
pub use settings::*;
pub use state::*;

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
};

/// Token handed back to the caller when an attempt completes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResult {
	/// Access token.
	pub access_token: Secret,
	/// Token type as reported by the server (`Bearer` when absent).
	pub token_type: String,
	/// Lifetime in seconds, when reported.
	pub expires_in: Option<i64>,
	/// Absolute expiry computed from `expires_in` at receipt.
	pub expires_at: Option<OffsetDateTime>,
	/// Refresh token, when issued.
	pub refresh_token: Option<Secret>,
	/// Scopes granted, when reported.
	pub scope: Option<ScopeSet>,
	/// `state` issued for the attempt, if it had one.
	pub state: Option<String>,
}
impl TokenResult {
	/// Returns true when the token has a known expiry at or before `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| expires_at <= now)
	}
}
