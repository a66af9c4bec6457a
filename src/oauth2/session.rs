//! Per-attempt authorization state and the authorize URL built from it.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{self, ScopeSet},
	error::{AuthorizationError, SettingsError},
	oauth2::{GrantType, OAuth2Settings},
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// One redirect-based authorization attempt.
///
/// Holds the issued `state`, the optional PKCE verifier, and the URL the user agent must open.
/// Dropped once the attempt completes or fails.
#[derive(Clone)]
pub struct AuthorizationSession {
	/// Grant being performed.
	pub grant: GrantType,
	/// Requested scopes.
	pub scope: ScopeSet,
	/// Opaque value that must round-trip through the redirect.
	pub state: String,
	/// Redirect URI sent to the authorization endpoint.
	pub redirect_uri: Url,
	/// Fully formed authorization URL.
	pub authorize_url: Url,
	pkce: Option<PkcePair>,
}
impl AuthorizationSession {
	/// Starts an attempt for redirect-based grants.
	pub fn new(settings: &OAuth2Settings) -> Result<Self> {
		let grant = settings.grant_type;
		let response_type =
			grant.response_type().ok_or(SettingsError::NoRedirect { grant: grant.as_str() })?;
		let authorization_uri = settings
			.authorization_uri
			.clone()
			.ok_or(SettingsError::Missing { field: "authorization_uri", grant: grant.as_str() })?;
		let redirect_uri = settings
			.redirect_uri
			.clone()
			.ok_or(SettingsError::Missing { field: "redirect_uri", grant: grant.as_str() })?;
		let state = settings.state.clone().unwrap_or_else(|| auth::random_string(STATE_LEN));
		let pkce = (settings.pkce && grant == GrantType::AuthorizationCode).then(PkcePair::generate);
		let authorize_url = build_authorize_url(
			authorization_uri,
			response_type,
			&settings.client_id,
			&redirect_uri,
			&settings.scopes,
			&state,
			pkce.as_ref(),
		);

		Ok(Self { grant, scope: settings.scopes.clone(), state, redirect_uri, authorize_url, pkce })
	}

	/// PKCE code challenge, when PKCE is enabled.
	pub fn code_challenge(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.challenge.as_str())
	}

	/// PKCE challenge method, when PKCE is enabled.
	pub fn code_challenge_method(&self) -> Option<PkceCodeChallengeMethod> {
		self.pkce.as_ref().map(|pkce| pkce.method)
	}

	/// Validates the `state` echoed by the authorization server.
	///
	/// A missing value counts as a mismatch.
	pub fn validate_state(&self, returned_state: Option<&str>) -> Result<(), AuthorizationError> {
		if returned_state == Some(self.state.as_str()) {
			Ok(())
		} else {
			Err(AuthorizationError::state_mismatch(&self.state))
		}
	}

	pub(crate) fn code_verifier(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.verifier.as_str())
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("grant", &self.grant)
			.field("scope", &self.scope)
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri)
			.field("authorize_url", &self.authorize_url)
			.field("code_challenge", &self.code_challenge())
			.finish()
	}
}

#[derive(Clone)]
struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	fn generate() -> Self {
		let verifier = auth::random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

fn build_authorize_url(
	mut url: Url,
	response_type: &str,
	client_id: &str,
	redirect_uri: &Url,
	scope: &ScopeSet,
	state: &str,
	pkce: Option<&PkcePair>,
) -> Url {
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", response_type);
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if let Some(scope_value) = scope.joined(' ') {
		pairs.append_pair("scope", &scope_value);
	}

	pairs.append_pair("state", state);

	if let Some(pkce) = pkce {
		pairs.append_pair("code_challenge", &pkce.challenge);
		pairs.append_pair("code_challenge_method", pkce.method.as_str());
	}

	drop(pairs);

	url
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}
