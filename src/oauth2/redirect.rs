//! Redirect URL parsing for redirect-based grants.

// self
use crate::{
	_prelude::*,
	error::{AuthorizationError, AuthorizationErrorCode},
	oauth2::{AuthorizationSession, GrantType, TokenResult, exchange::TokenResponseBody},
};

/// What a validated redirect carried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedirectResponse {
	/// Implicit grant: the token itself.
	Token(TokenResult),
	/// Authorization code grant: the code to exchange.
	Code(String),
}

/// Collects redirect parameters from the fragment, falling back to the query.
pub fn redirect_params(url: &Url) -> BTreeMap<String, String> {
	let from_fragment = url
		.fragment()
		.map(|fragment| {
			url::form_urlencoded::parse(fragment.as_bytes()).into_owned().collect::<BTreeMap<_, _>>()
		})
		.unwrap_or_default();

	if !from_fragment.is_empty() {
		return from_fragment;
	}

	url.query_pairs().into_owned().collect()
}

/// Validates the redirect against `session` and extracts its payload.
///
/// Checks run in order: `state` first (missing or different is a mismatch), then the provider's
/// `error`, then the token (implicit) or code.
pub fn parse_redirect(
	url: &Url,
	session: &AuthorizationSession,
	interactive: bool,
) -> Result<RedirectResponse> {
	let params = redirect_params(url);

	session
		.validate_state(params.get("state").map(String::as_str))
		.map_err(|e| e.with_interactive(interactive))?;

	if let Some(code) = params.get("error") {
		let message = params
			.get("error_description")
			.cloned()
			.unwrap_or_else(|| "The authorization server reported an error.".to_owned());

		return Err(AuthorizationError::new(AuthorizationErrorCode::Provider(code.clone()), message)
			.with_state(&session.state)
			.with_interactive(interactive)
			.into());
	}

	match session.grant {
		GrantType::Implicit => {
			// `token_type` is taken as reported; `Bearer` is assumed when absent.
			let result = TokenResponseBody::from_params(&params)
				.into_token_result(Some(session.state.clone()), OffsetDateTime::now_utc())?;

			Ok(RedirectResponse::Token(result))
		},
		_ => match params.get("code").filter(|code| !code.is_empty()) {
			Some(code) => Ok(RedirectResponse::Code(code.clone())),
			None => Err(AuthorizationError::new(
				AuthorizationErrorCode::NoResponse,
				"The redirect did not include an authorization code.",
			)
			.with_state(&session.state)
			.with_interactive(interactive)
			.into()),
		},
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::CodeError, oauth2::OAuth2Settings};

	fn session(grant: GrantType) -> AuthorizationSession {
		let settings = OAuth2Settings::builder(grant, "client")
			.authorization_uri(
				Url::parse("https://auth.example.com/authorize").expect("Fixture URL should parse."),
			)
			.access_token_uri(
				Url::parse("https://auth.example.com/token").expect("Fixture URL should parse."),
			)
			.redirect_uri(Url::parse("https://app.example.com/cb").expect("Fixture URL should parse."))
			.state("st-1")
			.build()
			.expect("Settings fixture should be valid.");

		AuthorizationSession::new(&settings).expect("Session should start.")
	}

	fn redirect(value: &str) -> Url {
		Url::parse(value).expect("Redirect fixture should parse.")
	}

	#[test]
	fn implicit_fragment_yields_a_token() {
		let url = redirect(
			"https://app.example.com/cb#access_token=at&token_type=bearer&state=st-1&expires_in=3600&refresh_token=rt&scope=a%20b",
		);
		let RedirectResponse::Token(token) =
			parse_redirect(&url, &session(GrantType::Implicit), true).expect("Redirect should parse.")
		else {
			panic!("Implicit redirects must yield a token.");
		};

		assert_eq!(token.access_token.expose(), "at");
		assert_eq!(token.token_type, "bearer");
		assert_eq!(token.expires_in, Some(3600));
		assert_eq!(token.state.as_deref(), Some("st-1"));
		assert_eq!(token.scope.map(|scope| scope.len()), Some(2));
	}

	#[test]
	fn implicit_fragment_with_huge_lifetime_keeps_the_token() {
		let url = redirect(
			"https://app.example.com/cb#access_token=at&state=st-1&expires_in=99999999999999",
		);
		let RedirectResponse::Token(token) =
			parse_redirect(&url, &session(GrantType::Implicit), true).expect("Redirect should parse.")
		else {
			panic!("Implicit redirects must yield a token.");
		};

		assert_eq!(token.expires_in, Some(99_999_999_999_999));
		assert_eq!(token.expires_at, None);
		assert_eq!(token.token_type, "Bearer");
	}

	#[test]
	fn code_may_arrive_in_the_query() {
		let url = redirect("https://app.example.com/cb?code=c-1&state=st-1");

		assert_eq!(
			parse_redirect(&url, &session(GrantType::AuthorizationCode), true)
				.expect("Redirect should parse."),
			RedirectResponse::Code("c-1".into())
		);
	}

	#[test]
	fn state_is_checked_before_errors() {
		let url = redirect("https://app.example.com/cb#error=access_denied&state=forged");
		let err = parse_redirect(&url, &session(GrantType::AuthorizationCode), false)
			.expect_err("Forged state must fail.");

		let Error::Authorization(err) = err else { panic!("Expected an authorization error.") };

		assert!(err.is_state_mismatch());
		assert!(!err.interactive);

		let url = redirect("https://app.example.com/cb#access_token=at");
		let err = parse_redirect(&url, &session(GrantType::Implicit), true)
			.expect_err("Missing state must fail.");

		assert_eq!(err.code(), Some("invalid_state"));
	}

	#[test]
	fn provider_errors_carry_their_description() {
		let url =
			redirect("https://app.example.com/cb#error=true&state=st-1&error_description=User%20said%20no");
		let err = parse_redirect(&url, &session(GrantType::Implicit), true)
			.expect_err("Error redirects must fail.");

		let Error::Authorization(err) = err else { panic!("Expected an authorization error.") };

		assert_eq!(err.code, AuthorizationErrorCode::Provider("true".into()));
		assert_eq!(err.message, "User said no");
		assert_eq!(err.state.as_deref(), Some("st-1"));
	}

	#[test]
	fn implicit_redirect_without_a_token_fails() {
		let url = redirect("https://app.example.com/cb#state=st-1&token_type=bearer");
		let err = parse_redirect(&url, &session(GrantType::Implicit), true)
			.expect_err("Token-less redirects must fail.");

		assert_eq!(err.code(), Some(CodeError::NO_ACCESS_TOKEN));
	}
}
