//! Runs an authorization code attempt with PKCE against a local mock provider.
//!
//! The host below plays the browser: it "approves" the consent screen by redirecting straight
//! back to the registered redirect URI with a code and the issued state.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use restclient_auth::{
	auth::ScopeSet,
	host::{AuthorizationHost, HostFuture, NavigationOutcome, NavigationRequest},
	http::ReqwestHttpClient,
	messages::AuthorizationMessage,
	oauth2::{AuthorizationFlow, GrantType, OAuth2Settings},
	url::Url,
};

struct ConsentingBrowser;
impl AuthorizationHost for ConsentingBrowser {
	fn navigate(&self, request: NavigationRequest) -> HostFuture<'_, NavigationOutcome> {
		Box::pin(async move {
			println!("Opening {}", request.url);

			let Some((_, state)) = request.url.query_pairs().find(|(key, _)| key == "state") else {
				return NavigationOutcome::NoResponse;
			};
			let mut redirect = request.redirect_uri.clone();

			redirect.query_pairs_mut().append_pair("code", "demo-code").append_pair("state", &state);

			NavigationOutcome::Redirected(redirect)
		})
	}

	fn notify(&self, message: &AuthorizationMessage) {
		println!("Host received {}", message.kind());
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body_includes("code_verifier=");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let settings = OAuth2Settings::builder(GrantType::AuthorizationCode, "demo-client")
		.authorization_uri(Url::parse(&server.url("/authorize"))?)
		.access_token_uri(Url::parse(&server.url("/token"))?)
		.redirect_uri(Url::parse("http://localhost:7777/callback")?)
		.scopes(ScopeSet::new(["profile"])?)
		.pkce(true)
		.build()?;
	let mut flow = AuthorizationFlow::new(settings, Arc::new(ReqwestHttpClient::new()?));
	let token = flow.authorize(&ConsentingBrowser).await?;

	println!(
		"Obtained a {} token expiring at {:?} (flow state: {}).",
		token.token_type,
		token.expires_at,
		flow.state().as_str()
	);

	token_mock.assert_calls_async(1).await;

	Ok(())
}
