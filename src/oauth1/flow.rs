//! OAuth 1.0a three-legged authorization (RFC 5849 section 2).

// crates.io
use ::oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::{AuthorizationError, AuthorizationErrorCode, CodeError, SettingsError},
	host::{AuthorizationHost, NavigationOutcome, NavigationRequest},
	http::{self, TokenHttpClient},
	messages::{AuthorizationMessage, ErrorPayload},
	oauth1::{OAuth1Signer, SignatureMethod, SignatureRequest, SignedRequest},
	oauth2::redirect_params,
	obs::{self, FlowKind},
};

const OUT_OF_BAND: &str = "oob";

/// Where signed protocol parameters travel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamsLocation {
	/// `Authorization: OAuth ...` header.
	#[default]
	AuthorizationHeader,
	/// URL query string.
	Querystring,
	/// Form body (falls back to the query string for `GET`).
	Body,
}

/// HTTP method used for the credential requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenRequestMethod {
	/// `POST`.
	#[default]
	Post,
	/// `GET`.
	Get,
}
impl TokenRequestMethod {
	/// Wire name.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenRequestMethod::Post => "POST",
			TokenRequestMethod::Get => "GET",
		}
	}

	fn method(self) -> Method {
		match self {
			TokenRequestMethod::Post => Method::POST,
			TokenRequestMethod::Get => Method::GET,
		}
	}
}

/// Consumer configuration for the three-legged dance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth1Settings {
	/// Consumer key.
	pub consumer_key: String,
	/// Consumer secret.
	pub consumer_secret: Secret,
	/// Temporary credential request endpoint.
	pub request_token_uri: Url,
	/// Resource owner authorization endpoint.
	pub authorization_uri: Url,
	/// Token credential request endpoint.
	pub access_token_uri: Url,
	/// Callback URI; `oob` is sent when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub redirect_uri: Option<Url>,
	/// Signature method.
	#[serde(default)]
	pub signature_method: SignatureMethod,
	/// `realm` for the `Authorization` header.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub realm: Option<String>,
	/// Method used for both credential requests.
	#[serde(default)]
	pub token_request_method: TokenRequestMethod,
	/// Where protocol parameters are placed.
	#[serde(default)]
	pub params_location: ParamsLocation,
	/// Whether the attempt may show UI to the user.
	#[serde(default = "interactive_default")]
	pub interactive: bool,
}
impl OAuth1Settings {
	/// Creates settings with default method, placement, and interactivity.
	pub fn new(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<Secret>,
		request_token_uri: Url,
		authorization_uri: Url,
		access_token_uri: Url,
	) -> Self {
		Self {
			consumer_key: consumer_key.into(),
			consumer_secret: consumer_secret.into(),
			request_token_uri,
			authorization_uri,
			access_token_uri,
			redirect_uri: None,
			signature_method: SignatureMethod::default(),
			realm: None,
			token_request_method: TokenRequestMethod::default(),
			params_location: ParamsLocation::default(),
			interactive: true,
		}
	}

	/// Sets the callback URI.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Sets the signature method.
	pub fn signature_method(mut self, method: SignatureMethod) -> Self {
		self.signature_method = method;

		self
	}

	/// Sets the header realm.
	pub fn realm(mut self, realm: impl Into<String>) -> Self {
		self.realm = Some(realm.into());

		self
	}

	/// Sets the credential request method.
	pub fn token_request_method(mut self, method: TokenRequestMethod) -> Self {
		self.token_request_method = method;

		self
	}

	/// Sets the parameter placement.
	pub fn params_location(mut self, location: ParamsLocation) -> Self {
		self.params_location = location;

		self
	}

	/// Allows or forbids user interaction.
	pub fn interactive(mut self, interactive: bool) -> Self {
		self.interactive = interactive;

		self
	}

	/// Checks required values.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.consumer_key.is_empty() {
			return Err(SettingsError::Missing { field: "consumer_key", grant: "oauth1" });
		}

		Ok(())
	}

	fn signer(&self) -> OAuth1Signer {
		let signer = OAuth1Signer::new(&self.consumer_key, self.consumer_secret.clone())
			.with_method(self.signature_method);

		match &self.realm {
			Some(realm) => signer.with_realm(realm),
			None => signer,
		}
	}
}

fn interactive_default() -> bool {
	true
}

/// Temporary credentials returned by the request-token endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemporaryCredentials {
	/// `oauth_token`.
	pub token: String,
	/// `oauth_token_secret`.
	pub token_secret: Secret,
	/// `oauth_callback_confirmed=true` was present.
	pub callback_confirmed: bool,
}

/// Token credentials produced by a completed dance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Oauth1Credentials {
	/// `oauth_token`.
	pub token: Secret,
	/// `oauth_token_secret`.
	pub token_secret: Secret,
	/// Any other parameters the provider returned (`user_id`, `screen_name`, ...).
	#[serde(default)]
	pub extra: BTreeMap<String, String>,
}

/// Runs the three-legged dance against one provider.
#[derive(Debug)]
pub struct OAuth1Client<C>
where
	C: ?Sized,
{
	settings: OAuth1Settings,
	signer: OAuth1Signer,
	http_client: Arc<C>,
}
impl<C> OAuth1Client<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Validates `settings` and creates a client.
	pub fn new(settings: OAuth1Settings, http_client: Arc<C>) -> Result<Self> {
		settings.validate()?;

		let signer = settings.signer();

		Ok(Self { settings, signer, http_client })
	}

	/// Settings in use.
	pub fn settings(&self) -> &OAuth1Settings {
		&self.settings
	}

	/// Obtains temporary credentials, sending `oauth_callback`.
	pub async fn request_temporary_credentials(&self) -> Result<TemporaryCredentials> {
		let callback =
			self.settings.redirect_uri.as_ref().map_or(OUT_OF_BAND, |url| url.as_str()).to_owned();
		let request = SignatureRequest::new(
			self.settings.token_request_method.as_str(),
			self.settings.request_token_uri.clone(),
		)
		.oauth_param("oauth_callback", callback);
		let mut params = self.call(request).await?;
		let token = take_required(&mut params, "oauth_token")?;
		let token_secret = take_required(&mut params, "oauth_token_secret")?;

		Ok(TemporaryCredentials {
			token,
			token_secret: token_secret.into(),
			callback_confirmed: params.get("oauth_callback_confirmed").is_some_and(|v| v == "true"),
		})
	}

	/// Resource owner authorization URL for `temporary`.
	pub fn authorization_url(&self, temporary: &TemporaryCredentials) -> Url {
		let mut url = self.settings.authorization_uri.clone();

		url.query_pairs_mut().append_pair("oauth_token", &temporary.token);

		url
	}

	/// Extracts `oauth_verifier` from the callback.
	///
	/// A missing or different `oauth_token` is reported as a state mismatch.
	pub fn parse_callback(
		&self,
		url: &Url,
		temporary: &TemporaryCredentials,
	) -> Result<String, AuthorizationError> {
		let params = redirect_params(url);
		let interactive = self.settings.interactive;

		if params.get("oauth_token") != Some(&temporary.token) {
			return Err(AuthorizationError::state_mismatch(&temporary.token)
				.with_interactive(interactive));
		}

		let denied = params
			.get("error")
			.cloned()
			.or_else(|| params.contains_key("denied").then(|| "access_denied".to_owned()));

		if let Some(code) = denied {
			return Err(AuthorizationError::new(
				AuthorizationErrorCode::Provider(code),
				"The resource owner denied the request.",
			)
			.with_state(&temporary.token)
			.with_interactive(interactive));
		}

		params.get("oauth_verifier").filter(|verifier| !verifier.is_empty()).cloned().ok_or_else(
			|| {
				AuthorizationError::new(
					AuthorizationErrorCode::NoResponse,
					"The callback did not include an oauth_verifier.",
				)
				.with_state(&temporary.token)
				.with_interactive(interactive)
			},
		)
	}

	/// Exchanges temporary credentials and the verifier for token credentials.
	pub async fn request_access_token(
		&self,
		temporary: &TemporaryCredentials,
		verifier: &str,
	) -> Result<Oauth1Credentials> {
		let request = SignatureRequest::new(
			self.settings.token_request_method.as_str(),
			self.settings.access_token_uri.clone(),
		)
		.token(&temporary.token, temporary.token_secret.clone())
		.oauth_param("oauth_verifier", verifier);
		let mut params = self.call(request).await?;
		let token = take_required(&mut params, "oauth_token")?;
		let token_secret = take_required(&mut params, "oauth_token_secret")?;

		Ok(Oauth1Credentials { token: token.into(), token_secret: token_secret.into(), extra: params })
	}

	/// Runs the whole dance through `host`.
	pub async fn authorize(&self, host: &dyn AuthorizationHost) -> Result<Oauth1Credentials> {
		host.notify(&AuthorizationMessage::OAuth1TokenRequested(Box::new(self.settings.clone())));

		let result = obs::observe(FlowKind::OAuth1, "authorize", self.authorize_inner(host)).await;

		match &result {
			Ok(credentials) =>
				host.notify(&AuthorizationMessage::OAuth1TokenResponse(credentials.clone())),
			Err(e) => host.notify(&AuthorizationMessage::OAuth1Error(ErrorPayload::from_error(e))),
		}

		result
	}

	async fn authorize_inner(&self, host: &dyn AuthorizationHost) -> Result<Oauth1Credentials> {
		let temporary = self.request_temporary_credentials().await?;
		let interactive = self.settings.interactive;
		let request = NavigationRequest {
			url: self.authorization_url(&temporary),
			redirect_uri: self
				.settings
				.redirect_uri
				.clone()
				.unwrap_or_else(|| self.settings.authorization_uri.clone()),
			interactive,
		};
		let callback = match host.navigate(request).await {
			NavigationOutcome::Redirected(url) => url,
			outcome =>
				return Err(outcome.into_authorization_error(&temporary.token, interactive).into()),
		};
		let verifier = self.parse_callback(&callback, &temporary)?;

		self.request_access_token(&temporary, &verifier).await
	}

	async fn call(&self, request: SignatureRequest) -> Result<BTreeMap<String, String>> {
		let signed = self.signer.sign(&request)?;
		let http_request = self.http_request(request.url, &signed)?;
		let response =
			self.http_client.execute(http_request).await.map_err(CodeError::transport)?;
		let status = response.status().as_u16();
		let params = url::form_urlencoded::parse(response.body())
			.into_owned()
			.collect::<BTreeMap<String, String>>();

		if let Some(problem) = params.get("oauth_problem") {
			return Err(CodeError::new(problem.clone(), "The provider rejected the request.")
				.with_status(status)
				.into());
		}
		if !response.status().is_success() {
			return Err(CodeError::new(
				CodeError::REQUEST_ERROR,
				format!("Credential endpoint responded with HTTP {status}."),
			)
			.with_status(status)
			.into());
		}

		Ok(params)
	}

	fn http_request(&self, mut url: Url, signed: &SignedRequest) -> Result<::oauth2::HttpRequest> {
		let method = self.settings.token_request_method;
		let location = match (self.settings.params_location, method) {
			(ParamsLocation::Body, TokenRequestMethod::Get) => ParamsLocation::Querystring,
			(location, _) => location,
		};

		match location {
			ParamsLocation::AuthorizationHeader => http::form_request(
				method.method(),
				&url,
				&[],
				Some(&signed.authorization_header()),
			),
			ParamsLocation::Querystring => {
				url.query_pairs_mut().extend_pairs(signed.query_pairs());

				http::form_request(method.method(), &url, &[], None)
			},
			ParamsLocation::Body =>
				http::form_request(method.method(), &url, signed.query_pairs(), None),
		}
	}
}

fn take_required(params: &mut BTreeMap<String, String>, key: &'static str) -> Result<String, CodeError> {
	params.remove(key).filter(|value| !value.is_empty()).ok_or_else(|| {
		CodeError::new(CodeError::NO_ACCESS_TOKEN, format!("Response did not include `{key}`."))
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, messages::MessageKind};

	const FORM: &str = "application/x-www-form-urlencoded";

	fn settings() -> OAuth1Settings {
		let url = |value: &str| Url::parse(value).expect("Fixture URL should parse.");

		OAuth1Settings::new(
			"consumer",
			"consumer-secret",
			url("https://api.example.com/oauth/request_token"),
			url("https://api.example.com/oauth/authorize"),
			url("https://api.example.com/oauth/access_token"),
		)
		.redirect_uri(url("https://app.example.com/cb"))
		.realm("Example")
	}

	fn temporary() -> TemporaryCredentials {
		TemporaryCredentials {
			token: "temp".into(),
			token_secret: "temp-secret".into(),
			callback_confirmed: true,
		}
	}

	#[tokio::test]
	async fn temporary_credentials_are_signed_with_a_callback() {
		let http = Arc::new(RecordingHttpClient::default().respond(
			200,
			FORM,
			"oauth_token=temp&oauth_token_secret=temp-secret&oauth_callback_confirmed=true",
		));
		let client = OAuth1Client::new(settings(), http.clone()).expect("Client should build.");
		let temporary =
			client.request_temporary_credentials().await.expect("Request token call should succeed.");

		assert_eq!(temporary, self::temporary());

		let recorded = &http.requests()[0];
		let header = recorded.header("authorization").expect("Authorization header should be sent.");

		assert_eq!(recorded.method, "POST");
		assert!(header.starts_with("OAuth realm=\"Example\", oauth_consumer_key=\"consumer\""));
		assert!(header.contains("oauth_callback=\"https%3A%2F%2Fapp.example.com%2Fcb\""));
		assert!(header.contains("oauth_signature=\""));
	}

	#[test]
	fn callbacks_must_echo_the_temporary_token() {
		let client = OAuth1Client::new(settings(), Arc::new(RecordingHttpClient::default()))
			.expect("Client should build.");
		let callback = |query: &str| {
			Url::parse(&format!("https://app.example.com/cb?{query}"))
				.expect("Callback fixture should parse.")
		};

		assert_eq!(
			client
				.parse_callback(&callback("oauth_token=temp&oauth_verifier=v1"), &temporary())
				.expect("Matching callbacks should parse."),
			"v1"
		);

		let err = client
			.parse_callback(&callback("oauth_token=other&oauth_verifier=v1"), &temporary())
			.expect_err("Foreign tokens must fail.");

		assert!(err.is_state_mismatch());

		let err = client
			.parse_callback(&callback("oauth_token=temp&denied=temp"), &temporary())
			.expect_err("Denied callbacks must fail.");

		assert_eq!(err.code, AuthorizationErrorCode::Provider("access_denied".into()));
		assert_eq!(
			client.authorization_url(&temporary()).as_str(),
			"https://api.example.com/oauth/authorize?oauth_token=temp"
		);
	}

	#[tokio::test]
	async fn authorize_runs_the_whole_dance() {
		let http = Arc::new(
			RecordingHttpClient::default()
				.respond(200, FORM, "oauth_token=temp&oauth_token_secret=temp-secret")
				.respond(
					200,
					FORM,
					"oauth_token=final&oauth_token_secret=final-secret&screen_name=ann",
				),
		);
		let client = OAuth1Client::new(settings().params_location(ParamsLocation::Body), http.clone())
			.expect("Client should build.");
		let host = ScriptedHost::new(|request| {
			let token = request
				.url
				.query_pairs()
				.find(|(key, _)| key == "oauth_token")
				.map(|(_, value)| value.into_owned())
				.unwrap_or_default();

			NavigationOutcome::Redirected(
				Url::parse(&format!(
					"https://app.example.com/cb?oauth_token={token}&oauth_verifier=v1"
				))
				.expect("Callback should parse."),
			)
		});
		let credentials = client.authorize(&host).await.expect("Dance should complete.");

		assert_eq!(credentials.token.expose(), "final");
		assert_eq!(credentials.extra.get("screen_name").map(String::as_str), Some("ann"));
		assert_eq!(http.request_count(), 2);

		let access = http.requests()[1].form();

		assert_eq!(access.get("oauth_token").map(String::as_str), Some("temp"));
		assert_eq!(access.get("oauth_verifier").map(String::as_str), Some("v1"));
		assert_eq!(
			host.messages(),
			[MessageKind::OAuth1TokenRequested, MessageKind::OAuth1TokenResponse]
		);
	}

	#[tokio::test]
	async fn provider_problems_and_closed_windows_fail() {
		let http = Arc::new(RecordingHttpClient::default().respond(
			401,
			FORM,
			"oauth_problem=signature_invalid",
		));
		let client = OAuth1Client::new(settings(), http).expect("Client should build.");
		let err = client
			.request_temporary_credentials()
			.await
			.expect_err("Provider problems must fail.");

		assert_eq!(err.code(), Some("signature_invalid"));

		let http = Arc::new(RecordingHttpClient::default().respond(
			200,
			FORM,
			"oauth_token=temp&oauth_token_secret=temp-secret",
		));
		let client = OAuth1Client::new(settings().interactive(false), http.clone())
			.expect("Client should build.");
		let host = ScriptedHost::new(|_| NavigationOutcome::InteractionRequired);
		let err = client.authorize(&host).await.expect_err("Interaction must be refused.");
		let Error::Authorization(err) = err else { panic!("Expected an authorization error.") };

		assert_eq!(err.code, AuthorizationErrorCode::InteractionRequired);
		assert!(!err.interactive);
		assert_eq!(http.request_count(), 1);
		assert_eq!(host.messages(), [MessageKind::OAuth1TokenRequested, MessageKind::OAuth1Error]);
	}
}
