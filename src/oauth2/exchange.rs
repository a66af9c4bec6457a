//! Token endpoint requests and response parsing.

// crates.io
use ::oauth2::{
	HttpRequest, HttpResponse,
	http::{Method, header::CONTENT_TYPE},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	encoding,
	error::{CodeError, ConfigError, SettingsError},
	http::{self, TokenHttpClient},
	oauth2::{ClientAuthMethod, GrantType, OAuth2Settings, TokenResult},
};

/// Fully prepared token endpoint call.
#[derive(Clone)]
pub struct TokenRequest {
	/// Target URL after proxy rewriting.
	pub url: Url,
	/// Form body pairs in send order.
	pub form: Vec<(String, String)>,
	authorization: Option<String>,
}
impl TokenRequest {
	/// Exchange of an authorization code.
	pub fn authorization_code(
		settings: &OAuth2Settings,
		code: &str,
		redirect_uri: &Url,
		code_verifier: Option<&str>,
	) -> Result<Self> {
		let mut request = Self::with_client_auth(settings, GrantType::AuthorizationCode)?;

		request.push("code", code);
		request.push("redirect_uri", redirect_uri.as_str());

		if let Some(verifier) = code_verifier {
			request.push("code_verifier", verifier);
		}

		Ok(request)
	}

	/// Client credentials grant.
	pub fn client_credentials(settings: &OAuth2Settings) -> Result<Self> {
		let mut request = Self::with_client_auth(settings, GrantType::ClientCredentials)?;

		request.push_scope(&settings.scopes);

		Ok(request)
	}

	/// Resource owner password grant.
	pub fn password(settings: &OAuth2Settings) -> Result<Self> {
		let grant = GrantType::Password;
		let username = settings
			.username
			.as_deref()
			.ok_or(SettingsError::Missing { field: "username", grant: grant.as_str() })?;
		let password = settings
			.password
			.as_ref()
			.ok_or(SettingsError::Missing { field: "password", grant: grant.as_str() })?;
		let mut request = Self::with_client_auth(settings, grant)?;

		request.push("username", username);
		request.push("password", password.expose());
		request.push_scope(&settings.scopes);

		Ok(request)
	}

	/// `Authorization` header value, when Basic client authentication is used.
	pub fn authorization_header(&self) -> Option<&str> {
		self.authorization.as_deref()
	}

	/// Builds the form POST.
	pub fn into_http_request(self) -> Result<HttpRequest> {
		http::form_request(Method::POST, &self.url, &self.form, self.authorization.as_deref())
	}

	fn with_client_auth(settings: &OAuth2Settings, grant: GrantType) -> Result<Self> {
		let mut request = Self {
			url: token_endpoint(settings)?,
			form: vec![("grant_type".into(), grant.as_str().into())],
			authorization: None,
		};
		let secret = settings.client_secret.as_ref().filter(|secret| !secret.is_empty());

		match (settings.client_auth_method, secret) {
			(ClientAuthMethod::ClientSecretBasic, Some(secret)) => {
				request.authorization =
					Some(basic_authorization(&settings.client_id, secret.expose()));
			},
			(_, secret) => {
				request.push("client_id", &settings.client_id);

				if let Some(secret) = secret {
					request.push("client_secret", secret.expose());
				}
			},
		}

		Ok(request)
	}

	fn push(&mut self, key: &str, value: &str) {
		self.form.push((key.to_owned(), value.to_owned()));
	}

	fn push_scope(&mut self, scopes: &ScopeSet) {
		if let Some(scope) = scopes.joined(' ') {
			self.push("scope", &scope);
		}
	}
}
impl Debug for TokenRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let keys = self.form.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>();

		f.debug_struct("TokenRequest")
			.field("url", &self.url.as_str())
			.field("form_keys", &keys)
			.field("basic_auth", &self.authorization.is_some())
			.finish()
	}
}

/// Resolves the URL token requests are sent to.
///
/// With a proxy configured the endpoint is appended to it, percent-encoded as a URI component
/// when `token_proxy_encode` is set.
pub fn token_endpoint(settings: &OAuth2Settings) -> Result<Url> {
	let endpoint = settings.access_token_uri.as_ref().ok_or(SettingsError::Missing {
		field: "access_token_uri",
		grant: settings.grant_type.as_str(),
	})?;
	let Some(proxy) = settings.token_proxy.as_deref().filter(|proxy| !proxy.is_empty()) else {
		return Ok(endpoint.clone());
	};
	let target = if settings.token_proxy_encode {
		encoding::encode_uri_component(endpoint.as_str())
	} else {
		endpoint.as_str().to_owned()
	};

	Url::parse(&format!("{proxy}{target}"))
		.map_err(|source| ConfigError::InvalidUrl { field: "token proxy", source }.into())
}

/// Sends `request` once and turns the response into a [`TokenResult`].
pub async fn exchange<C>(
	http_client: &C,
	request: TokenRequest,
	state: Option<String>,
) -> Result<TokenResult>
where
	C: ?Sized + TokenHttpClient,
{
	let response = http_client
		.execute(request.into_http_request()?)
		.await
		.map_err(CodeError::transport)?;

	Ok(parse_token_response(&response, state)?)
}

/// Parses a token endpoint response (JSON or form-encoded).
pub fn parse_token_response(
	response: &HttpResponse,
	state: Option<String>,
) -> Result<TokenResult, CodeError> {
	let status = response.status();
	let body = response.body();
	let is_json = response
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.contains("json"))
		|| body.trim_ascii_start().starts_with(b"{");
	let parsed = if is_json { parse_json(body, status.as_u16()) } else { Ok(parse_form(body)) };

	if !status.is_success() {
		// Providers report OAuth errors with a 4xx status and a JSON body; keep their code.
		if let Ok(TokenResponseBody { error: Some(code), error_description, .. }) = parsed {
			return Err(provider_error(code, error_description).with_status(status.as_u16()));
		}

		return Err(CodeError::new(
			CodeError::REQUEST_ERROR,
			format!("Token endpoint responded with HTTP {}.", status.as_u16()),
		)
		.with_status(status.as_u16()));
	}

	parsed?.into_token_result(state, OffsetDateTime::now_utc())
}

/// Raw token endpoint (or implicit redirect) fields before validation.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct TokenResponseBody {
	access_token: Option<String>,
	token_type: Option<String>,
	expires_in: Option<NumberOrText>,
	refresh_token: Option<String>,
	scope: Option<ScopeField>,
	error: Option<String>,
	error_description: Option<String>,
}
impl TokenResponseBody {
	pub(crate) fn from_params(params: &BTreeMap<String, String>) -> Self {
		let get = |key: &str| params.get(key).cloned();

		Self {
			access_token: get("access_token"),
			token_type: get("token_type"),
			expires_in: get("expires_in").map(NumberOrText::Text),
			refresh_token: get("refresh_token"),
			scope: get("scope").map(ScopeField::Text),
			error: get("error"),
			error_description: get("error_description"),
		}
	}

	pub(crate) fn into_token_result(
		self,
		state: Option<String>,
		now: OffsetDateTime,
	) -> Result<TokenResult, CodeError> {
		if let Some(code) = self.error {
			return Err(provider_error(code, self.error_description));
		}

		let access_token = self.access_token.filter(|token| !token.is_empty()).ok_or_else(|| {
			CodeError::new(CodeError::NO_ACCESS_TOKEN, "Response did not include an access token.")
		})?;
		let expires_in = self.expires_in.and_then(NumberOrText::as_i64);
		// Lifetimes past the representable range leave `expires_at` unset.
		let expires_at =
			expires_in.and_then(|seconds| now.checked_add(Duration::seconds(seconds)));
		let scope = self.scope.and_then(ScopeField::into_scopes);

		Ok(TokenResult {
			access_token: access_token.into(),
			token_type: self
				.token_type
				.filter(|value| !value.is_empty())
				.unwrap_or_else(|| "Bearer".into()),
			expires_in,
			expires_at,
			refresh_token: self.refresh_token.filter(|token| !token.is_empty()).map(Into::into),
			scope,
			state,
		})
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
	Number(i64),
	Text(String),
}
impl NumberOrText {
	fn as_i64(self) -> Option<i64> {
		match self {
			NumberOrText::Number(value) => Some(value),
			NumberOrText::Text(text) => text.trim().parse().ok(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum ScopeField {
	List(Vec<String>),
	Text(String),
}
impl ScopeField {
	fn into_scopes(self) -> Option<ScopeSet> {
		let scopes = match self {
			ScopeField::List(values) => ScopeSet::new(values).ok(),
			ScopeField::Text(text) => text.parse::<ScopeSet>().ok(),
		}?;

		(!scopes.is_empty()).then_some(scopes)
	}
}

fn parse_json(body: &[u8], status: u16) -> Result<TokenResponseBody, CodeError> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|e| CodeError::parse(e, status))
}

fn parse_form(body: &[u8]) -> TokenResponseBody {
	let params = form_urlencoded::parse(body).into_owned().collect();

	TokenResponseBody::from_params(&params)
}

fn provider_error(code: String, description: Option<String>) -> CodeError {
	let message =
		description.unwrap_or_else(|| "The token endpoint rejected the request.".to_owned());

	CodeError::new(code, message)
}

fn basic_authorization(client_id: &str, client_secret: &str) -> String {
	let id = form_urlencoded::byte_serialize(client_id.as_bytes()).collect::<String>();
	let secret = form_urlencoded::byte_serialize(client_secret.as_bytes()).collect::<String>();

	format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	fn settings(grant: GrantType) -> OAuth2Settings {
		OAuth2Settings::builder(grant, "client id")
			.client_secret("s3cr:t")
			.access_token_uri(
				Url::parse("https://auth.example.com/token?tenant=a").expect("Token URL should parse."),
			)
			.resource_owner("ann", "pw")
			.scopes(ScopeSet::new(["read"]).expect("Scope fixture should be valid."))
			.build()
			.expect("Settings fixture should be valid.")
	}

	fn response(status: u16, content_type: &str, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			::oauth2::http::StatusCode::from_u16(status).expect("Fixture status should be valid.");
		response.headers_mut().insert(
			CONTENT_TYPE,
			content_type.parse().expect("Fixture content type should be a valid header."),
		);

		response
	}

	#[test]
	fn post_auth_puts_credentials_in_the_body() {
		let request = TokenRequest::authorization_code(
			&settings(GrantType::AuthorizationCode),
			"abc",
			&Url::parse("https://app.example.com/cb").expect("Redirect URL should parse."),
			Some("verifier"),
		)
		.expect("Request should build.");
		let keys = request.form.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>();

		assert_eq!(
			keys,
			["grant_type", "client_id", "client_secret", "code", "redirect_uri", "code_verifier"]
		);
		assert_eq!(request.authorization_header(), None);
	}

	#[test]
	fn basic_auth_encodes_credentials_in_the_header() {
		let mut settings = settings(GrantType::ClientCredentials);

		settings.client_auth_method = ClientAuthMethod::ClientSecretBasic;

		let request = TokenRequest::client_credentials(&settings).expect("Request should build.");

		assert_eq!(request.authorization_header(), Some("Basic Y2xpZW50K2lkOnMzY3IlM0F0"));
		assert!(request.form.iter().all(|(key, _)| key != "client_secret" && key != "client_id"));
		assert!(request.form.contains(&("scope".into(), "read".into())));
	}

	#[test]
	fn password_grant_sends_owner_credentials() {
		let request =
			TokenRequest::password(&settings(GrantType::Password)).expect("Request should build.");

		assert!(request.form.contains(&("grant_type".into(), "password".into())));
		assert!(request.form.contains(&("username".into(), "ann".into())));
		assert!(request.form.contains(&("password".into(), "pw".into())));
	}

	#[test]
	fn token_proxy_prefixes_the_endpoint() {
		let mut settings = settings(GrantType::ClientCredentials);

		settings.token_proxy = Some("https://proxy.example.com/fetch?url=".into());

		assert_eq!(
			token_endpoint(&settings).expect("Proxy URL should parse.").as_str(),
			"https://proxy.example.com/fetch?url=https://auth.example.com/token?tenant=a"
		);

		settings.token_proxy_encode = true;

		assert_eq!(
			token_endpoint(&settings).expect("Proxy URL should parse.").as_str(),
			"https://proxy.example.com/fetch?url=https%3A%2F%2Fauth.example.com%2Ftoken%3Ftenant%3Da"
		);
	}

	#[test]
	fn json_and_form_bodies_parse() {
		let json = response(
			200,
			"application/json",
			r#"{"access_token":"at","token_type":"bearer","expires_in":3600,"refresh_token":"rt","scope":"read write"}"#,
		);
		let result =
			parse_token_response(&json, Some("st".into())).expect("JSON body should parse.");

		assert_eq!(result.access_token.expose(), "at");
		assert_eq!(result.token_type, "bearer");
		assert_eq!(result.expires_in, Some(3600));
		assert!(result.expires_at.is_some());
		assert_eq!(result.refresh_token.as_ref().map(|t| t.expose()), Some("rt"));
		assert_eq!(result.scope.as_ref().map(ScopeSet::len), Some(2));
		assert_eq!(result.state.as_deref(), Some("st"));

		let form = response(
			200,
			"application/x-www-form-urlencoded",
			"access_token=at2&expires_in=60",
		);
		let result = parse_token_response(&form, None).expect("Form body should parse.");

		assert_eq!(result.access_token.expose(), "at2");
		assert_eq!(result.token_type, "Bearer");
		assert_eq!(result.expires_in, Some(60));
	}

	#[test]
	fn out_of_range_lifetimes_leave_expiry_unset() {
		let json = response(
			200,
			"application/json",
			r#"{"access_token":"at","expires_in":9223372036854775807}"#,
		);
		let result = parse_token_response(&json, None).expect("Huge lifetimes should still parse.");

		assert_eq!(result.expires_in, Some(i64::MAX));
		assert_eq!(result.expires_at, None);

		let params = BTreeMap::from([
			("access_token".to_owned(), "at".to_owned()),
			("expires_in".to_owned(), "-99999999999999".to_owned()),
		]);
		let result = TokenResponseBody::from_params(&params)
			.into_token_result(None, OffsetDateTime::now_utc())
			.expect("Negative lifetimes should still parse.");

		assert_eq!(result.expires_at, None);
	}

	#[test]
	fn failures_map_to_code_errors() {
		let provider = response(
			400,
			"application/json",
			r#"{"error":"invalid_grant","error_description":"Code expired."}"#,
		);
		let err = parse_token_response(&provider, None).expect_err("Provider errors must fail.");

		assert_eq!(err.code, "invalid_grant");
		assert_eq!(err.message, "Code expired.");
		assert_eq!(err.status, Some(400));

		let server = response(502, "text/html", "<html>bad gateway</html>");
		let err = parse_token_response(&server, None).expect_err("HTTP failures must fail.");

		assert_eq!(err.code, CodeError::REQUEST_ERROR);
		assert_eq!(err.status, Some(502));

		let malformed = response(200, "application/json", r#"{"access_token": 5}"#);
		let err = parse_token_response(&malformed, None).expect_err("Malformed JSON must fail.");

		assert_eq!(err.code, CodeError::RESPONSE_PARSE);

		let empty = response(200, "application/json", r#"{"token_type":"bearer"}"#);
		let err = parse_token_response(&empty, None).expect_err("Missing tokens must fail.");

		assert_eq!(err.code, CodeError::NO_ACCESS_TOKEN);
	}

	#[tokio::test]
	async fn exchange_sends_exactly_one_request() {
		let client = RecordingHttpClient::default()
			.respond_json(r#"{"access_token":"at","token_type":"Bearer"}"#);
		let request = TokenRequest::client_credentials(&settings(GrantType::ClientCredentials))
			.expect("Request should build.");
		let result = exchange(&client, request, None).await.expect("Exchange should succeed.");

		assert_eq!(result.access_token.expose(), "at");
		assert_eq!(client.request_count(), 1);

		let recorded = &client.requests()[0];

		assert_eq!(recorded.method, "POST");
		assert_eq!(
			recorded.header("content-type"),
			Some("application/x-www-form-urlencoded")
		);
		assert_eq!(
			recorded.form().get("grant_type").map(String::as_str),
			Some("client_credentials")
		);
	}
}
