//! Transport contract for token endpoint calls.
//!
//! Flows build complete [`HttpRequest`] values (method, headers, form body) and hand them to a
//! [`TokenHttpClient`]. The crate ships a reqwest-backed implementation; hosts with their own
//! networking stack (a desktop shell, a proxying renderer) implement the trait themselves.

// crates.io
use ::oauth2::{
	HttpClientError, HttpRequest, HttpResponse,
	http::{
		HeaderValue, Method,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{_prelude::*, error::ConfigError};

/// Boxed future returned by [`TokenHttpClient::execute`].
pub type HttpFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError<E>>> + 'a + Send>>;

/// HTTP transport used for token endpoint exchanges.
///
/// Implementations must not follow redirects: token endpoints answer directly, and a redirect
/// would resend client credentials to another origin. The flows never retry a failed call.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends the request and resolves with the full response, whatever its status.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with redirect following disabled.
	pub fn new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`]; callers are responsible for disabling
	/// redirects on it.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Builds a form-encoded POST (or any other method) request.
pub(crate) fn form_request(
	method: Method,
	url: &Url,
	form: &[(String, String)],
	authorization: Option<&str>,
) -> Result<HttpRequest> {
	let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(form).finish();
	let mut builder = ::oauth2::http::Request::builder()
		.method(method)
		.uri(url.as_str())
		.header(
			ACCEPT,
			HeaderValue::from_static("application/json, application/x-www-form-urlencoded;q=0.9"),
		)
		.header(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));

	if let Some(value) = authorization {
		builder = builder.header(AUTHORIZATION, value);
	}

	Ok(builder.body(body.into_bytes()).map_err(ConfigError::from)?)
}
