//! OAuth 1.0a request signing (RFC 5849 section 3.4).
//!
//! Signing is deterministic: the same method, URL, parameters, secrets, nonce, and timestamp
//! always produce the same signature. Supply [`SignatureRequest::nonce`] and
//! [`SignatureRequest::timestamp`] when reproducibility matters.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac, digest::KeyInit};
use sha1::Sha1;
use sha2::Sha256;
// self
use crate::{_prelude::*, auth, auth::Secret, encoding, error::ConfigError};

const NONCE_LEN: usize = 32;
const OAUTH_VERSION: &str = "1.0";

/// Signature methods understood by the signer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureMethod {
	/// HMAC over SHA-1.
	#[default]
	#[serde(rename = "HMAC-SHA1")]
	HmacSha1,
	/// HMAC over SHA-256.
	#[serde(rename = "HMAC-SHA256")]
	HmacSha256,
	/// The signing key itself, sent over TLS.
	#[serde(rename = "PLAINTEXT")]
	Plaintext,
	/// RSA over SHA-1. Recognized but not supported for signing.
	#[serde(rename = "RSA-SHA1")]
	RsaSha1,
}
impl SignatureMethod {
	/// Wire name sent as `oauth_signature_method`.
	pub const fn as_str(self) -> &'static str {
		match self {
			SignatureMethod::HmacSha1 => "HMAC-SHA1",
			SignatureMethod::HmacSha256 => "HMAC-SHA256",
			SignatureMethod::Plaintext => "PLAINTEXT",
			SignatureMethod::RsaSha1 => "RSA-SHA1",
		}
	}
}
impl Display for SignatureMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for SignatureMethod {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		[Self::HmacSha1, Self::HmacSha256, Self::Plaintext, Self::RsaSha1]
			.into_iter()
			.find(|method| method.as_str().eq_ignore_ascii_case(s))
			.ok_or(ConfigError::UnsupportedSignatureMethod { method: "unknown" })
	}
}

/// Percent-encodes per RFC 5849 section 3.6.
pub fn percent_encode(value: &str) -> String {
	encoding::encode_rfc3986(value)
}

/// Base string URI: scheme and host lowercased, default port dropped, no query or fragment.
pub fn normalize_url(url: &Url) -> String {
	let scheme = url.scheme().to_ascii_lowercase();
	let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
	let port = url.port().map(|port| format!(":{port}")).unwrap_or_default();

	format!("{scheme}://{host}{port}{}", url.path())
}

/// Normalized, sorted parameter string.
///
/// Takes the URL's query pairs plus `params`, skipping `oauth_signature` and `realm`.
pub fn normalized_parameters(url: &Url, params: &[(String, String)]) -> String {
	let mut encoded = url
		.query_pairs()
		.into_owned()
		.chain(params.iter().cloned())
		.filter(|(key, _)| key != "oauth_signature" && key != "realm")
		.map(|(key, value)| (percent_encode(&key), percent_encode(&value)))
		.collect::<Vec<_>>();

	encoded.sort();

	encoded.into_iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&")
}

/// `METHOD&url&params` string that gets signed.
pub fn signature_base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
	format!(
		"{}&{}&{}",
		method.to_ascii_uppercase(),
		percent_encode(&normalize_url(url)),
		percent_encode(&normalized_parameters(url, params))
	)
}

/// `consumer_secret&token_secret`, both percent-encoded.
pub fn signing_key(consumer_secret: &str, token_secret: Option<&str>) -> String {
	format!(
		"{}&{}",
		percent_encode(consumer_secret),
		percent_encode(token_secret.unwrap_or_default())
	)
}

/// Signs `text` with `key` and returns the base64 signature (or the key, for `PLAINTEXT`).
pub fn sign_text(method: SignatureMethod, key: &str, text: &str) -> Result<String, ConfigError> {
	match method {
		SignatureMethod::HmacSha1 => hmac_base64::<Hmac<Sha1>>(method, key, text),
		SignatureMethod::HmacSha256 => hmac_base64::<Hmac<Sha256>>(method, key, text),
		SignatureMethod::Plaintext => Ok(key.to_owned()),
		SignatureMethod::RsaSha1 =>
			Err(ConfigError::UnsupportedSignatureMethod { method: method.as_str() }),
	}
}

fn hmac_base64<M>(method: SignatureMethod, key: &str, text: &str) -> Result<String, ConfigError>
where
	M: Mac + KeyInit,
{
	let mut mac = <M as Mac>::new_from_slice(key.as_bytes())
		.map_err(|_| ConfigError::InvalidSigningKey { method: method.as_str() })?;

	mac.update(text.as_bytes());

	Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Request-specific inputs to [`OAuth1Signer::sign`].
#[derive(Clone, Debug)]
pub struct SignatureRequest {
	/// HTTP method.
	pub method: String,
	/// Target URL; its query parameters are signed.
	pub url: Url,
	/// Token credential, once one has been issued.
	pub token: Option<String>,
	/// Secret belonging to [`Self::token`].
	pub token_secret: Option<Secret>,
	/// Fixed nonce; a random one is generated when absent.
	pub nonce: Option<String>,
	/// Fixed Unix timestamp; the current time is used when absent.
	pub timestamp: Option<i64>,
	/// Additional protocol parameters such as `oauth_callback` or `oauth_verifier`.
	pub oauth_params: Vec<(String, String)>,
	/// Form body parameters (only for `application/x-www-form-urlencoded` bodies).
	pub body_params: Vec<(String, String)>,
}
impl SignatureRequest {
	/// Creates a request for `method` and `url`.
	pub fn new(method: impl Into<String>, url: Url) -> Self {
		Self {
			method: method.into(),
			url,
			token: None,
			token_secret: None,
			nonce: None,
			timestamp: None,
			oauth_params: Vec::new(),
			body_params: Vec::new(),
		}
	}

	/// Sets the token credential and its secret.
	pub fn token(mut self, token: impl Into<String>, secret: impl Into<Secret>) -> Self {
		self.token = Some(token.into());
		self.token_secret = Some(secret.into());

		self
	}

	/// Pins the nonce.
	pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
		self.nonce = Some(nonce.into());

		self
	}

	/// Pins the timestamp.
	pub fn timestamp(mut self, timestamp: i64) -> Self {
		self.timestamp = Some(timestamp);

		self
	}

	/// Adds a protocol parameter.
	pub fn oauth_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.oauth_params.push((key.into(), value.into()));

		self
	}

	/// Adds form body parameters.
	pub fn body_params<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.body_params.extend(params.into_iter().map(|(key, value)| (key.into(), value.into())));

		self
	}
}

/// Result of signing: every protocol parameter, `oauth_signature` last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRequest {
	/// Protocol parameters in send order, including `oauth_signature`.
	pub oauth_params: Vec<(String, String)>,
	/// String that was signed.
	pub base_string: String,
	realm: Option<String>,
}
impl SignedRequest {
	/// The computed `oauth_signature`.
	pub fn signature(&self) -> &str {
		self.param("oauth_signature").unwrap_or_default()
	}

	/// Looks up a protocol parameter.
	pub fn param(&self, key: &str) -> Option<&str> {
		self.oauth_params.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
	}

	/// `Authorization` header value.
	pub fn authorization_header(&self) -> String {
		let realm = self.realm.as_ref().map(|realm| format!("realm=\"{}\"", percent_encode(realm)));
		let params = self
			.oauth_params
			.iter()
			.map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)));

		format!("OAuth {}", realm.into_iter().chain(params).collect::<Vec<_>>().join(", "))
	}

	/// Protocol parameters for query string or form body delivery.
	pub fn query_pairs(&self) -> &[(String, String)] {
		&self.oauth_params
	}
}

/// Consumer-side signer.
#[derive(Clone)]
pub struct OAuth1Signer {
	consumer_key: String,
	consumer_secret: Secret,
	method: SignatureMethod,
	realm: Option<String>,
}
impl OAuth1Signer {
	/// Creates a signer for the consumer credentials.
	pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<Secret>) -> Self {
		Self {
			consumer_key: consumer_key.into(),
			consumer_secret: consumer_secret.into(),
			method: SignatureMethod::default(),
			realm: None,
		}
	}

	/// Overrides the signature method (defaults to `HMAC-SHA1`).
	pub fn with_method(mut self, method: SignatureMethod) -> Self {
		self.method = method;

		self
	}

	/// Sets the `realm` sent in the `Authorization` header.
	pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
		self.realm = Some(realm.into());

		self
	}

	/// Signature method in use.
	pub fn method(&self) -> SignatureMethod {
		self.method
	}

	/// Signs `request`.
	pub fn sign(&self, request: &SignatureRequest) -> Result<SignedRequest> {
		if self.method == SignatureMethod::RsaSha1 {
			return Err(ConfigError::UnsupportedSignatureMethod { method: self.method.as_str() }.into());
		}

		let nonce = request.nonce.clone().unwrap_or_else(|| auth::random_string(NONCE_LEN));
		let timestamp = request.timestamp.unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp());
		let mut oauth_params = vec![
			("oauth_consumer_key".to_owned(), self.consumer_key.clone()),
			("oauth_nonce".to_owned(), nonce),
			("oauth_signature_method".to_owned(), self.method.as_str().to_owned()),
			("oauth_timestamp".to_owned(), timestamp.to_string()),
			("oauth_version".to_owned(), OAUTH_VERSION.to_owned()),
		];

		if let Some(token) = &request.token {
			oauth_params.push(("oauth_token".to_owned(), token.clone()));
		}

		oauth_params.extend(request.oauth_params.iter().cloned());

		let signed_params =
			oauth_params.iter().chain(request.body_params.iter()).cloned().collect::<Vec<_>>();
		let base_string = signature_base_string(&request.method, &request.url, &signed_params);
		let key = signing_key(
			self.consumer_secret.expose(),
			request.token_secret.as_ref().map(Secret::expose),
		);
		let signature = sign_text(self.method, &key, &base_string)?;

		oauth_params.push(("oauth_signature".to_owned(), signature));

		Ok(SignedRequest { oauth_params, base_string, realm: self.realm.clone() })
	}
}
impl Debug for OAuth1Signer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth1Signer")
			.field("consumer_key", &self.consumer_key)
			.field("consumer_secret", &self.consumer_secret)
			.field("method", &self.method)
			.field("realm", &self.realm)
			.finish()
	}
}
