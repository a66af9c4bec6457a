//! OAuth 2 request settings and their builder.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
	error::SettingsError,
	obs::FlowKind,
};

/// OAuth 2.0 grants the flow can drive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Token returned directly in the redirect fragment.
	Implicit,
	/// Code returned in the redirect and exchanged at the token endpoint.
	#[default]
	AuthorizationCode,
	/// App-only token requested with the client's own credentials.
	ClientCredentials,
	/// Resource owner password credentials.
	Password,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::Implicit => "implicit",
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::ClientCredentials => "client_credentials",
			GrantType::Password => "password",
		}
	}

	/// `response_type` sent to the authorization endpoint, for redirect-based grants.
	pub const fn response_type(self) -> Option<&'static str> {
		match self {
			GrantType::Implicit => Some("token"),
			GrantType::AuthorizationCode => Some("code"),
			GrantType::ClientCredentials | GrantType::Password => None,
		}
	}

	/// Returns true when the grant goes through the authorization endpoint.
	pub const fn uses_redirect(self) -> bool {
		self.response_type().is_some()
	}

	/// Observability label for the grant.
	pub const fn flow_kind(self) -> FlowKind {
		match self {
			GrantType::Implicit => FlowKind::Implicit,
			GrantType::AuthorizationCode => FlowKind::AuthorizationCode,
			GrantType::ClientCredentials => FlowKind::ClientCredentials,
			GrantType::Password => FlowKind::Password,
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How the client authenticates at the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// `client_id` and `client_secret` in the form body.
	#[default]
	ClientSecretPost,
	/// HTTP Basic with the form-encoded `client_id:client_secret` pair.
	ClientSecretBasic,
}

/// Settings for one OAuth 2 authorization, as sent by the host UI.
///
/// Deserializes from camelCase JSON; absent optional fields take their defaults. Values that
/// came from JSON should go through [`OAuth2Settings::validate`] before use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Settings {
	/// Grant to perform.
	#[serde(default)]
	pub grant_type: GrantType,
	/// Registered client identifier.
	pub client_id: String,
	/// Client secret, for confidential clients.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<Secret>,
	/// Authorization endpoint (implicit and authorization code grants).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authorization_uri: Option<Url>,
	/// Token endpoint (every grant except implicit).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token_uri: Option<Url>,
	/// Redirect URI registered with the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub redirect_uri: Option<Url>,
	/// Requested scopes.
	#[serde(default)]
	pub scopes: ScopeSet,
	/// Fixed `state` value; a random one is generated per attempt when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	/// Sends a PKCE S256 challenge with the authorization code grant.
	#[serde(default)]
	pub pkce: bool,
	/// Client authentication at the token endpoint.
	#[serde(default)]
	pub client_auth_method: ClientAuthMethod,
	/// Prefix prepended to the token endpoint URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_proxy: Option<String>,
	/// Percent-encodes the token endpoint before appending it to [`Self::token_proxy`].
	#[serde(default)]
	pub token_proxy_encode: bool,
	/// Whether the attempt may show UI to the user.
	#[serde(default = "interactive_default")]
	pub interactive: bool,
	/// Resource owner name for the password grant.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// Resource owner password for the password grant.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<Secret>,
}
impl OAuth2Settings {
	/// Creates a builder for the provided grant and client identifier.
	pub fn builder(grant_type: GrantType, client_id: impl Into<String>) -> OAuth2SettingsBuilder {
		OAuth2SettingsBuilder::new(grant_type, client_id)
	}

	/// Checks that every setting the grant needs is present.
	pub fn validate(&self) -> Result<(), SettingsError> {
		let grant = self.grant_type.as_str();
		let missing = |field| SettingsError::Missing { field, grant };

		if self.client_id.is_empty() {
			return Err(missing("client_id"));
		}
		if self.grant_type.uses_redirect() {
			if self.authorization_uri.is_none() {
				return Err(missing("authorization_uri"));
			}
			if self.redirect_uri.is_none() {
				return Err(missing("redirect_uri"));
			}
		}
		if self.grant_type != GrantType::Implicit && self.access_token_uri.is_none() {
			return Err(missing("access_token_uri"));
		}
		if self.grant_type == GrantType::Password {
			if self.username.as_deref().is_none_or(str::is_empty) {
				return Err(missing("username"));
			}
			if self.password.is_none() {
				return Err(missing("password"));
			}
		}

		Ok(())
	}
}

fn interactive_default() -> bool {
	true
}

/// Builder for [`OAuth2Settings`].
#[derive(Debug)]
pub struct OAuth2SettingsBuilder {
	settings: OAuth2Settings,
}
impl OAuth2SettingsBuilder {
	/// Creates a builder with every optional setting at its default.
	pub fn new(grant_type: GrantType, client_id: impl Into<String>) -> Self {
		Self {
			settings: OAuth2Settings {
				grant_type,
				client_id: client_id.into(),
				client_secret: None,
				authorization_uri: None,
				access_token_uri: None,
				redirect_uri: None,
				scopes: ScopeSet::default(),
				state: None,
				pkce: false,
				client_auth_method: ClientAuthMethod::default(),
				token_proxy: None,
				token_proxy_encode: false,
				interactive: true,
				username: None,
				password: None,
			},
		}
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<Secret>) -> Self {
		self.settings.client_secret = Some(secret.into());

		self
	}

	/// Sets the authorization endpoint.
	pub fn authorization_uri(mut self, url: Url) -> Self {
		self.settings.authorization_uri = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn access_token_uri(mut self, url: Url) -> Self {
		self.settings.access_token_uri = Some(url);

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.settings.redirect_uri = Some(url);

		self
	}

	/// Sets the requested scopes.
	pub fn scopes(mut self, scopes: ScopeSet) -> Self {
		self.settings.scopes = scopes;

		self
	}

	/// Pins the `state` value instead of generating one per attempt.
	pub fn state(mut self, state: impl Into<String>) -> Self {
		self.settings.state = Some(state.into());

		self
	}

	/// Enables or disables PKCE.
	pub fn pkce(mut self, enabled: bool) -> Self {
		self.settings.pkce = enabled;

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.settings.client_auth_method = method;

		self
	}

	/// Routes token requests through `proxy`, optionally percent-encoding the endpoint.
	pub fn token_proxy(mut self, proxy: impl Into<String>, encode: bool) -> Self {
		self.settings.token_proxy = Some(proxy.into());
		self.settings.token_proxy_encode = encode;

		self
	}

	/// Allows or forbids user interaction.
	pub fn interactive(mut self, interactive: bool) -> Self {
		self.settings.interactive = interactive;

		self
	}

	/// Sets resource owner credentials for the password grant.
	pub fn resource_owner(mut self, username: impl Into<String>, password: impl Into<Secret>) -> Self {
		self.settings.username = Some(username.into());
		self.settings.password = Some(password.into());

		self
	}

	/// Validates and returns the settings.
	pub fn build(self) -> Result<OAuth2Settings, SettingsError> {
		self.settings.validate()?;

		Ok(self.settings)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Fixture URL should parse.")
	}

	#[test]
	fn builder_requires_grant_specific_settings() {
		let err = OAuth2Settings::builder(GrantType::AuthorizationCode, "client")
			.authorization_uri(url("https://auth.example.com/authorize"))
			.redirect_uri(url("https://app.example.com/cb"))
			.build()
			.expect_err("Authorization code grant without token endpoint must fail.");

		assert_eq!(
			err,
			SettingsError::Missing { field: "access_token_uri", grant: "authorization_code" }
		);

		let err = OAuth2Settings::builder(GrantType::Password, "client")
			.access_token_uri(url("https://auth.example.com/token"))
			.build()
			.expect_err("Password grant without credentials must fail.");

		assert_eq!(err, SettingsError::Missing { field: "username", grant: "password" });

		OAuth2Settings::builder(GrantType::Implicit, "client")
			.authorization_uri(url("https://auth.example.com/authorize"))
			.redirect_uri(url("https://app.example.com/cb"))
			.build()
			.expect("Implicit grant needs no token endpoint.");
	}

	#[test]
	fn settings_deserialize_from_camel_case() {
		let settings: OAuth2Settings = serde_json::from_str(
			r#"{
				"grantType": "client_credentials",
				"clientId": "svc",
				"clientSecret": "shh",
				"accessTokenUri": "https://auth.example.com/token",
				"scopes": "read write",
				"clientAuthMethod": "client_secret_basic",
				"tokenProxy": "https://proxy.example.com/?u=",
				"tokenProxyEncode": true
			}"#,
		)
		.expect("Settings JSON should deserialize.");

		assert_eq!(settings.grant_type, GrantType::ClientCredentials);
		assert_eq!(settings.client_auth_method, ClientAuthMethod::ClientSecretBasic);
		assert_eq!(settings.scopes.len(), 2);
		assert!(settings.interactive);
		assert!(settings.token_proxy_encode);
		assert!(settings.validate().is_ok());
	}

	#[test]
	fn response_types_follow_grants() {
		assert_eq!(GrantType::Implicit.response_type(), Some("token"));
		assert_eq!(GrantType::AuthorizationCode.response_type(), Some("code"));
		assert!(!GrantType::ClientCredentials.uses_redirect());
		assert_eq!(GrantType::Password.flow_kind(), FlowKind::Password);
	}
}
