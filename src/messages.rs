//! Typed messages exchanged between the flows and their host.
//!
//! Kinds are a fixed table. [`MessageKind::from_name`] resolves wire names through a registry
//! built on first use and never modified afterwards.

// std
use std::sync::LazyLock;
// self
use crate::{
	_prelude::*,
	oauth1::{OAuth1Settings, Oauth1Credentials},
	oauth2::{OAuth2Settings, TokenResult},
};

/// Every message kind, in declaration order.
pub const MESSAGE_KINDS: [MessageKind; 6] = [
	MessageKind::OAuth1TokenRequested,
	MessageKind::OAuth1TokenResponse,
	MessageKind::OAuth1Error,
	MessageKind::OAuth2TokenRequested,
	MessageKind::OAuth2TokenResponse,
	MessageKind::OAuth2Error,
];

static REGISTRY: LazyLock<HashMap<&'static str, MessageKind>> =
	LazyLock::new(|| MESSAGE_KINDS.into_iter().map(|kind| (kind.name(), kind)).collect());

/// Kind of an [`AuthorizationMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
	/// An OAuth 1 authorization started.
	OAuth1TokenRequested,
	/// OAuth 1 token credentials were obtained.
	OAuth1TokenResponse,
	/// An OAuth 1 authorization failed.
	OAuth1Error,
	/// An OAuth 2 authorization started.
	OAuth2TokenRequested,
	/// An OAuth 2 token was obtained.
	OAuth2TokenResponse,
	/// An OAuth 2 authorization failed.
	OAuth2Error,
}
impl MessageKind {
	/// Wire name.
	pub const fn name(self) -> &'static str {
		match self {
			MessageKind::OAuth1TokenRequested => "oauth1-token-requested",
			MessageKind::OAuth1TokenResponse => "oauth1-token-response",
			MessageKind::OAuth1Error => "oauth1-error",
			MessageKind::OAuth2TokenRequested => "oauth2-token-requested",
			MessageKind::OAuth2TokenResponse => "oauth2-token-response",
			MessageKind::OAuth2Error => "oauth2-error",
		}
	}

	/// Resolves a wire name.
	pub fn from_name(name: &str) -> Option<Self> {
		REGISTRY.get(name).copied()
	}
}
impl Display for MessageKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.name())
	}
}

/// Serialized failure carried by the `*-error` messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
	/// Machine-readable code.
	pub code: String,
	/// Human-readable description.
	pub message: String,
	/// State issued for the attempt, for authorization failures.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	/// Interactivity of the attempt, for authorization failures.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub interactive: Option<bool>,
}
impl ErrorPayload {
	/// Flattens a crate error.
	pub fn from_error(error: &Error) -> Self {
		match error {
			Error::Authorization(e) => Self {
				code: e.code.as_str().to_owned(),
				message: e.message.clone(),
				state: e.state.clone(),
				interactive: Some(e.interactive),
			},
			Error::Code(e) => Self::plain(&e.code, &e.message),
			Error::Eval(e) => Self::plain("eval_error", &e.to_string()),
			Error::Config(e) => Self::plain("config_error", &e.to_string()),
			Error::InvalidTransition { .. } => Self::plain("invalid_transition", &error.to_string()),
		}
	}

	fn plain(code: &str, message: &str) -> Self {
		Self { code: code.to_owned(), message: message.to_owned(), state: None, interactive: None }
	}
}

/// Message posted to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum AuthorizationMessage {
	/// OAuth 1 authorization started with these settings.
	#[serde(rename = "oauth1-token-requested")]
	OAuth1TokenRequested(Box<OAuth1Settings>),
	/// OAuth 1 token credentials.
	#[serde(rename = "oauth1-token-response")]
	OAuth1TokenResponse(Oauth1Credentials),
	/// OAuth 1 failure.
	#[serde(rename = "oauth1-error")]
	OAuth1Error(ErrorPayload),
	/// OAuth 2 authorization started with these settings.
	#[serde(rename = "oauth2-token-requested")]
	OAuth2TokenRequested(Box<OAuth2Settings>),
	/// OAuth 2 token.
	#[serde(rename = "oauth2-token-response")]
	OAuth2TokenResponse(TokenResult),
	/// OAuth 2 failure.
	#[serde(rename = "oauth2-error")]
	OAuth2Error(ErrorPayload),
}
impl AuthorizationMessage {
	/// Kind of this message.
	pub const fn kind(&self) -> MessageKind {
		match self {
			AuthorizationMessage::OAuth1TokenRequested(_) => MessageKind::OAuth1TokenRequested,
			AuthorizationMessage::OAuth1TokenResponse(_) => MessageKind::OAuth1TokenResponse,
			AuthorizationMessage::OAuth1Error(_) => MessageKind::OAuth1Error,
			AuthorizationMessage::OAuth2TokenRequested(_) => MessageKind::OAuth2TokenRequested,
			AuthorizationMessage::OAuth2TokenResponse(_) => MessageKind::OAuth2TokenResponse,
			AuthorizationMessage::OAuth2Error(_) => MessageKind::OAuth2Error,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{AuthorizationError, AuthorizationErrorCode, CodeError};

	#[test]
	fn names_round_trip_through_the_registry() {
		for kind in MESSAGE_KINDS {
			assert_eq!(MessageKind::from_name(kind.name()), Some(kind));
		}

		assert_eq!(MessageKind::from_name("oauth2-token-grant"), None);
	}

	#[test]
	fn messages_serialize_with_their_kind_name() {
		let payload = ErrorPayload::from_error(&Error::from(
			AuthorizationError::state_mismatch("st").with_interactive(false),
		));
		let message = AuthorizationMessage::OAuth2Error(payload);
		let json = serde_json::to_value(&message).expect("Messages should serialize.");

		assert_eq!(json["type"], message.kind().name());
		assert_eq!(json["detail"]["code"], "invalid_state");
		assert_eq!(json["detail"]["state"], "st");
		assert_eq!(json["detail"]["interactive"], false);

		let back: AuthorizationMessage =
			serde_json::from_value(json).expect("Messages should deserialize.");

		assert_eq!(back, message);
	}

	#[test]
	fn error_payloads_keep_codes() {
		let payload = ErrorPayload::from_error(&CodeError::new("invalid_grant", "Nope.").into());

		assert_eq!(payload.code, "invalid_grant");
		assert_eq!(payload.interactive, None);

		let payload = ErrorPayload::from_error(
			&AuthorizationError::new(AuthorizationErrorCode::UserInterrupted, "Closed.").into(),
		);

		assert_eq!(payload.code, "user_interrupted");
		assert_eq!(payload.interactive, Some(true));
	}
}
