//! Crate-level error types shared across flows, expressions, and host rules.

// self
use crate::{_prelude::*, oauth2::FlowState};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The authorization step failed (state mismatch, user interruption, provider error).
	#[error(transparent)]
	Authorization(#[from] AuthorizationError),
	/// The token endpoint call failed or returned an unusable response.
	#[error(transparent)]
	Code(#[from] CodeError),
	/// Expression evaluation failed.
	#[error(transparent)]
	Eval(#[from] EvalError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The flow received input that its current state cannot accept.
	#[error("Authorization flow cannot move from {from} to {to}.")]
	InvalidTransition {
		/// State the flow was in.
		from: FlowState,
		/// State the caller attempted to reach.
		to: FlowState,
	},
}
impl Error {
	/// Returns the machine-readable code for authorization and token endpoint failures.
	pub fn code(&self) -> Option<&str> {
		match self {
			Self::Authorization(e) => Some(e.code.as_str()),
			Self::Code(e) => Some(e.code.as_str()),
			_ => None,
		}
	}
}

impl From<SettingsError> for Error {
	fn from(e: SettingsError) -> Self {
		Self::Config(e.into())
	}
}

/// Machine-readable reason attached to an [`AuthorizationError`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AuthorizationErrorCode {
	/// The returned `state` is missing or differs from the issued one.
	InvalidState,
	/// A non-interactive attempt needed user interaction.
	InteractionRequired,
	/// The user closed or dismissed the authorization surface.
	UserInterrupted,
	/// The host reported no redirect at all.
	NoResponse,
	/// Error code reported by the authorization server (`error=...`).
	Provider(String),
}
impl AuthorizationErrorCode {
	/// Returns the wire representation of the code.
	pub fn as_str(&self) -> &str {
		match self {
			Self::InvalidState => "invalid_state",
			Self::InteractionRequired => "interaction_required",
			Self::UserInterrupted => "user_interrupted",
			Self::NoResponse => "no_response",
			Self::Provider(code) => code,
		}
	}
}
impl From<String> for AuthorizationErrorCode {
	fn from(value: String) -> Self {
		match value.as_str() {
			"invalid_state" => Self::InvalidState,
			"interaction_required" => Self::InteractionRequired,
			"user_interrupted" => Self::UserInterrupted,
			"no_response" => Self::NoResponse,
			_ => Self::Provider(value),
		}
	}
}
impl From<AuthorizationErrorCode> for String {
	fn from(value: AuthorizationErrorCode) -> Self {
		value.as_str().to_owned()
	}
}
impl Display for AuthorizationErrorCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failure of the redirect/authorization step of a flow.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Authorization failed ({code}): {message}")]
pub struct AuthorizationError {
	/// Machine-readable reason.
	pub code: AuthorizationErrorCode,
	/// Human-readable description.
	pub message: String,
	/// State value issued for the attempt, when one exists.
	pub state: Option<String>,
	/// Whether the attempt was allowed to interact with the user.
	pub interactive: bool,
}
impl AuthorizationError {
	/// Creates an interactive error with no state attached.
	pub fn new(code: AuthorizationErrorCode, message: impl Into<String>) -> Self {
		Self { code, message: message.into(), state: None, interactive: true }
	}

	/// Error raised when the returned state does not match the issued one.
	pub fn state_mismatch(issued: impl Into<String>) -> Self {
		Self::new(
			AuthorizationErrorCode::InvalidState,
			"The state value returned by the authorization server is invalid.",
		)
		.with_state(issued)
	}

	/// Attaches the issued state.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Overrides the interactivity flag.
	pub fn with_interactive(mut self, interactive: bool) -> Self {
		self.interactive = interactive;

		self
	}

	/// Returns true for state mismatches (including a missing state).
	pub fn is_state_mismatch(&self) -> bool {
		self.code == AuthorizationErrorCode::InvalidState
	}
}

/// Failure of a token endpoint exchange.
#[derive(Debug, ThisError)]
#[error("Token request failed ({code}): {message}")]
pub struct CodeError {
	/// Machine-readable reason, either one of the associated constants or a provider `error`.
	pub code: String,
	/// Human-readable description.
	pub message: String,
	/// HTTP status code, when a response was received.
	pub status: Option<u16>,
	/// Underlying transport or parsing failure.
	#[source]
	pub source: Option<BoxError>,
}
impl CodeError {
	/// Body lacked an access token.
	pub const NO_ACCESS_TOKEN: &'static str = "no_access_token";
	/// Transport failure or non-success HTTP status.
	pub const REQUEST_ERROR: &'static str = "request_error";
	/// Body could not be parsed.
	pub const RESPONSE_PARSE: &'static str = "response_parse";

	/// Creates an error with the provided code and message.
	pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { code: code.into(), message: message.into(), status: None, source: None }
	}

	/// Wraps a transport failure.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self {
			source: Some(Box::new(src)),
			..Self::new(Self::REQUEST_ERROR, "Unable to reach the token endpoint.")
		}
	}

	/// Wraps a parsing failure.
	pub fn parse(src: impl 'static + Send + Sync + std::error::Error, status: u16) -> Self {
		Self {
			status: Some(status),
			source: Some(Box::new(src)),
			..Self::new(Self::RESPONSE_PARSE, "Token endpoint returned a malformed response.")
		}
	}

	/// Attaches the HTTP status.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}
}

/// Failures raised while tokenizing or evaluating `${...}` expressions.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum EvalError {
	/// The tokenizer ran past the end of its input.
	#[error("Unexpected end of input.")]
	Eof,
	/// A function was called without its required argument.
	#[error("Function `{function}` requires an argument.")]
	MissingArgument {
		/// Name of the function.
		function: &'static str,
	},
	/// The expression named a function that does not exist.
	#[error("Unknown function `{name}`.")]
	UnknownFunction {
		/// Name found in the expression.
		name: String,
	},
	/// Input to `atob` was not valid base64.
	#[error("Input is not valid base64.")]
	InvalidBase64,
	/// Decoded bytes were not valid UTF-8.
	#[error("Decoded value is not valid UTF-8.")]
	InvalidUtf8,
	/// Variables referenced each other too deeply (or cyclically).
	#[error("Variable expansion exceeded {depth} levels.")]
	RecursionLimit {
		/// Depth at which expansion stopped.
		depth: usize,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::oauth2::http::Error),
	/// A configured or derived URL could not be parsed.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Setting the URL came from.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Settings validation failed.
	#[error(transparent)]
	Settings(#[from] SettingsError),
	/// Host rule pattern does not compile.
	#[error("Host rule pattern `{pattern}` is invalid.")]
	InvalidHostRule {
		/// Pattern as written in the rule.
		pattern: String,
		/// Underlying regex failure.
		#[source]
		source: regex::Error,
	},
	/// HMAC key could not be initialized.
	#[error("Signing key is not usable for {method}.")]
	InvalidSigningKey {
		/// Wire name of the method.
		method: &'static str,
	},
	/// Signature method is recognized but not implemented.
	#[error("Signature method {method} is not supported.")]
	UnsupportedSignatureMethod {
		/// Wire name of the method.
		method: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Errors raised while building OAuth settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SettingsError {
	/// A setting required by the selected grant is absent.
	#[error("Missing `{field}` for the {grant} grant.")]
	Missing {
		/// Name of the missing setting.
		field: &'static str,
		/// Grant or flow that requires it.
		grant: &'static str,
	},
	/// The grant is completed without an authorization redirect.
	#[error("The {grant} grant does not use an authorization redirect.")]
	NoRedirect {
		/// Grant that was asked for a redirect.
		grant: &'static str,
	},
	/// Scope list contains an empty entry or embedded whitespace.
	#[error(transparent)]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn authorization_codes_round_trip_through_strings() {
		for code in [
			AuthorizationErrorCode::InvalidState,
			AuthorizationErrorCode::InteractionRequired,
			AuthorizationErrorCode::UserInterrupted,
			AuthorizationErrorCode::NoResponse,
			AuthorizationErrorCode::Provider("access_denied".into()),
		] {
			assert_eq!(AuthorizationErrorCode::from(String::from(code.clone())), code);
		}
	}

	#[test]
	fn code_error_exposes_transport_source() {
		let io = std::io::Error::other("connection reset");
		let err: Error = CodeError::transport(io).into();

		assert_eq!(err.code(), Some(CodeError::REQUEST_ERROR));

		let source =
			StdError::source(&err).expect("Transport failures should expose their source.");

		assert_eq!(source.to_string(), "connection reset");
	}

	#[test]
	fn state_mismatch_carries_issued_state() {
		let err = AuthorizationError::state_mismatch("issued").with_interactive(false);

		assert!(err.is_state_mismatch());
		assert_eq!(err.state.as_deref(), Some("issued"));
		assert!(!err.interactive);
	}
}
