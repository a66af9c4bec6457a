//! Contract between the flows and the application hosting the authorization UI.
//!
//! The host opens authorization URLs (a browser window, an embedded view, a hidden frame for
//! non-interactive attempts) and reports where the user agent was finally redirected. Flows also
//! post typed [`AuthorizationMessage`]s so the host can mirror progress in its UI.

// self
use crate::{
	_prelude::*,
	error::{AuthorizationError, AuthorizationErrorCode},
	messages::AuthorizationMessage,
};

/// Boxed future returned by [`AuthorizationHost::navigate`].
pub type HostFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Navigation the flow asks the host to perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationRequest {
	/// URL to open.
	pub url: Url,
	/// Redirect prefix that ends the navigation.
	pub redirect_uri: Url,
	/// Whether UI may be shown. When false the host must not prompt the user and should answer
	/// [`NavigationOutcome::InteractionRequired`] instead.
	pub interactive: bool,
}
impl NavigationRequest {
	/// Returns true when `url` is the redirect this navigation waits for.
	pub fn is_redirect(&self, url: &Url) -> bool {
		url.as_str().starts_with(self.redirect_uri.as_str())
	}
}

/// How a navigation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
	/// The user agent reached the redirect URI.
	Redirected(Url),
	/// The provider needs the user, but the request was non-interactive.
	InteractionRequired,
	/// The user closed the window or dismissed the dialog.
	Closed,
	/// The host never observed a redirect.
	NoResponse,
}
impl NavigationOutcome {
	/// Error reported for every outcome other than a redirect.
	pub fn into_authorization_error(self, state: &str, interactive: bool) -> AuthorizationError {
		let (code, message) = match self {
			NavigationOutcome::InteractionRequired => (
				AuthorizationErrorCode::InteractionRequired,
				"The authorization server requires user interaction.",
			),
			NavigationOutcome::Closed => (
				AuthorizationErrorCode::UserInterrupted,
				"The user closed the authorization window.",
			),
			NavigationOutcome::NoResponse | NavigationOutcome::Redirected(_) => (
				AuthorizationErrorCode::NoResponse,
				"No redirect was received from the authorization server.",
			),
		};

		AuthorizationError::new(code, message).with_state(state).with_interactive(interactive)
	}
}

/// Application side of an authorization attempt.
pub trait AuthorizationHost
where
	Self: Send + Sync,
{
	/// Opens `request.url` and resolves once the navigation ends.
	fn navigate(&self, request: NavigationRequest) -> HostFuture<'_, NavigationOutcome>;

	/// Receives progress messages. Ignored by default.
	fn notify(&self, message: &AuthorizationMessage) {
		let _ = message;
	}
}
