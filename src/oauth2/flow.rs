//! Stateful driver for one OAuth 2 authorization attempt.

// self
use crate::{
	_prelude::*,
	error::{AuthorizationError, AuthorizationErrorCode, SettingsError},
	host::{AuthorizationHost, NavigationOutcome, NavigationRequest},
	http::TokenHttpClient,
	messages::{AuthorizationMessage, ErrorPayload},
	obs,
	oauth2::{
		AuthorizationSession, FlowState, GrantType, OAuth2Settings, RedirectResponse, TokenRequest,
		TokenResult, exchange, parse_redirect,
	},
};

/// Drives OAuth 2 attempts for one set of settings.
///
/// Holds at most one attempt. Once it reaches [`FlowState::Complete`] or [`FlowState::Failed`],
/// further input is rejected until [`AuthorizationFlow::reset`]; in particular a code is
/// exchanged at most once per attempt.
pub struct AuthorizationFlow<C>
where
	C: ?Sized,
{
	settings: OAuth2Settings,
	http_client: Arc<C>,
	state: FlowState,
	session: Option<AuthorizationSession>,
}
impl<C> AuthorizationFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates an idle flow.
	pub fn new(settings: OAuth2Settings, http_client: Arc<C>) -> Self {
		Self { settings, http_client, state: FlowState::Idle, session: None }
	}

	/// Settings in use.
	pub fn settings(&self) -> &OAuth2Settings {
		&self.settings
	}

	/// Current state.
	pub fn state(&self) -> FlowState {
		self.state
	}

	/// Pending attempt, between [`Self::begin`] and completion.
	pub fn session(&self) -> Option<&AuthorizationSession> {
		self.session.as_ref()
	}

	/// Returns to [`FlowState::Idle`], discarding any attempt.
	pub fn reset(&mut self) {
		self.state = FlowState::Idle;
		self.session = None;
	}

	/// Starts a redirect-based attempt and returns its session (state, authorize URL).
	pub fn begin(&mut self) -> Result<&AuthorizationSession> {
		let grant = self.settings.grant_type;

		if !grant.uses_redirect() {
			return Err(SettingsError::NoRedirect { grant: grant.as_str() }.into());
		}
		if !self.state.can_transition_to(FlowState::Authorizing) {
			return Err(Error::InvalidTransition { from: self.state, to: FlowState::Authorizing });
		}

		let session = AuthorizationSession::new(&self.settings)?;

		self.state.transition(FlowState::Authorizing)?;

		Ok(self.session.insert(session))
	}

	/// Consumes the redirect of the pending attempt.
	///
	/// Implicit grants complete from the redirect alone. Authorization code grants exchange the
	/// code once at the token endpoint.
	pub async fn handle_redirect(&mut self, url: &Url) -> Result<TokenResult> {
		let kind = self.settings.grant_type.flow_kind();

		obs::observe(kind, "handle_redirect", self.finish_redirect(url)).await
	}

	/// Requests a token without a redirect (client credentials and password grants).
	pub async fn request_token(&mut self) -> Result<TokenResult> {
		let kind = self.settings.grant_type.flow_kind();

		obs::observe(kind, "request_token", self.exchange_directly()).await
	}

	/// Runs a complete attempt, using `host` for the redirect when the grant needs one.
	///
	/// Non-interactive attempts that need the user fail with
	/// [`AuthorizationErrorCode::InteractionRequired`] and `interactive = false`.
	pub async fn authorize(&mut self, host: &dyn AuthorizationHost) -> Result<TokenResult> {
		let kind = self.settings.grant_type.flow_kind();

		host.notify(&AuthorizationMessage::OAuth2TokenRequested(Box::new(self.settings.clone())));

		let result = obs::observe(kind, "authorize", self.authorize_with(host)).await;

		match &result {
			Ok(token) => host.notify(&AuthorizationMessage::OAuth2TokenResponse(token.clone())),
			Err(e) => host.notify(&AuthorizationMessage::OAuth2Error(ErrorPayload::from_error(e))),
		}

		result
	}

	/// Abandons the pending attempt, as when the user dismisses the dialog.
	pub fn abandon(&mut self) -> Result<AuthorizationError> {
		self.state.transition(FlowState::Failed)?;

		let mut error = AuthorizationError::new(
			AuthorizationErrorCode::UserInterrupted,
			"The authorization was abandoned.",
		)
		.with_interactive(self.settings.interactive);

		if let Some(session) = self.session.take() {
			error = error.with_state(session.state);
		}

		Ok(error)
	}

	async fn authorize_with(&mut self, host: &dyn AuthorizationHost) -> Result<TokenResult> {
		if !self.settings.grant_type.uses_redirect() {
			return self.exchange_directly().await;
		}

		let interactive = self.settings.interactive;
		let session = self.begin()?;
		let request = NavigationRequest {
			url: session.authorize_url.clone(),
			redirect_uri: session.redirect_uri.clone(),
			interactive,
		};
		let issued = session.state.clone();

		match host.navigate(request).await {
			NavigationOutcome::Redirected(url) => self.finish_redirect(&url).await,
			outcome => Err(self.fail(outcome.into_authorization_error(&issued, interactive).into())),
		}
	}

	async fn finish_redirect(&mut self, url: &Url) -> Result<TokenResult> {
		let session = match (&self.session, self.state) {
			(Some(session), FlowState::Authorizing) => session,
			(_, from) => return Err(Error::InvalidTransition { from, to: FlowState::Redirected }),
		};
		let response = parse_redirect(url, session, self.settings.interactive);
		let response = match response {
			Ok(response) => response,
			Err(e) => return Err(self.fail(e)),
		};

		self.state.transition(FlowState::Redirected)?;

		match response {
			RedirectResponse::Token(token) => {
				self.state.transition(FlowState::Complete)?;
				self.session = None;

				Ok(token)
			},
			RedirectResponse::Code(code) => self.exchange_code(&code).await,
		}
	}

	async fn exchange_code(&mut self, code: &str) -> Result<TokenResult> {
		let Some(session) = self.session.take() else {
			return Err(Error::InvalidTransition { from: self.state, to: FlowState::Exchanging });
		};

		self.state.transition(FlowState::Exchanging)?;

		let request = match TokenRequest::authorization_code(
			&self.settings,
			code,
			&session.redirect_uri,
			session.code_verifier(),
		) {
			Ok(request) => request,
			Err(e) => return Err(self.fail(e)),
		};

		self.send(request, Some(session.state)).await
	}

	async fn exchange_directly(&mut self) -> Result<TokenResult> {
		let request = match self.settings.grant_type {
			GrantType::ClientCredentials => TokenRequest::client_credentials(&self.settings),
			GrantType::Password => TokenRequest::password(&self.settings),
			grant => {
				return Err(SettingsError::Missing { field: "redirect", grant: grant.as_str() }.into());
			},
		}?;

		self.state.transition(FlowState::Exchanging)?;
		self.send(request, self.settings.state.clone()).await
	}

	async fn send(&mut self, request: TokenRequest, state: Option<String>) -> Result<TokenResult> {
		match exchange(self.http_client.as_ref(), request, state).await {
			Ok(token) => {
				self.state.transition(FlowState::Complete)?;

				Ok(token)
			},
			Err(e) => Err(self.fail(e)),
		}
	}

	fn fail(&mut self, error: Error) -> Error {
		if !self.state.is_terminal() {
			self.state = FlowState::Failed;
		}

		self.session = None;

		error
	}
}
impl<C> Debug for AuthorizationFlow<C>
where
	C: ?Sized,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationFlow")
			.field("grant", &self.settings.grant_type)
			.field("state", &self.state)
			.field("session", &self.session)
			.finish()
	}
}
