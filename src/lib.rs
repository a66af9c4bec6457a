//! Authorization building blocks for REST clients.
//!
//! - [`oauth1`] signs requests and runs the three-legged OAuth 1.0a dance.
//! - [`oauth2`] drives OAuth 2.0 redirects and token exchanges through a
//!   [`host::AuthorizationHost`].
//! - [`variables`] evaluates `${...}` expressions in request text.
//! - [`host_rules`] rewrites request URLs.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod encoding;
pub mod error;
pub mod host;
pub mod host_rules;
pub mod http;
pub mod messages;
pub mod oauth1;
pub mod oauth2;
pub mod obs;
pub mod variables;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// crates.io
	use ::oauth2::{
		HttpClientError, HttpRequest, HttpResponse,
		http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
	};
	// self
	use crate::{
		host::{AuthorizationHost, HostFuture, NavigationOutcome, NavigationRequest},
		http::{HttpFuture, TokenHttpClient},
		messages::{AuthorizationMessage, MessageKind},
	};

	/// Request captured by [`RecordingHttpClient`].
	#[derive(Clone, Debug)]
	pub struct RecordedRequest {
		/// HTTP method of the captured request.
		pub method: String,
		/// Full request URL.
		pub url: String,
		/// Request headers as lowercase name/value pairs.
		pub headers: Vec<(String, String)>,
		/// Raw request body decoded as UTF-8 (lossy).
		pub body: String,
	}
	impl RecordedRequest {
		/// Returns the first header value with the provided (case-insensitive) name.
		pub fn header(&self, name: &str) -> Option<&str> {
			self.headers
				.iter()
				.find(|(key, _)| key.eq_ignore_ascii_case(name))
				.map(|(_, value)| value.as_str())
		}

		/// Parses the body as `application/x-www-form-urlencoded` pairs.
		pub fn form(&self) -> HashMap<String, String> {
			url::form_urlencoded::parse(self.body.as_bytes()).into_owned().collect()
		}
	}

	/// In-process [`TokenHttpClient`] that records requests and replays queued responses.
	///
	/// Requests made after the queue runs dry receive a `500` with an empty body.
	#[derive(Debug, Default)]
	pub struct RecordingHttpClient {
		requests: Mutex<Vec<RecordedRequest>>,
		responses: Mutex<VecDeque<(u16, &'static str, String)>>,
	}
	impl RecordingHttpClient {
		/// Queues a response with the provided status, content type, and body.
		pub fn respond(self, status: u16, content_type: &'static str, body: impl Into<String>) -> Self {
			self.responses.lock().push_back((status, content_type, body.into()));

			self
		}

		/// Queues a `200 OK` JSON response.
		pub fn respond_json(self, body: impl Into<String>) -> Self {
			self.respond(200, "application/json", body)
		}

		/// Returns a snapshot of every captured request.
		pub fn requests(&self) -> Vec<RecordedRequest> {
			self.requests.lock().clone()
		}

		/// Number of requests executed so far.
		pub fn request_count(&self) -> usize {
			self.requests.lock().len()
		}
	}
	impl TokenHttpClient for RecordingHttpClient {
		type TransportError = std::io::Error;

		fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
			let recorded = RecordedRequest {
				method: request.method().to_string(),
				url: request.uri().to_string(),
				headers: request
					.headers()
					.iter()
					.map(|(name, value)| {
						(
							name.as_str().to_owned(),
							String::from_utf8_lossy(value.as_bytes()).into_owned(),
						)
					})
					.collect(),
				body: String::from_utf8_lossy(request.body()).into_owned(),
			};

			self.requests.lock().push(recorded);

			let (status, content_type, body) =
				self.responses.lock().pop_front().unwrap_or((500, "text/plain", String::new()));

			Box::pin(async move {
				let mut response = HttpResponse::new(body.into_bytes());

				*response.status_mut() =
					StatusCode::from_u16(status).map_err(|e| HttpClientError::Other(e.to_string()))?;

				response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

				Ok(response)
			})
		}
	}

	type Responder = Box<dyn Fn(&NavigationRequest) -> NavigationOutcome + Send + Sync>;

	/// [`AuthorizationHost`] that answers navigations with a closure and records every message.
	pub struct ScriptedHost {
		respond: Responder,
		navigations: Mutex<Vec<NavigationRequest>>,
		messages: Mutex<Vec<MessageKind>>,
	}
	impl ScriptedHost {
		/// Creates a host that answers every navigation with `respond`.
		pub fn new<F>(respond: F) -> Self
		where
			F: 'static + Fn(&NavigationRequest) -> NavigationOutcome + Send + Sync,
		{
			Self {
				respond: Box::new(respond),
				navigations: Mutex::new(Vec::new()),
				messages: Mutex::new(Vec::new()),
			}
		}

		/// Navigations requested so far.
		pub fn navigations(&self) -> Vec<NavigationRequest> {
			self.navigations.lock().clone()
		}

		/// Kinds of the messages received so far.
		pub fn messages(&self) -> Vec<MessageKind> {
			self.messages.lock().clone()
		}
	}
	impl AuthorizationHost for ScriptedHost {
		fn navigate(&self, request: NavigationRequest) -> HostFuture<'_, NavigationOutcome> {
			let outcome = (self.respond)(&request);

			self.navigations.lock().push(request);

			Box::pin(async move { outcome })
		}

		fn notify(&self, message: &AuthorizationMessage) {
			self.messages.lock().push(message.kind());
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
