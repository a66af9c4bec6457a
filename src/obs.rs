//! Optional observability for authorization flows.
//!
//! # Feature Flags
//!
//! - `tracing` wraps every flow entry point in a `restclient_auth.flow` span carrying the `flow`
//!   and `stage` fields, plus `outcome` once the entry point returns.
//! - `metrics` increments `restclient_auth_flow_total` once per attempt and once per outcome,
//!   labeled by `flow`, `stage`, and `outcome`.
//!
//! Both are no-ops when their feature is disabled.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Authorization flows that report spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// OAuth 1.0a three-legged dance.
	OAuth1,
	/// OAuth 2 implicit grant.
	Implicit,
	/// OAuth 2 authorization code grant (with or without PKCE).
	AuthorizationCode,
	/// OAuth 2 client credentials grant.
	ClientCredentials,
	/// OAuth 2 resource owner password grant.
	Password,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::OAuth1 => "oauth1",
			FlowKind::Implicit => "implicit",
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::ClientCredentials => "client_credentials",
			FlowKind::Password => "password",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a flow span and records its attempt and outcome.
pub async fn observe<T, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, stage);

	record_flow_outcome(kind, stage, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;
	let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

	span.record_outcome(outcome);
	record_flow_outcome(kind, stage, outcome);

	result
}
