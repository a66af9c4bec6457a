//! Legal transitions of an OAuth 2 attempt.

// self
use crate::_prelude::*;

/// Lifecycle of one OAuth 2 authorization attempt.
///
/// ```text
/// Idle ─▶ Authorizing ─▶ Redirected ─▶ Exchanging ─▶ Complete
///   │                        │                    ╰─▶ Failed
///   ╰──────────▶ Exchanging  ╰─▶ Complete (implicit)
/// ```
///
/// Every non-terminal state may also move to [`FlowState::Failed`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
	/// No attempt in progress.
	#[default]
	Idle,
	/// Authorization URL issued; waiting for the redirect.
	Authorizing,
	/// Redirect received and validated.
	Redirected,
	/// Token endpoint request in flight.
	Exchanging,
	/// Token obtained.
	Complete,
	/// Attempt failed or was abandoned.
	Failed,
}
impl FlowState {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowState::Idle => "idle",
			FlowState::Authorizing => "authorizing",
			FlowState::Redirected => "redirected",
			FlowState::Exchanging => "exchanging",
			FlowState::Complete => "complete",
			FlowState::Failed => "failed",
		}
	}

	/// Returns true for states that accept no further input.
	pub const fn is_terminal(self) -> bool {
		matches!(self, FlowState::Complete | FlowState::Failed)
	}

	/// Returns true when `self → next` is a legal move.
	pub const fn can_transition_to(self, next: FlowState) -> bool {
		use FlowState::*;

		match (self, next) {
			(Idle, Authorizing) | (Idle, Exchanging) => true,
			(Authorizing, Redirected) => true,
			(Redirected, Exchanging) | (Redirected, Complete) => true,
			(Exchanging, Complete) => true,
			(from, Failed) => !from.is_terminal(),
			_ => false,
		}
	}

	/// Moves to `next`, or reports the illegal move.
	pub fn transition(&mut self, next: FlowState) -> Result<()> {
		if !self.can_transition_to(next) {
			return Err(Error::InvalidTransition { from: *self, to: next });
		}

		*self = next;

		Ok(())
	}
}
impl Display for FlowState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn code_grant_path_is_legal() {
		let mut state = FlowState::default();

		for next in [
			FlowState::Authorizing,
			FlowState::Redirected,
			FlowState::Exchanging,
			FlowState::Complete,
		] {
			state.transition(next).expect("Authorization code path should be legal.");
		}

		assert!(state.is_terminal());
	}

	#[test]
	fn terminal_states_reject_input() {
		for terminal in [FlowState::Complete, FlowState::Failed] {
			for next in [FlowState::Authorizing, FlowState::Exchanging, FlowState::Failed] {
				assert!(!terminal.can_transition_to(next));
			}
		}

		let mut state = FlowState::Complete;
		let err = state.transition(FlowState::Exchanging).expect_err("Complete is terminal.");

		assert!(matches!(
			err,
			Error::InvalidTransition { from: FlowState::Complete, to: FlowState::Exchanging }
		));
		assert_eq!(state, FlowState::Complete);
	}

	#[test]
	fn skipping_the_redirect_is_rejected() {
		assert!(!FlowState::Authorizing.can_transition_to(FlowState::Exchanging));
		assert!(!FlowState::Idle.can_transition_to(FlowState::Redirected));
		assert!(FlowState::Idle.can_transition_to(FlowState::Exchanging));
		assert!(FlowState::Redirected.can_transition_to(FlowState::Complete));
		assert!(FlowState::Authorizing.can_transition_to(FlowState::Failed));
	}
}
