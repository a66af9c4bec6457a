// self
use crate::obs::{FlowKind, FlowOutcome};

/// Name of the counter bumped once per attempt and once per outcome.
pub const FLOW_COUNTER: &str = "restclient_auth_flow_total";

/// Counts one `outcome` of the `stage` entry point of a `kind` flow.
///
/// Goes to the global `metrics` recorder; compiled out without the `metrics` feature.
pub fn record_flow_outcome(kind: FlowKind, stage: &'static str, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		FLOW_COUNTER,
		"flow" => kind.as_str(),
		"stage" => stage,
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, stage, outcome);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn every_outcome_records_without_a_recorder() {
		for outcome in [FlowOutcome::Attempt, FlowOutcome::Success, FlowOutcome::Failure] {
			record_flow_outcome(FlowKind::OAuth1, "authorize", outcome);
		}

		assert_eq!(FLOW_COUNTER, "restclient_auth_flow_total");
	}
}
