//! Optional observability for token acquisition and resource fetches.
//!
//! # Feature Flags
//!
//! - `tracing` (on by default) wraps every operation in a `mail_probe.flow` span carrying the
//!   `flow` and `stage` fields; the `outcome` field is filled in when the operation finishes.
//! - `metrics` increments `mail_probe_flow_total{flow, outcome}` for every attempt, success, and
//!   failure, and records `mail_probe_flow_duration_seconds{flow, outcome}` once per operation.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Operations wrapped in a flow span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Interactive device authorization grant.
	DeviceCode,
	/// Silent refresh token redemption.
	Refresh,
	/// Bearer-authenticated resource request.
	Fetch,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::DeviceCode => "device_code",
			Self::Refresh => "refresh",
			Self::Fetch => "fetch",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// The operation started.
	Attempt,
	/// The operation returned `Ok`.
	Success,
	/// The operation returned `Err`.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Attempt => "attempt",
			Self::Success => "success",
			Self::Failure => "failure",
		}
	}

	fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a flow span and records its attempt, outcome, and duration.
pub async fn observe<T, F>(kind: FlowKind, stage: &'static str, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, stage);
	let started = Instant::now();

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;
	let outcome = FlowOutcome::of(&result);

	span.record_outcome(outcome);
	record_flow_outcome(kind, outcome);
	record_flow_duration(kind, outcome, started.elapsed());

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::NetworkError;

	#[tokio::test]
	async fn observe_passes_results_through() {
		let ok = observe(FlowKind::Fetch, "ok", async { Ok(7) }).await;
		let err = observe(FlowKind::Refresh, "err", async {
			Err::<(), _>(Error::from(NetworkError::Io(std::io::ErrorKind::TimedOut.into())))
		})
		.await;

		assert_eq!(ok.ok(), Some(7));
		assert!(matches!(err, Err(Error::Network(NetworkError::Io(_)))));
	}

	#[test]
	fn labels_are_stable() {
		assert_eq!(FlowKind::DeviceCode.to_string(), "device_code");
		assert_eq!(FlowOutcome::of(&Ok::<(), ()>(())), FlowOutcome::Success);
		assert_eq!(FlowOutcome::of(&Err::<(), ()>(())).as_str(), "failure");
	}
}
