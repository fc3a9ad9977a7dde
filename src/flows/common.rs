//! Renewal window shared by every provider.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, TokenRecord},
};

/// Decides when a cached record must be renewed instead of reused.
///
/// Records are renewed once they expire or enter the pre-emptive window. The window is shortened
/// by a deterministic jitter derived from the client and scope set so providers created together
/// do not all renew at the same instant.
#[derive(Clone, Debug)]
pub struct RenewalWindow {
	client: ClientId,
	scope: ScopeSet,
	preemptive_window: Duration,
}
impl RenewalWindow {
	/// Window applied when none is configured.
	pub const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Creates a window for the provided client + scope pair.
	pub fn new(client: ClientId, scope: ScopeSet) -> Self {
		Self { client, scope, preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW }
	}

	/// Overrides the pre-emptive window; negative values disable it.
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Determines whether the cached record should be renewed at `now`.
	pub fn should_renew(&self, record: &TokenRecord, now: OffsetDateTime) -> bool {
		if record.is_expired_at(now) {
			return true;
		}

		let effective_window = self.effective_preemptive_window();

		if effective_window.is_zero() {
			return false;
		}

		record.remaining_at(now) <= effective_window
	}

	/// Pre-emptive window after jitter.
	pub fn effective_preemptive_window(&self) -> Duration {
		self.preemptive_window.checked_sub(self.preemptive_jitter()).unwrap_or(Duration::ZERO)
	}

	fn preemptive_jitter(&self) -> Duration {
		let window_secs = self.preemptive_window.whole_seconds();

		if window_secs <= 1 {
			return Duration::ZERO;
		}

		// At most a quarter of the window.
		let modulus = u64::try_from(window_secs / 4).unwrap_or(u64::MAX).max(1);
		let jitter_secs = self.jitter_seed() % modulus;

		Duration::seconds(i64::try_from(jitter_secs).unwrap_or(i64::MAX))
	}

	fn jitter_seed(&self) -> u64 {
		let mut hasher = DefaultHasher::new();

		self.client.hash(&mut hasher);
		self.scope.hash(&mut hasher);

		hasher.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn record(expires_at: OffsetDateTime) -> TokenRecord {
		TokenRecord::builder(ClientId::PLACEHOLDER, scope())
			.access_token("access")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_at(expires_at)
			.build()
			.expect("Record fixture should build.")
	}

	fn scope() -> ScopeSet {
		ScopeSet::new(["Mail.Read"]).expect("Scope fixture should be valid.")
	}

	#[test]
	fn jitter_never_exceeds_a_quarter_of_the_window() {
		let window = RenewalWindow::new(ClientId::PLACEHOLDER, scope());
		let effective = window.effective_preemptive_window();

		assert!(effective <= Duration::seconds(60));
		assert!(effective > Duration::seconds(45));
		assert_eq!(effective, window.effective_preemptive_window());
	}

	#[test]
	fn renews_inside_window_and_after_expiry() {
		let window = RenewalWindow::new(ClientId::PLACEHOLDER, scope());
		let expires = macros::datetime!(2025-01-01 01:00 UTC);
		let record = record(expires);

		assert!(!window.should_renew(&record, macros::datetime!(2025-01-01 00:30 UTC)));
		assert!(window.should_renew(&record, macros::datetime!(2025-01-01 00:59:50 UTC)));
		assert!(window.should_renew(&record, expires));
	}

	#[test]
	fn disabled_window_only_renews_expired_records() {
		let window = RenewalWindow::new(ClientId::PLACEHOLDER, scope())
			.with_preemptive_window(Duration::seconds(-5));
		let expires = macros::datetime!(2025-01-01 01:00 UTC);
		let record = record(expires);

		assert!(!window.should_renew(&record, macros::datetime!(2025-01-01 00:59:59 UTC)));
		assert!(window.should_renew(&record, expires));
	}
}
