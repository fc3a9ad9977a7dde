//! Per-session acquisition counters.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how tokens were obtained.
#[derive(Debug, Default)]
pub struct AcquireMetrics {
	interactive: AtomicU64,
	silent_refreshes: AtomicU64,
	cache_hits: AtomicU64,
	failures: AtomicU64,
}
impl AcquireMetrics {
	/// Number of device authorization flows started.
	pub fn interactive(&self) -> u64 {
		self.interactive.load(Ordering::Relaxed)
	}

	/// Number of successful refresh token redemptions.
	pub fn silent_refreshes(&self) -> u64 {
		self.silent_refreshes.load(Ordering::Relaxed)
	}

	/// Number of acquisitions answered from the cached record.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Number of acquisitions that returned an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_interactive(&self) {
		self.interactive.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_silent_refresh(&self) {
		self.silent_refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_start_at_zero_and_count_independently() {
		let metrics = AcquireMetrics::default();

		metrics.record_interactive();
		metrics.record_cache_hit();
		metrics.record_cache_hit();
		metrics.record_failure();

		assert_eq!(metrics.interactive(), 1);
		assert_eq!(metrics.silent_refreshes(), 0);
		assert_eq!(metrics.cache_hits(), 2);
		assert_eq!(metrics.failures(), 1);
	}
}
