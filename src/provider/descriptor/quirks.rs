// self
use crate::_prelude::*;

/// Authority-specific switches consulted by the flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderQuirks {
	/// Adds `offline_access` to device authorization requests so the authority issues a refresh
	/// token alongside the access token.
	pub request_offline_access: bool,
	/// Upper bound, in seconds, for the polling interval after repeated `slow_down` answers.
	pub max_poll_interval_secs: u64,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { request_offline_access: false, max_poll_interval_secs: 60 }
	}
}
