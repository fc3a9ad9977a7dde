//! Refresh tokens shared by every provider of one client.
//!
//! Microsoft identity platform refresh tokens are not bound to the scopes they were first issued
//! for, so a provider meeting a new scope set can redeem a sibling's refresh token instead of
//! asking the user to sign in again.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, token::{record::TokenRecord, secret::BearerToken}},
};

/// Latest refresh token minted for one application registration.
#[derive(Debug)]
pub struct TokenFamily {
	client: ClientId,
	latest: Mutex<Option<BearerToken>>,
}
impl TokenFamily {
	/// Empty family for `client`.
	pub fn new(client: ClientId) -> Self {
		Self { client, latest: Mutex::new(None) }
	}

	/// Client every member token was issued to.
	pub fn client(&self) -> ClientId {
		self.client
	}

	/// Most recently issued refresh token, if any.
	pub fn latest_refresh_token(&self) -> Option<BearerToken> {
		self.latest.lock().clone()
	}

	/// Adopts the refresh token of `record`; records of other clients are ignored.
	pub fn remember(&self, record: &TokenRecord) {
		if record.client != self.client {
			return;
		}
		if let Some(token) = record.refresh_token.as_ref() {
			*self.latest.lock() = Some(token.clone());
		}
	}

	/// Drops `token` after the authority rejected it, unless a newer one replaced it meanwhile.
	pub fn forget(&self, token: &BearerToken) {
		let mut latest = self.latest.lock();

		if latest.as_ref() == Some(token) {
			*latest = None;
		}
	}
}
