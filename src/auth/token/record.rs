//! Cached token records and their builder.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, token::secret::BearerToken},
};

/// Why a [`TokenRecordBuilder`] refused to produce a record.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenRecordBuilderError {
	/// The authority answered without an access token, or with an empty one.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Neither an absolute nor a relative expiry was set.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// The relative expiry lands outside the representable date range.
	#[error("Expiry is out of range.")]
	ExpiryOutOfRange,
}

/// Access token (plus optional refresh token) held by one provider.
///
/// Records are replaced wholesale on renewal, never patched in place.
#[derive(Clone)]
pub struct TokenRecord {
	/// Application the token was issued to.
	pub client: ClientId,
	/// Scope set the token was requested for.
	pub scope: ScopeSet,
	/// Secret presented as `Authorization: Bearer`.
	pub access_token: BearerToken,
	/// Secret redeemed for silent renewal.
	pub refresh_token: Option<BearerToken>,
	/// Local clock reading when the token response arrived.
	pub issued_at: OffsetDateTime,
	/// Instant after which the access token must not be presented.
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Starts a record for `client` and `scope`.
	pub fn builder(client: ClientId, scope: ScopeSet) -> TokenRecordBuilder {
		TokenRecordBuilder {
			client,
			scope,
			access_token: None,
			refresh_token: None,
			issued_at: None,
			expiry: None,
		}
	}

	/// Whether the access token is unusable at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Lifetime left at `instant`; zero once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		(self.expires_at - instant).max(Duration::ZERO)
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("client", &self.client)
			.field("scope", &self.scope)
			.field("access_token", &self.access_token)
			.field("has_refresh_token", &self.refresh_token.is_some())
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[derive(Clone, Copy, Debug)]
enum Expiry {
	At(OffsetDateTime),
	In(Duration),
}

/// Assembles a [`TokenRecord`] from a token endpoint response.
#[derive(Clone, Debug)]
pub struct TokenRecordBuilder {
	client: ClientId,
	scope: ScopeSet,
	access_token: Option<BearerToken>,
	refresh_token: Option<BearerToken>,
	issued_at: Option<OffsetDateTime>,
	expiry: Option<Expiry>,
}
impl TokenRecordBuilder {
	/// Overrides the issue instant; defaults to now.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Fixes the expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expiry = Some(Expiry::At(instant));

		self
	}

	/// Expresses the expiry relative to the issue instant, as `expires_in` does on the wire.
	pub fn expires_in(mut self, lifetime: Duration) -> Self {
		self.expiry = Some(Expiry::In(lifetime));

		self
	}

	/// Sets the access token.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(BearerToken::new(token));

		self
	}

	/// Sets the refresh token; an empty value counts as absent.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(BearerToken::new(token));

		self
	}

	/// Finishes the record.
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let Some(access_token) = self.access_token.filter(|token| !token.is_empty()) else {
			return Err(TokenRecordBuilderError::MissingAccessToken);
		};
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match self.expiry.ok_or(TokenRecordBuilderError::MissingExpiry)? {
			Expiry::At(instant) => instant,
			Expiry::In(lifetime) => issued_at
				.checked_add(lifetime)
				.ok_or(TokenRecordBuilderError::ExpiryOutOfRange)?,
		};

		Ok(TokenRecord {
			client: self.client,
			scope: self.scope,
			access_token,
			refresh_token: self.refresh_token.filter(|token| !token.is_empty()),
			issued_at,
			expires_at,
		})
	}
}
