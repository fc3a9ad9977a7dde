//! Per-authority hooks around token exchanges.
//!
//! A [`ProviderStrategy`] may add form parameters to outgoing requests and decides how an error
//! answer from the authority maps onto the crate's failure kinds.

// std
use std::collections::BTreeMap;
// self
use crate::{_prelude::*, provider::descriptor::GrantType};

/// Authority-specific request decoration and error classification.
pub trait ProviderStrategy: Send + Sync {
	/// Buckets an error answer from the authority.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;

	/// Adds extra form parameters to a device authorization or token request.
	///
	/// `client_id`, `scope`, `grant_type`, and `device_code` belong to the flow; the hook cannot
	/// override them.
	fn augment_token_request(&self, _grant: GrantType, _form: &mut BTreeMap<String, String>) {}
}

/// Failure buckets an authority error can fall into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// The user refused the request.
	Declined,
	/// The device code ran out before the user finished.
	Expired,
	/// Stale refresh token or unknown device code.
	InvalidGrant,
	/// The application is unknown or may not use the grant.
	InvalidClient,
	/// Scopes are unknown or lack consent.
	InsufficientScope,
	/// Everything else, reported as an upstream failure.
	Transient,
}

/// What the flow knows about a failed token request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Grant the request was made for.
	pub grant_type: GrantType,
	/// Status of the error response, if one arrived.
	pub http_status: Option<u16>,
	/// OAuth `error` code.
	pub oauth_error: Option<String>,
	/// OAuth `error_description`.
	pub error_description: Option<String>,
}
impl ProviderErrorContext {
	/// Empty context for `grant_type`.
	pub fn new(grant_type: GrantType) -> Self {
		Self { grant_type, http_status: None, oauth_error: None, error_description: None }
	}

	/// Sets the response status.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Sets the OAuth `error` code.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Sets the OAuth `error_description`.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}
}

/// Classifies by RFC 6749 / RFC 8628 error code first, then by keywords in the description
/// (Azure AD often wraps the real code in an `AADSTS` message), then by HTTP status.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		ctx.oauth_error
			.as_deref()
			.and_then(|code| {
				ERROR_CODES
					.iter()
					.find(|(known, _)| code.eq_ignore_ascii_case(known))
					.map(|(_, kind)| *kind)
			})
			.or_else(|| ctx.error_description.as_deref().and_then(keyword_in))
			.unwrap_or_else(|| match ctx.http_status {
				Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
				Some(401) => ProviderErrorKind::InvalidClient,
				Some(403) => ProviderErrorKind::InsufficientScope,
				_ => ProviderErrorKind::Transient,
			})
	}
}

const ERROR_CODES: &[(&str, ProviderErrorKind)] = &[
	("access_denied", ProviderErrorKind::Declined),
	("authorization_declined", ProviderErrorKind::Declined),
	("expired_token", ProviderErrorKind::Expired),
	("code_expired", ProviderErrorKind::Expired),
	("invalid_grant", ProviderErrorKind::InvalidGrant),
	("bad_verification_code", ProviderErrorKind::InvalidGrant),
	("invalid_client", ProviderErrorKind::InvalidClient),
	("unauthorized_client", ProviderErrorKind::InvalidClient),
	("invalid_scope", ProviderErrorKind::InsufficientScope),
	("insufficient_scope", ProviderErrorKind::InsufficientScope),
	("temporarily_unavailable", ProviderErrorKind::Transient),
	("server_error", ProviderErrorKind::Transient),
];

// Checked in order; the first keyword found wins.
const DESCRIPTION_KEYWORDS: &[(&str, ProviderErrorKind)] = &[
	("access_denied", ProviderErrorKind::Declined),
	("declined", ProviderErrorKind::Declined),
	("expired", ProviderErrorKind::Expired),
	("invalid_grant", ProviderErrorKind::InvalidGrant),
	("invalid_client", ProviderErrorKind::InvalidClient),
	("invalid_scope", ProviderErrorKind::InsufficientScope),
	("insufficient_scope", ProviderErrorKind::InsufficientScope),
];

fn keyword_in(description: &str) -> Option<ProviderErrorKind> {
	let description = description.to_ascii_lowercase();

	DESCRIPTION_KEYWORDS
		.iter()
		.find(|(keyword, _)| description.contains(keyword))
		.map(|(_, kind)| *kind)
}
