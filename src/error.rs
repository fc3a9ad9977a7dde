//! Error taxonomy: configuration, authentication, network, and decoding failures.

// self
use crate::_prelude::*;

/// Result defaulting to the crate [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

type DynError = Box<dyn StdError + Send + Sync>;

/// Everything a token acquisition or a mail listing can fail with.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal for the binary.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token acquisition failed.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// Transport failure (DNS, TCP, TLS, timeout) while fetching a resource.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// Resource body did not match the expected schema.
	#[error(transparent)]
	Deserialization(#[from] DeserializationError),

	/// Resource endpoint answered with a non-success status.
	#[error("Endpoint responded with HTTP {status}: {preview}.")]
	UnexpectedStatus {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Truncated response body.
		preview: String,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// reqwest refused the client or request configuration.
	#[error("Unable to set up the HTTP client.")]
	HttpSetup {
		/// Builder failure.
		#[source]
		source: DynError,
	},
	/// A token request could not be assembled.
	#[error(transparent)]
	TokenRequest(#[from] oauth2::http::Error),
	/// Client identifier is not a GUID.
	#[error("Bad client id format: {value}.")]
	InvalidClientId {
		/// Value as supplied.
		value: String,
		/// GUID parser failure; absent when the spelling itself is refused.
		#[source]
		source: Option<uuid::Error>,
	},
	/// Tenant or provider identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// An authority endpoint URL is malformed.
	#[error("Authority endpoint URL is invalid.")]
	InvalidDescriptor {
		/// URL parser failure.
		#[source]
		source: url::ParseError,
	},
	/// The authority descriptor is incomplete or insecure.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// A mail endpoint URL is malformed.
	#[error("Resource URL is invalid.")]
	InvalidResourceUrl {
		/// URL parser failure.
		#[source]
		source: url::ParseError,
	},

	/// Requested page size is outside what the mail endpoints accept.
	#[error("Page size must be between 1 and {max}, got {value}.")]
	InvalidPageSize {
		/// Value supplied by the caller.
		value: u32,
		/// Largest accepted value.
		max: u32,
	},
	/// The flow needs a grant the authority descriptor leaves disabled.
	#[error("Authority `{descriptor}` has the {grant} grant disabled.")]
	UnsupportedGrant {
		/// Descriptor name.
		descriptor: String,
		/// Grant label.
		grant: &'static str,
	},
	/// A scope list failed validation.
	#[error("Scope list is invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// A provider was asked for a token outside the scope set it was created for.
	#[error("Token provider is bound to `{bound}` but `{requested}` was requested.")]
	ScopeMismatch {
		/// Scope set the provider was created for.
		bound: String,
		/// Scope set passed by the caller.
		requested: String,
	},
	/// A token response could not be turned into a record.
	#[error("Token response is incomplete.")]
	TokenBuild(#[from] crate::auth::TokenRecordBuilderError),
	/// The token response carried no `expires_in`.
	#[error("Token response has no expires_in.")]
	MissingExpiresIn,
	/// `expires_in` does not fit a signed 64-bit second count.
	#[error("Token response expires_in is too large.")]
	ExpiresInOutOfRange,
	/// `expires_in` was zero.
	#[error("Token response expires_in must be positive.")]
	NonPositiveExpiresIn,
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::HttpSetup { source: Box::new(e) }
	}
}

/// Token acquisition failures. None of them are retried automatically.
#[derive(Debug, ThisError)]
pub enum AuthenticationError {
	/// The user declined the device authorization request.
	#[error("Authorization was declined: {reason}.")]
	Declined {
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// The device code expired before the user completed the sign-in.
	#[error("Device code expired: {reason}.")]
	Expired {
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// The authority does not know the application or refuses the grant for it.
	#[error("Application rejected by the authority: {reason}.")]
	InvalidClient {
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// The refresh token or device code is no longer valid.
	#[error("Grant rejected by the authority: {reason}.")]
	InvalidGrant {
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// Granted scopes do not cover the requested ones.
	#[error("Requested scopes were not granted: {reason}.")]
	InsufficientScope {
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// Token endpoint answered successfully but without a usable access token.
	#[error("Token endpoint returned an empty access token.")]
	EmptyAccessToken,
	/// Any other answer the flow cannot act on.
	#[error("Authority returned an unexpected response: {message}.")]
	Upstream {
		/// Summary of what went wrong.
		message: String,
		/// Response status, if a response arrived.
		status: Option<u16>,
		/// `Retry-After` hint, if present.
		retry_after: Option<Duration>,
	},
	/// The token endpoint body was not valid token JSON.
	#[error("Authority returned malformed JSON.")]
	TokenResponseParse {
		/// Decoder failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// Response status, if a response arrived.
		status: Option<u16>,
	},
	/// The authority could not be reached.
	#[error("Authority is unreachable.")]
	Unreachable(#[source] NetworkError),
}

/// DNS, connect, TLS, and timeout failures.
#[derive(Debug, ThisError)]
pub enum NetworkError {
	/// The exchange with `target` broke off.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Peer description used in messages.
		target: &'static str,
		/// Transport failure.
		#[source]
		source: DynError,
	},
	/// `target` did not answer in time.
	#[error("Request to {target} timed out.")]
	Timeout {
		/// Peer description used in messages.
		target: &'static str,
		/// Transport failure.
		#[source]
		source: DynError,
	},
	/// Socket-level I/O failure.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl NetworkError {
	/// Wraps an arbitrary transport failure for `target`.
	pub fn network(target: &'static str, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { target, source: Box::new(src) }
	}

	/// Splits reqwest failures into timeouts and everything else.
	pub fn from_reqwest(target: &'static str, e: ReqwestError) -> Self {
		match e.is_timeout() {
			true => Self::Timeout { target, source: Box::new(e) },
			false => Self::network(target, e),
		}
	}
}

/// Response bodies that could not be decoded into the expected schema.
#[derive(Debug, ThisError)]
pub enum DeserializationError {
	/// JSON body did not match the schema; the path names the offending field.
	#[error("Response body does not match the expected schema at `{}`.", .source.path())]
	Json {
		/// Decoder failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// Status of the decoded response.
		status: Option<u16>,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn authentication_error_keeps_network_source() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
		let err: Error = AuthenticationError::Unreachable(NetworkError::network("the authority", io))
			.into();

		assert!(matches!(err, Error::Authentication(AuthenticationError::Unreachable(_))));

		let source = StdError::source(&err).expect("Unreachable errors should expose a source.");

		assert_eq!(source.to_string(), "Network error occurred while calling the authority.");
	}

	#[test]
	fn deserialization_error_reports_field_path() {
		#[derive(Debug, Deserialize)]
		struct Page {
			#[serde(rename = "value")]
			_value: Vec<String>,
		}

		let mut de = serde_json::Deserializer::from_str("{\"value\":[1]}");
		let source = serde_path_to_error::deserialize::<_, Page>(&mut de)
			.expect_err("Numbers should not decode into strings.");
		let err = DeserializationError::Json { source, status: Some(200) };

		assert!(err.to_string().contains("value[0]"));
	}
}
