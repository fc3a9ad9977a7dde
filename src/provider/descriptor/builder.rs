// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{GrantType, ProviderDescriptor, ProviderEndpoints, ProviderQuirks, SupportedGrants},
};

/// Reasons a descriptor fails validation.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// No device authorization endpoint was set.
	#[error("Missing device authorization endpoint.")]
	MissingDeviceAuthorizationEndpoint,
	/// No token endpoint was set.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Every grant is disabled.
	#[error("Descriptor must enable at least one grant type.")]
	NoSupportedGrants,
	/// An endpoint is not `https`; device and refresh secrets would travel in clear text.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// `device authorization` or `token`.
		endpoint: &'static str,
		/// Offending URL.
		url: String,
	},
	/// `max_poll_interval_secs` is zero.
	#[error("The maximum polling interval must be at least one second.")]
	InvalidPollInterval,
}

/// Assembles a [`ProviderDescriptor`]; obtained from [`ProviderDescriptor::builder`].
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	id: ProviderId,
	device_authorization: Option<Url>,
	token: Option<Url>,
	grants: SupportedGrants,
	quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	pub(super) fn new(id: ProviderId) -> Self {
		Self {
			id,
			device_authorization: None,
			token: None,
			grants: SupportedGrants::default(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Endpoint issuing device and user codes.
	pub fn device_authorization_endpoint(mut self, url: Url) -> Self {
		self.device_authorization = Some(url);

		self
	}

	/// Endpoint polled during the device flow and used for refreshes.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token = Some(url);

		self
	}

	/// Enables one grant.
	pub fn support_grant(self, grant: GrantType) -> Self {
		self.support_grants([grant])
	}

	/// Enables every grant in `grants`.
	pub fn support_grants(mut self, grants: impl IntoIterator<Item = GrantType>) -> Self {
		self.grants = grants.into_iter().fold(self.grants, SupportedGrants::enable);

		self
	}

	/// Replaces the default quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Validates and returns the descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let Some(device_authorization) = self.device_authorization else {
			return Err(ProviderDescriptorError::MissingDeviceAuthorizationEndpoint);
		};
		let Some(token) = self.token else {
			return Err(ProviderDescriptorError::MissingTokenEndpoint);
		};

		if self.grants.is_empty() {
			return Err(ProviderDescriptorError::NoSupportedGrants);
		}
		if self.quirks.max_poll_interval_secs == 0 {
			return Err(ProviderDescriptorError::InvalidPollInterval);
		}

		require_https("device authorization", &device_authorization)?;
		require_https("token", &token)?;

		Ok(ProviderDescriptor {
			id: self.id,
			endpoints: ProviderEndpoints { device_authorization, token },
			supported_grants: self.grants,
			quirks: self.quirks,
		})
	}
}

fn require_https(endpoint: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint, url: url.to_string() }),
	}
}
