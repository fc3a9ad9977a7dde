//! Authority descriptor data structures shared by all flows.
//!
//! The module exposes validated endpoint metadata, the builder used to assemble it, grant flags,
//! and quirk toggles, plus a preset for the Microsoft identity platform.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Grant helpers wired into provider descriptors.
pub mod grant;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use grant::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, TenantId},
	error::ConfigError,
};

const MICROSOFT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoints {
	/// Device authorization endpoint issuing device and user codes.
	pub device_authorization: Url,
	/// Token endpoint polled for device grants and used for refreshes.
	pub token: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Supported grant flags.
	pub supported_grants: SupportedGrants,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Microsoft identity platform (v2.0 endpoints) for the given tenant.
	///
	/// Enables the device-code and refresh grants and asks for `offline_access` so silent renewal
	/// works for the lifetime of the process.
	pub fn microsoft(tenant: &TenantId) -> Result<Self, ConfigError> {
		let base = format!("{MICROSOFT_AUTHORITY}/{tenant}/oauth2/v2.0");
		let endpoint = |path: &str| {
			Url::parse(&format!("{base}/{path}"))
				.map_err(|source| ConfigError::InvalidDescriptor { source })
		};
		let descriptor = Self::builder(ProviderId::new("microsoft")?)
			.device_authorization_endpoint(endpoint("devicecode")?)
			.token_endpoint(endpoint("token")?)
			.support_grants([GrantType::DeviceCode, GrantType::RefreshToken])
			.quirks(ProviderQuirks { request_offline_access: true, ..ProviderQuirks::default() })
			.build()?;

		Ok(descriptor)
	}

	/// Checks whether the descriptor supports a given grant.
	pub fn supports(&self, grant: GrantType) -> bool {
		self.supported_grants.supports(grant)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn microsoft_preset_targets_tenant_endpoints() {
		let tenant = TenantId::new("contoso.onmicrosoft.com").expect("Tenant fixture should be valid.");
		let descriptor = ProviderDescriptor::microsoft(&tenant)
			.expect("Microsoft descriptor should build for a valid tenant.");

		assert_eq!(
			descriptor.endpoints.device_authorization.as_str(),
			"https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/v2.0/devicecode"
		);
		assert_eq!(
			descriptor.endpoints.token.as_str(),
			"https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/v2.0/token"
		);
		assert!(descriptor.supports(GrantType::DeviceCode));
		assert!(descriptor.supports(GrantType::RefreshToken));
		assert!(descriptor.quirks.request_offline_access);
	}
}
