//! Validated probe configuration.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, TenantId},
	error::ConfigError,
	mail::MAX_PAGE_SIZE,
	provider::ProviderDescriptor,
};

/// Tenant used when none is supplied; accepts work, school, and personal accounts.
pub const DEFAULT_TENANT: &str = "common";

/// Everything the probe needs before touching the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeConfig {
	/// Application registration the tokens are requested for.
	pub client_id: ClientId,
	/// Tenant selecting the Microsoft authority.
	pub tenant: TenantId,
	/// Optional cap on the number of messages requested per endpoint.
	pub top: Option<u32>,
}
impl ProbeConfig {
	/// Validates raw inputs; a missing client id falls back to [`ClientId::PLACEHOLDER`].
	pub fn resolve(client_id: Option<&str>, tenant: &str, top: Option<u32>) -> Result<Self, ConfigError> {
		let client_id = client_id.map(ClientId::parse).transpose()?.unwrap_or_default();
		let tenant = TenantId::new(tenant)?;

		if let Some(value) = top.filter(|value| *value == 0 || *value > MAX_PAGE_SIZE) {
			return Err(ConfigError::InvalidPageSize { value, max: MAX_PAGE_SIZE });
		}

		Ok(Self { client_id, tenant, top })
	}

	/// Microsoft identity platform descriptor for the configured tenant.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		ProviderDescriptor::microsoft(&self.tenant)
	}
}
