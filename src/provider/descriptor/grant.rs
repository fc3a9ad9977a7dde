// self
use crate::_prelude::*;

/// Grants a token provider can run against the authority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantType {
	/// Device Authorization grant (RFC 8628).
	DeviceCode,
	/// Refresh Token grant used for silent renewal.
	RefreshToken,
}
impl GrantType {
	/// Short label for logs and error messages.
	pub fn label(self) -> &'static str {
		match self {
			Self::DeviceCode => "device_code",
			Self::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.label())
	}
}

/// Grants enabled on a descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SupportedGrants {
	/// Device Authorization grant.
	pub device_code: bool,
	/// Refresh Token grant.
	pub refresh_token: bool,
}
impl SupportedGrants {
	/// Whether `grant` is enabled.
	pub fn supports(self, grant: GrantType) -> bool {
		match grant {
			GrantType::DeviceCode => self.device_code,
			GrantType::RefreshToken => self.refresh_token,
		}
	}

	/// Returns a copy with `grant` enabled.
	pub fn enable(mut self, grant: GrantType) -> Self {
		match grant {
			GrantType::DeviceCode => self.device_code = true,
			GrantType::RefreshToken => self.refresh_token = true,
		}

		self
	}

	/// Whether no grant is enabled.
	pub fn is_empty(self) -> bool {
		!(self.device_code || self.refresh_token)
	}
}
