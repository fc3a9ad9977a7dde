//! Identifiers: the application (client) GUID plus tenant and provider labels.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use uuid::Uuid;
// self
use crate::{_prelude::*, error::ConfigError};

const LABEL_MAX_LEN: usize = 128;

macro_rules! def_label {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name(String);
		impl $name {
			/// Validates `value` and wraps it.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				check_label($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

/// Why a tenant or provider label was rejected.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// Nothing was supplied.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Tenant or Provider.
		kind: &'static str,
	},
	/// Labels end up in URL paths, so whitespace is not allowed.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Tenant or Provider.
		kind: &'static str,
	},
	/// Longer than the permitted length.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Tenant or Provider.
		kind: &'static str,
		/// Permitted length.
		max: usize,
	},
}

def_label! { TenantId, "Directory tenant selecting the authority (`common`, a domain, or a GUID).", "Tenant" }
def_label! { ProviderId, "Name of an authority descriptor, used in logs and errors.", "Provider" }

impl TenantId {
	/// Multi-tenant authority accepting both work/school and personal accounts.
	pub fn common() -> Self {
		Self("common".into())
	}
}

/// Application (client) identifier registered with the authority.
///
/// The value is a GUID; [`ClientId::PLACEHOLDER`] is the nil GUID used when no identifier was
/// supplied. The hyphenated, simple, braced, and parenthesized spellings are accepted and
/// normalized to the lowercase hyphenated form; `urn:uuid:` values are not GUIDs and are refused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(Uuid);
impl ClientId {
	/// Nil GUID placeholder.
	pub const PLACEHOLDER: Self = Self(Uuid::nil());

	/// Parses a GUID string, failing with [`ConfigError::InvalidClientId`] when malformed.
	pub fn parse(value: impl AsRef<str>) -> Result<Self, ConfigError> {
		let raw = value.as_ref();
		let invalid = |source| ConfigError::InvalidClientId { value: raw.to_owned(), source };

		if raw.get(..4).is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:")) {
			return Err(invalid(None));
		}

		let guid = match raw.strip_prefix('(').and_then(|inner| inner.strip_suffix(')')) {
			Some(inner) if inner.starts_with('{') => return Err(invalid(None)),
			Some(inner) => inner,
			None => raw,
		};

		Uuid::parse_str(guid).map(Self).map_err(|source| invalid(Some(source)))
	}

	/// Whether this is the nil placeholder rather than a registered application.
	pub fn is_placeholder(&self) -> bool {
		self.0.is_nil()
	}
}
impl Default for ClientId {
	fn default() -> Self {
		Self::PLACEHOLDER
	}
}
impl Debug for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Client({})", self.0.hyphenated())
	}
}
impl Display for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0.hyphenated(), f)
	}
}

fn check_label(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
	if value.is_empty() {
		Err(IdentifierError::Empty { kind })
	} else if value.contains(char::is_whitespace) {
		Err(IdentifierError::ContainsWhitespace { kind })
	} else if value.len() > LABEL_MAX_LEN {
		Err(IdentifierError::TooLong { kind, max: LABEL_MAX_LEN })
	} else {
		Ok(())
	}
}
