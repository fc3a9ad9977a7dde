//! Scope sets requested from the authority.

// std
use std::{
	cmp::Ordering,
	collections::BTreeSet,
	hash::{Hash, Hasher},
	sync::OnceLock,
};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Reasons a scope list is rejected.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// A scope entry was the empty string.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// No scope was supplied at all.
	#[error("At least one scope is required.")]
	EmptySet,
	/// Scopes are space-delimited on the wire, so an entry cannot contain whitespace.
	#[error("Scope `{scope}` contains whitespace.")]
	ContainsWhitespace {
		/// Entry as supplied.
		scope: String,
	},
}

/// Non-empty, deduplicated, sorted set of scopes.
///
/// Two sets built from the same strings in any order or multiplicity are equal, hash alike, and
/// therefore map to the same token provider. Hashing goes through a lazily cached SHA-256
/// fingerprint of the space-joined scopes.
pub struct ScopeSet {
	scopes: Arc<[String]>,
	fingerprint: OnceLock<String>,
}
impl ScopeSet {
	/// Validates and normalizes `scopes`.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut unique = BTreeSet::new();

		for scope in scopes {
			let scope = scope.into();

			if scope.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if scope.contains(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope });
			}

			unique.insert(scope);
		}

		if unique.is_empty() {
			return Err(ScopeValidationError::EmptySet);
		}

		Ok(Self { scopes: unique.into_iter().collect(), fingerprint: OnceLock::new() })
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Always false; a constructed set holds at least one scope.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Whether `scope` is part of the set (exact match).
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Scopes in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(String::as_str)
	}

	/// URL-safe base64 SHA-256 of the space-joined scopes; stable across processes.
	pub fn fingerprint(&self) -> &str {
		self.fingerprint.get_or_init(|| {
			URL_SAFE_NO_PAD.encode(Sha256::digest(self.scopes.join(" ").as_bytes()))
		})
	}
}
impl Clone for ScopeSet {
	fn clone(&self) -> Self {
		Self { scopes: Arc::clone(&self.scopes), fingerprint: self.fingerprint.clone() }
	}
}
impl PartialEq for ScopeSet {
	fn eq(&self, other: &Self) -> bool {
		self.scopes == other.scopes
	}
}
impl Eq for ScopeSet {}
impl PartialOrd for ScopeSet {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for ScopeSet {
	fn cmp(&self, other: &Self) -> Ordering {
		self.scopes.cmp(&other.scopes)
	}
}
impl Hash for ScopeSet {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.fingerprint().hash(state);
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_list().entries(self.iter()).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.scopes.join(", "))
	}
}
