//! Order-preserving OAuth scope lists.
//!
//! Reddit grants scopes back in the order they were requested and the governor keeps
//! that order intact, both on the authorize URL (space-joined) and in the persisted
//! record. Validation only rejects entries that would corrupt the space-joined wire
//! form.

// self
use crate::_prelude::*;

/// Errors emitted when validating requested scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("scope entries cannot be empty")]
	Empty,
	/// Scopes cannot contain embedded whitespace.
	#[error("scope contains whitespace: {scope}")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Ordered list of OAuth scopes, space-joined on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeList(Vec<String>);
impl ScopeList {
	/// Builds a scope list from an iterator, preserving the iteration order.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut list = Vec::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
			}

			list.push(owned);
		}

		Ok(Self(list))
	}

	/// Splits a provider-supplied space-joined scope string.
	///
	/// The provider is trusted here; empty segments are skipped so an empty string
	/// yields an empty list.
	pub fn from_space_joined(raw: &str) -> Self {
		Self(raw.split_whitespace().map(str::to_owned).collect())
	}

	/// Number of scopes in the list.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no scopes are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over the scopes in their original order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Space-joined wire representation.
	pub fn joined(&self) -> String {
		self.0.join(" ")
	}

	/// Returns the underlying slice of scope strings.
	pub fn as_slice(&self) -> &[String] {
		&self.0
	}
}
impl Display for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.joined())
	}
}
impl FromStr for ScopeList {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s.split_whitespace())
	}
}
