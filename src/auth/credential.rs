//! The OAuth credential pair and its persisted record shape.

// self
use crate::{
	_prelude::*,
	auth::{ScopeList, secret::TokenSecret},
};

/// Access/refresh token pair with expiry bookkeeping.
///
/// A credential is created by the token-exchange step of an authorization or
/// reconstructed from a [`CredentialRecord`]; it is only ever mutated in place by the
/// refresh flow. The governor never drops it on its own; ownership stays with the
/// caller and its storage layer.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	access_token: TokenSecret,
	expires_after: Duration,
	refreshed_at: OffsetDateTime,
	scope: ScopeList,
	refresh_token: Option<TokenSecret>,
}
impl Credential {
	/// Assembles a credential from token-exchange output.
	pub fn new(
		access_token: impl Into<String>,
		expires_after: Duration,
		refreshed_at: OffsetDateTime,
		scope: ScopeList,
		refresh_token: Option<String>,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			expires_after,
			refreshed_at,
			scope,
			refresh_token: refresh_token.map(TokenSecret::new),
		}
	}

	/// Current access token.
	pub fn access_token(&self) -> &TokenSecret {
		&self.access_token
	}

	/// Validity window counted from [`Self::refreshed_at`].
	pub fn expires_after(&self) -> Duration {
		self.expires_after
	}

	/// Instant the access token was obtained or last refreshed.
	pub fn refreshed_at(&self) -> OffsetDateTime {
		self.refreshed_at
	}

	/// Scopes granted to the access token, in request order.
	pub fn scope(&self) -> &ScopeList {
		&self.scope
	}

	/// Refresh token, when the authorization was permanent.
	pub fn refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref()
	}

	/// Returns `true` while `instant < refreshed_at + expires_after`.
	pub fn is_fresh_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.refreshed_at + self.expires_after
	}

	/// Freshness check against the current UTC clock.
	///
	/// The governor never refreshes proactively; callers decide what to do with a
	/// stale credential.
	pub fn is_fresh(&self) -> bool {
		self.is_fresh_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` when a refresh token is available.
	pub fn is_refreshable(&self) -> bool {
		self.refresh_token.is_some()
	}

	/// Applies a successful refresh grant in place.
	///
	/// The stored refresh token survives unless the provider rotated it.
	pub(crate) fn apply_refresh(
		&mut self,
		access_token: String,
		expires_after: Duration,
		scope: ScopeList,
		refreshed_at: OffsetDateTime,
		rotated_refresh_token: Option<String>,
	) {
		self.access_token = TokenSecret::new(access_token);
		self.expires_after = expires_after;
		self.scope = scope;
		self.refreshed_at = refreshed_at;

		if let Some(rotated) = rotated_refresh_token {
			self.refresh_token = Some(TokenSecret::new(rotated));
		}
	}

	/// Serializes the credential into its plain persistence record.
	pub fn to_record(&self) -> CredentialRecord {
		CredentialRecord {
			access_token: self.access_token.expose().to_owned(),
			expires_after: i64::try_from(self.expires_after.whole_milliseconds())
				.unwrap_or(i64::MAX),
			refreshed_at: i64::try_from(self.refreshed_at.unix_timestamp_nanos() / 1_000_000)
				.unwrap_or(i64::MAX),
			scope: self.scope.clone(),
			refresh_token: self.refresh_token.as_ref().map(|t| t.expose().to_owned()),
		}
	}

	/// Reconstructs a credential from its persistence record.
	pub fn from_record(record: CredentialRecord) -> Result<Self, CredentialRecordError> {
		let refreshed_at =
			OffsetDateTime::from_unix_timestamp_nanos(i128::from(record.refreshed_at) * 1_000_000)
				.map_err(|_| CredentialRecordError::TimestampOutOfRange {
					millis: record.refreshed_at,
				})?;

		Ok(Self {
			access_token: TokenSecret::new(record.access_token),
			expires_after: Duration::milliseconds(record.expires_after),
			refreshed_at,
			scope: record.scope,
			refresh_token: record.refresh_token.map(TokenSecret::new),
		})
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("expires_after", &self.expires_after)
			.field("refreshed_at", &self.refreshed_at)
			.field("scope", &self.scope)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Plain persistence shape for a [`Credential`].
///
/// Field names and units match the record the storage collaborator reads and writes:
/// camelCase keys, millisecond durations, and a millisecond unix timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
	/// Raw access token.
	pub access_token: String,
	/// Validity window in milliseconds.
	pub expires_after: i64,
	/// Milliseconds since the unix epoch at the last refresh.
	pub refreshed_at: i64,
	/// Granted scopes in request order.
	pub scope: ScopeList,
	/// Raw refresh token, absent for temporary authorizations.
	pub refresh_token: Option<String>,
}

/// Failures reconstructing a [`Credential`] from its record.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialRecordError {
	/// The persisted timestamp does not fit the supported datetime range.
	#[error("persisted refresh timestamp {millis}ms is out of range")]
	TimestampOutOfRange {
		/// The offending millisecond timestamp.
		millis: i64,
	},
}
