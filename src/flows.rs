//! Credential lifecycle flows: issuing authorize URLs, completing one-shot callbacks,
//! and refreshing credentials.

pub mod authorize;
pub mod refresh;

pub use authorize::*;

// crates.io
use reqwest::Method;
// self
use crate::{
	_prelude::*,
	auth::ScopeList,
	config::GovernorConfig,
	http::ApiHttpClient,
	pending::PendingAuthorizations,
};

/// Drives the OAuth credential lifecycle against the configured provider.
///
/// The authenticator owns the pending-state registry bridging `issue()` and the later
/// callback, and the HTTP client used for token exchanges. Refreshes are singleflight:
/// concurrent callers serialize on an internal guard so a credential is never rotated
/// twice for one expiry.
pub struct Authenticator {
	pub(crate) config: GovernorConfig,
	pub(crate) http: ApiHttpClient,
	pub(crate) pending: PendingAuthorizations,
	pub(crate) refresh_guard: AsyncMutex<()>,
}
impl Authenticator {
	/// Creates an authenticator with a default reqwest transport.
	pub fn new(config: GovernorConfig) -> Self {
		Self::with_http_client(config, ApiHttpClient::default())
	}

	/// Creates an authenticator that reuses the caller-provided transport.
	pub fn with_http_client(config: GovernorConfig, http: ApiHttpClient) -> Self {
		Self {
			config,
			http,
			pending: PendingAuthorizations::new(),
			refresh_guard: AsyncMutex::new(()),
		}
	}

	/// Overrides the lifetime of unresolved authorization attempts.
	///
	/// Attempts issued before the override keep their original deadline.
	pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
		self.pending.set_ttl(ttl);

		self
	}

	/// The configuration this authenticator was built with.
	pub fn config(&self) -> &GovernorConfig {
		&self.config
	}

	/// The registry of unresolved authorization attempts.
	pub fn pending(&self) -> &PendingAuthorizations {
		&self.pending
	}

	/// Performs a token-endpoint exchange with basic-auth client credentials.
	pub(crate) async fn token_exchange(&self, form: &[(&str, &str)]) -> Result<TokenGrant> {
		let response = self
			.http
			.request(Method::POST, self.config.endpoints.token.clone())
			.basic_auth(&self.config.client_id, Some(&self.config.client_secret))
			.form(form)
			.send()
			.await
			.map_err(Error::transport)?;
		let status = response.status();
		let bytes = response.bytes().await.map_err(Error::transport)?;

		if status.as_u16() != 200 {
			return Err(Error::HttpStatus {
				status: status.as_u16(),
				body: serde_json::from_slice(&bytes).ok(),
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
		let payload: TokenExchangePayload =
			serde_path_to_error::deserialize(&mut deserializer).map_err(Error::deserialization)?;

		payload.into_grant()
	}
}
impl Debug for Authenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("config", &self.config)
			.field("pending", &self.pending)
			.finish()
	}
}

/// Successful token-exchange output, before it is turned into a credential.
#[derive(Clone, Debug)]
pub(crate) struct TokenGrant {
	pub(crate) access_token: String,
	pub(crate) expires_after: Duration,
	pub(crate) scope: ScopeList,
	pub(crate) refresh_token: Option<String>,
}

/// Raw token-endpoint payload.
///
/// The provider reports grant denials as an `error` field, sometimes inside a 200
/// response, so every field stays optional until the denial check has run.
#[derive(Debug, Deserialize)]
struct TokenExchangePayload {
	error: Option<String>,
	access_token: Option<String>,
	expires_in: Option<u64>,
	scope: Option<String>,
	refresh_token: Option<String>,
}
impl TokenExchangePayload {
	fn into_grant(self) -> Result<TokenGrant> {
		if let Some(reason) = self.error {
			return Err(Error::ProviderDenied { reason });
		}

		let access_token = self.access_token.ok_or_else(|| missing_field("access_token"))?;
		let expires_in = self.expires_in.ok_or_else(|| missing_field("expires_in"))?;
		let scope = self.scope.unwrap_or_default();

		Ok(TokenGrant {
			access_token,
			expires_after: Duration::seconds(i64::try_from(expires_in).unwrap_or(i64::MAX)),
			scope: ScopeList::from_space_joined(&scope),
			refresh_token: self.refresh_token,
		})
	}
}

fn missing_field(field: &str) -> Error {
	Error::Deserialization { path: field.into(), message: "missing field".into() }
}
