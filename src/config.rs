//! Governor configuration: OAuth client identity, requested scopes, callback wiring,
//! and the provider endpoint set.

// self
use crate::{_prelude::*, auth::ScopeList, error::ConfigError};

/// Lifetime requested for the authorization, mapped onto the `duration` query
/// parameter of the authorize URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationDuration {
	/// Permanent authorization; the token exchange returns a refresh token.
	#[default]
	Permanent,
	/// Temporary authorization; the access token cannot be refreshed.
	Temporary,
}
impl AuthorizationDuration {
	/// Query-parameter value understood by the provider.
	pub const fn as_query_value(self) -> &'static str {
		match self {
			AuthorizationDuration::Permanent => "permanent",
			AuthorizationDuration::Temporary => "temporary",
		}
	}
}

/// Provider endpoint set used by the flows and the API client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the resource owner is redirected to.
	pub authorization: Url,
	/// Token endpoint for `authorization_code` and `refresh_token` grants.
	pub token: Url,
	/// Authorized API host.
	pub api: Url,
}
impl ProviderEndpoints {
	/// Reddit's production endpoints.
	pub fn reddit() -> Self {
		// Literal URLs; parsing cannot fail.
		Self {
			authorization: Url::parse("https://www.reddit.com/api/v1/authorize")
				.expect("hard-coded authorization endpoint must parse"),
			token: Url::parse("https://www.reddit.com/api/v1/access_token")
				.expect("hard-coded token endpoint must parse"),
			api: Url::parse("https://oauth.reddit.com")
				.expect("hard-coded API host must parse"),
		}
	}
}
impl Default for ProviderEndpoints {
	fn default() -> Self {
		Self::reddit()
	}
}

/// Process configuration consumed from an external source.
#[derive(Clone, PartialEq, Eq)]
pub struct GovernorConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret, presented via basic auth on token exchanges.
	pub client_secret: String,
	/// Scopes requested during authorization.
	pub scopes: ScopeList,
	/// Permanence of the requested authorization.
	pub duration: AuthorizationDuration,
	/// Path the provider redirects back to, e.g. `/auth/callback`.
	pub callback_path: String,
	/// Local listening port used to assemble the redirect URI.
	pub port: u16,
	/// Provider endpoints; defaults to Reddit's, overridable for tests.
	pub endpoints: ProviderEndpoints,
}
impl GovernorConfig {
	/// Creates a configuration with Reddit defaults for everything but the client
	/// credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			scopes: ScopeList::default(),
			duration: AuthorizationDuration::Permanent,
			callback_path: "/auth/callback".into(),
			port: 8080,
			endpoints: ProviderEndpoints::reddit(),
		}
	}

	/// Sets the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeList) -> Self {
		self.scopes = scopes;

		self
	}

	/// Sets the requested authorization lifetime.
	pub fn with_duration(mut self, duration: AuthorizationDuration) -> Self {
		self.duration = duration;

		self
	}

	/// Sets the callback path the provider redirects back to.
	pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
		self.callback_path = path.into();

		self
	}

	/// Sets the local listening port used for the redirect URI.
	pub fn with_port(mut self, port: u16) -> Self {
		self.port = port;

		self
	}

	/// Overrides the provider endpoint set.
	pub fn with_endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Redirect URI presented to the provider, assembled from port and callback path.
	pub fn redirect_uri(&self) -> Result<Url, ConfigError> {
		Url::parse(&format!("http://localhost:{}{}", self.port, self.callback_path))
			.map_err(|source| ConfigError::InvalidRedirect { source })
	}
}
impl Debug for GovernorConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GovernorConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("scopes", &self.scopes)
			.field("duration", &self.duration)
			.field("callback_path", &self.callback_path)
			.field("port", &self.port)
			.field("endpoints", &self.endpoints)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn redirect_uri_combines_port_and_path() {
		let config = GovernorConfig::new("id", "secret")
			.with_port(9123)
			.with_callback_path("/auth/reddit/callback");
		let redirect = config.redirect_uri().expect("Redirect URI should parse.");

		assert_eq!(redirect.as_str(), "http://localhost:9123/auth/reddit/callback");
	}

	#[test]
	fn duration_maps_to_query_values() {
		assert_eq!(AuthorizationDuration::Permanent.as_query_value(), "permanent");
		assert_eq!(AuthorizationDuration::Temporary.as_query_value(), "temporary");
	}

	#[test]
	fn debug_redacts_the_client_secret() {
		let rendered = format!("{:?}", GovernorConfig::new("id", "super-secret"));

		assert!(!rendered.contains("super-secret"));
	}
}
