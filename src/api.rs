//! Authorized API request execution: limiter permit, bearer token, classification,
//! and the quota feedback loop.

// crates.io
use reqwest::Method;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	http::{ApiHttpClient, parse_rate_limit},
	limiter::RateLimiter,
};

/// Executes authorized calls against the API host.
///
/// Every call first acquires one unit from the rate limiter (a suspension point under
/// load), then carries the credential's current access token. The credential is shared
/// behind a lock so a refresh performed elsewhere is picked up by the next call.
#[derive(Clone, Debug)]
pub struct ApiClient {
	http: ApiHttpClient,
	api_base: Url,
	credential: Arc<RwLock<Credential>>,
	limiter: RateLimiter,
}
impl ApiClient {
	/// Creates a client with a default reqwest transport, taking ownership of the
	/// credential.
	pub fn new(api_base: Url, credential: Credential, limiter: RateLimiter) -> Self {
		Self::shared(api_base, Arc::new(RwLock::new(credential)), limiter)
	}

	/// Creates a client around an already-shared credential.
	pub fn shared(
		api_base: Url,
		credential: Arc<RwLock<Credential>>,
		limiter: RateLimiter,
	) -> Self {
		Self { http: ApiHttpClient::default(), api_base, credential, limiter }
	}

	/// Replaces the transport, e.g. with a client configured for tests.
	pub fn with_http_client(mut self, http: ApiHttpClient) -> Self {
		self.http = http;

		self
	}

	/// Handle to the shared credential, for the refresh path.
	pub fn credential(&self) -> Arc<RwLock<Credential>> {
		self.credential.clone()
	}

	/// The rate limiter governing this client.
	pub fn limiter(&self) -> &RateLimiter {
		&self.limiter
	}

	/// Executes an authorized call and deserializes its 200 payload.
	///
	/// The request targets `api_base + path` with the `raw_json=1` query marker and a
	/// bearer-authorization header; `params`, when present, become a url-encoded form
	/// body. Classification: transport failures are reported as-is, a non-200 status
	/// carries a best-effort parsed body (an unparseable body becomes absent without
	/// failing classification), and a 200 body that does not deserialize is a
	/// [`Error::Deserialization`]. Nothing is retried here; only quota timing is, inside
	/// the limiter. The provider's rate-limit headers on every response, success or
	/// not, are fed back into the limiter.
	pub async fn call_authorized<T>(
		&self,
		method: Method,
		path: &str,
		params: Option<&[(&str, &str)]>,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.limiter.acquire().await;

		let mut url = self.api_base.clone();

		url.set_path(path);
		url.query_pairs_mut().append_pair("raw_json", "1");

		let bearer = self.credential.read().access_token().expose().to_owned();
		let mut request = self.http.request(method, url).bearer_auth(bearer);

		if let Some(params) = params {
			request = request.form(params);
		}

		let response = request.send().await.map_err(Error::transport)?;

		if let Some(snapshot) = parse_rate_limit(response.headers()) {
			self.limiter.correct_from_provider(snapshot.resets_in, snapshot.remaining);
		}

		let status = response.status().as_u16();
		let bytes = response.bytes().await.map_err(Error::transport)?;

		if status != 200 {
			tracing::debug!(status, path, "API call returned a non-200 status");

			return Err(Error::HttpStatus { status, body: serde_json::from_slice(&bytes).ok() });
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer).map_err(Error::deserialization)
	}
}
