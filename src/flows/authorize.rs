//! Authorization-code issuance and one-shot callback completion.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialRecord},
	flows::Authenticator,
	pending::AuthorizationFuture,
};

const STATE_LEN: usize = 32;

/// Handshake returned by [`Authenticator::issue`].
///
/// The caller presents `authorize_url` to the resource owner out of band and awaits
/// `outcome`, which resolves once the matching callback arrives (or the attempt
/// expires).
#[derive(Debug)]
pub struct IssuedAuthorization {
	/// Fully-formed provider authorize URL for the resource owner.
	pub authorize_url: Url,
	/// State token correlating the redirect with its callback.
	pub state: String,
	/// Resolves with the exchange outcome of the matching callback.
	pub outcome: AuthorizationFuture,
}

impl Authenticator {
	/// Starts an authorization attempt: registers a fresh state token and returns the
	/// authorize URL together with the future its callback resolves.
	pub fn issue(&self) -> Result<IssuedAuthorization> {
		self.pending.purge_expired(OffsetDateTime::now_utc());

		let state = random_state();
		let authorize_url = self.build_authorize_url(&state)?;
		let outcome = self.pending.register(state.clone());

		tracing::debug!(%state, "issued authorization attempt");

		Ok(IssuedAuthorization { authorize_url, state, outcome })
	}

	/// Completes an authorization from the provider's callback URL.
	///
	/// The state is consumed first and exactly once; a replayed callback fails with
	/// [`Error::UnknownState`] and resolves nothing. On a known state the
	/// authorization code is exchanged for tokens and the outcome, success or
	/// failure, both resolves the pending future and is returned to the caller, which
	/// maps it onto an HTTP reply via [`CallbackReply`].
	pub async fn complete_authorization(&self, callback_url: &Url) -> Result<Credential> {
		self.pending.purge_expired(OffsetDateTime::now_utc());

		let mut code = None;
		let mut state = String::new();

		for (key, value) in callback_url.query_pairs() {
			match key.as_ref() {
				"code" => code = Some(value.into_owned()),
				"state" => state = value.into_owned(),
				_ => {},
			}
		}

		let Some(resolver) = self.pending.consume(&state) else {
			tracing::warn!(%state, "callback carried an unknown or replayed state");

			return Err(Error::UnknownState { state });
		};
		let result = self.exchange_code(code).await;

		match &result {
			Ok(_) => tracing::info!(%state, "authorization completed"),
			Err(err) => tracing::warn!(%state, reason = err.reason(), "authorization failed"),
		}

		resolver.resolve(result.clone());

		result
	}

	async fn exchange_code(&self, code: Option<String>) -> Result<Credential> {
		let Some(code) = code else {
			return Err(Error::MissingCode);
		};
		let redirect_uri = self.config.redirect_uri()?;
		let requested_at = OffsetDateTime::now_utc();
		let grant = self
			.token_exchange(&[
				("grant_type", "authorization_code"),
				("code", &code),
				("redirect_uri", redirect_uri.as_str()),
				("raw_json", "true"),
			])
			.await?;

		Ok(Credential::new(
			grant.access_token,
			grant.expires_after,
			requested_at,
			grant.scope,
			grant.refresh_token,
		))
	}

	fn build_authorize_url(&self, state: &str) -> Result<Url> {
		let redirect_uri = self.config.redirect_uri()?;
		let mut url = self.config.endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("client_id", &self.config.client_id);
		pairs.append_pair("response_type", "code");
		pairs.append_pair("state", state);
		pairs.append_pair("redirect_uri", redirect_uri.as_str());
		pairs.append_pair("duration", self.config.duration.as_query_value());
		pairs.append_pair("scope", &self.config.scopes.joined());

		drop(pairs);

		Ok(url)
	}
}

/// JSON body the external router sends back to the callback request.
///
/// Mirrors the result shape `{ok, val|reason, info?}`: a success carries the
/// credential's plain record, a failure its stable reason code and best-effort
/// detail. [`CallbackReply::http_status`] picks the matching 200/400 status.
#[derive(Clone, Debug, Serialize)]
pub struct CallbackReply {
	/// Whether the authorization completed successfully.
	pub ok: bool,
	/// Credential record on success.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub val: Option<CredentialRecord>,
	/// Stable failure reason code.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	/// Best-effort failure detail.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub info: Option<serde_json::Value>,
}
impl CallbackReply {
	/// Builds the reply for a completed (or failed) callback.
	pub fn from_result(result: &Result<Credential>) -> Self {
		match result {
			Ok(credential) =>
				Self { ok: true, val: Some(credential.to_record()), reason: None, info: None },
			Err(err) => Self {
				ok: false,
				val: None,
				reason: Some(err.reason().to_owned()),
				info: error_info(err),
			},
		}
	}

	/// HTTP status the router should answer with.
	pub fn http_status(&self) -> u16 {
		if self.ok { 200 } else { 400 }
	}
}

fn error_info(err: &Error) -> Option<serde_json::Value> {
	match err {
		Error::Transport { message } => Some(serde_json::json!(message)),
		Error::HttpStatus { status, body } =>
			Some(serde_json::json!({ "status": status, "body": body })),
		Error::Deserialization { path, message } =>
			Some(serde_json::json!({ "path": path, "message": message })),
		Error::ProviderDenied { reason } => Some(serde_json::json!(reason)),
		Error::UnknownState { state } => Some(serde_json::json!(state)),
		Error::Config(source) => Some(serde_json::json!(source.to_string())),
		Error::MissingCode | Error::NotRefreshable | Error::AuthorizationExpired => None,
	}
}

fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}
