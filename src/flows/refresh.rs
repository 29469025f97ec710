//! Refresh-token grant applied to a credential in place.

// self
use crate::{_prelude::*, auth::Credential, flows::Authenticator};

impl Authenticator {
	/// Refreshes `credential` in place via a `grant_type=refresh_token` exchange.
	///
	/// Fails with [`Error::NotRefreshable`] when the credential carries no refresh
	/// token. On any failure the credential is left unmodified. On success the access
	/// token, expiry window, scopes, and `refreshed_at` (stamped with the instant the
	/// request was made, not when it returned) are replaced; the refresh token is
	/// preserved unless the provider rotated it.
	///
	/// Concurrent refreshes serialize on a singleflight guard; staleness is never
	/// checked here; callers decide when a refresh is due.
	pub async fn refresh(&self, credential: &mut Credential) -> Result<()> {
		let _singleflight = self.refresh_guard.lock().await;
		let refresh_token =
			credential.refresh_token().ok_or(Error::NotRefreshable)?.expose().to_owned();
		let requested_at = OffsetDateTime::now_utc();
		let grant = self
			.token_exchange(&[
				("grant_type", "refresh_token"),
				("refresh_token", &refresh_token),
				("raw_json", "true"),
			])
			.await
			.inspect_err(|err| {
				tracing::warn!(reason = err.reason(), "credential refresh failed");
			})?;

		credential.apply_refresh(
			grant.access_token,
			grant.expires_after,
			grant.scope,
			requested_at,
			grant.refresh_token,
		);

		tracing::info!("credential refreshed");

		Ok(())
	}
}
