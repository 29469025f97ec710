//! Transport primitives: a thin reqwest wrapper plus tolerant parsing of the
//! provider's rate-limit response headers.

// std
use std::ops::Deref;
// crates.io
use reqwest::{Method, RequestBuilder, header::HeaderMap};
// self
use crate::_prelude::*;

const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";
const X_RATELIMIT_USED: &str = "x-ratelimit-used";

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The same client serves token exchanges and authorized API calls; callers that need
/// custom TLS or proxy settings construct their own [`ReqwestClient`] and pass it in
/// via [`ApiHttpClient::with_client`].
#[derive(Clone, Default)]
pub struct ApiHttpClient(pub ReqwestClient);
impl ApiHttpClient {
	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
		self.0.request(method, url)
	}
}
impl AsRef<ReqwestClient> for ApiHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ApiHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl Debug for ApiHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ApiHttpClient(..)")
	}
}

/// Quota counters reported by the provider on an API response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateLimitSnapshot {
	/// Requests the server still grants inside the current window.
	pub remaining: f64,
	/// Time until the current window resets.
	pub resets_in: StdDuration,
	/// Requests already used inside the window, when reported.
	pub used: Option<u32>,
}

/// Extracts the provider's rate-limit counters from response headers.
///
/// Returns `None` unless both the remaining count and the reset delay are present and
/// parse cleanly; a partial or malformed header set never corrects the limiter.
pub fn parse_rate_limit(headers: &HeaderMap) -> Option<RateLimitSnapshot> {
	let remaining = header_f64(headers, X_RATELIMIT_REMAINING)?;
	// Rejects NaN, negative, and out-of-range values in one place.
	let resets_in = StdDuration::try_from_secs_f64(header_f64(headers, X_RATELIMIT_RESET)?).ok()?;
	let used = headers
		.get(X_RATELIMIT_USED)
		.and_then(|value| value.to_str().ok())
		.and_then(|raw| raw.trim().parse().ok());

	Some(RateLimitSnapshot { remaining, resets_in, used })
}

fn header_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
	headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::{HeaderName, HeaderValue};
	// self
	use super::*;

	fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
		let mut map = HeaderMap::new();

		for (name, value) in pairs {
			map.insert(
				HeaderName::from_static(name),
				HeaderValue::from_str(value).expect("Header fixture should be valid."),
			);
		}

		map
	}

	#[test]
	fn parses_the_full_header_set() {
		let snapshot = parse_rate_limit(&headers(&[
			("x-ratelimit-remaining", "596.0"),
			("x-ratelimit-reset", "484"),
			("x-ratelimit-used", "4"),
		]))
		.expect("Complete headers should produce a snapshot.");

		assert_eq!(snapshot.remaining, 596.0);
		assert_eq!(snapshot.resets_in, StdDuration::from_secs(484));
		assert_eq!(snapshot.used, Some(4));
	}

	#[test]
	fn tolerates_a_missing_used_counter() {
		let snapshot = parse_rate_limit(&headers(&[
			("x-ratelimit-remaining", "10"),
			("x-ratelimit-reset", "60"),
		]))
		.expect("Snapshot should not require the used counter.");

		assert_eq!(snapshot.used, None);
	}

	#[test]
	fn rejects_partial_or_malformed_headers() {
		assert!(parse_rate_limit(&headers(&[("x-ratelimit-remaining", "10")])).is_none());
		assert!(
			parse_rate_limit(&headers(&[
				("x-ratelimit-remaining", "ten"),
				("x-ratelimit-reset", "60"),
			]))
			.is_none()
		);
		assert!(
			parse_rate_limit(&headers(&[
				("x-ratelimit-remaining", "10"),
				("x-ratelimit-reset", "-5"),
			]))
			.is_none()
		);
	}

	#[test]
	fn rejects_a_reset_delay_beyond_the_duration_range() {
		// Finite but unrepresentable as a Duration; must be dropped, not panic.
		let snapshot = parse_rate_limit(&headers(&[
			("x-ratelimit-remaining", "10"),
			("x-ratelimit-reset", "1e300"),
		]));

		assert!(snapshot.is_none());
	}
}
