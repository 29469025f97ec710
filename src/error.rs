//! Tagged error taxonomy shared across the governor's flows and API client.
//!
//! Every remote call is wrapped so failure becomes a value returned to the immediate
//! caller; nothing crosses a boundary as a panic. [`Error`] is deliberately `Clone`:
//! the outcome of a callback exchange has to resolve the pending authorization future
//! *and* travel back to the inbound router, so transport and parse failures capture
//! their sources as rendered text instead of boxed error chains.

// self
use crate::_prelude::*;

/// Governor-wide result alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical failure value exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// The request could not be sent or the connection failed.
	#[error("request could not be completed: {message}")]
	Transport {
		/// Rendered transport failure.
		message: String,
	},
	/// The remote endpoint answered with a non-200 status.
	///
	/// Token-exchange and API responses share this variant (and its single
	/// `response_not_200` reason code); the call site that surfaced it is the
	/// caller's context, not part of the value.
	#[error("endpoint responded with status {status}")]
	HttpStatus {
		/// Numeric HTTP status.
		status: u16,
		/// Best-effort parsed response body; absent when the body was not JSON.
		body: Option<serde_json::Value>,
	},
	/// A 200 response whose body could not be deserialized as the expected shape.
	#[error("response body could not be deserialized at `{path}`: {message}")]
	Deserialization {
		/// Path into the document where deserialization failed.
		path: String,
		/// Rendered deserialization failure.
		message: String,
	},
	/// The provider's token-exchange payload carried an explicit `error` field.
	///
	/// Covers both the authorization-code and the refresh grant; the single
	/// `token_request_denied` reason code does not distinguish them.
	#[error("provider denied the token request: {reason}")]
	ProviderDenied {
		/// Provider-supplied error code.
		reason: String,
	},
	/// The callback query string carried no `code` parameter.
	#[error("callback query is missing the authorization code")]
	MissingCode,
	/// The callback `state` is absent, unknown, or already consumed.
	#[error("callback state `{state}` is not pending authorization")]
	UnknownState {
		/// The state value received in the callback, empty when absent.
		state: String,
	},
	/// Refresh attempted on a credential without a refresh token.
	#[error("credential carries no refresh token")]
	NotRefreshable,
	/// The pending authorization passed its deadline before a callback arrived.
	#[error("authorization attempt expired before the callback arrived")]
	AuthorizationExpired,
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Wraps a transport-layer failure.
	pub fn transport(source: impl Display) -> Self {
		Self::Transport { message: source.to_string() }
	}

	/// Wraps a structured deserialization failure, keeping the offending path.
	pub fn deserialization(source: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Deserialization {
			path: source.path().to_string(),
			message: source.inner().to_string(),
		}
	}

	/// Stable snake_case reason code mirrored into the callback JSON reply.
	pub fn reason(&self) -> &'static str {
		match self {
			Self::Transport { .. } => "fetch_error",
			Self::HttpStatus { .. } => "response_not_200",
			Self::Deserialization { .. } => "json_stream_error",
			Self::ProviderDenied { .. } => "token_request_denied",
			Self::MissingCode => "callback_query_missing_code",
			Self::UnknownState { .. } => "unknown_state_in_callback_query",
			Self::NotRefreshable => "token_not_permanent",
			Self::AuthorizationExpired => "authorization_expired",
			Self::Config(_) => "config_error",
		}
	}
}

/// Configuration and validation failures raised locally.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// The redirect URI assembled from port + callback path cannot be parsed.
	#[error("redirect URI is invalid")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Requested scopes failed validation.
	#[error("requested scopes are invalid")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn reason_codes_are_stable() {
		assert_eq!(Error::transport("connection reset").reason(), "fetch_error");
		assert_eq!(Error::HttpStatus { status: 503, body: None }.reason(), "response_not_200");
		assert_eq!(Error::MissingCode.reason(), "callback_query_missing_code");
		assert_eq!(
			Error::UnknownState { state: "abc".into() }.reason(),
			"unknown_state_in_callback_query"
		);
		assert_eq!(Error::NotRefreshable.reason(), "token_not_permanent");
		assert_eq!(
			Error::ProviderDenied { reason: "invalid_grant".into() }.reason(),
			"token_request_denied"
		);
	}

	#[test]
	fn failures_clone_for_future_resolution() {
		let original = Error::HttpStatus { status: 400, body: Some(serde_json::json!({"e": 1})) };
		let copy = original.clone();

		assert!(matches!(copy, Error::HttpStatus { status: 400, .. }));
	}
}
