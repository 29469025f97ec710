// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use reddit_governor::{
	auth::{Credential, ScopeList},
	config::{GovernorConfig, ProviderEndpoints},
	error::Error,
	flows::Authenticator,
};

fn build_authenticator(server: &MockServer) -> Authenticator {
	let endpoints = ProviderEndpoints {
		authorization: Url::parse(&server.url("/api/v1/authorize"))
			.expect("Mock authorization endpoint should parse successfully."),
		token: Url::parse(&server.url("/api/v1/access_token"))
			.expect("Mock token endpoint should parse successfully."),
		api: Url::parse(&server.base_url()).expect("Mock API host should parse successfully."),
	};

	Authenticator::new(GovernorConfig::new("client-it", "secret-it").with_endpoints(endpoints))
}

fn stale_credential() -> Credential {
	Credential::new(
		"access-old",
		Duration::seconds(3_600),
		OffsetDateTime::now_utc() - Duration::hours(2),
		ScopeList::new(["identity"]).expect("Scope list should be valid for refresh test."),
		Some("refresh-old".into()),
	)
}

#[tokio::test]
async fn refresh_replaces_the_access_token_and_keeps_the_refresh_token() {
	let server = MockServer::start_async().await;
	let authenticator = build_authenticator(&server);
	let mut credential = stale_credential();

	assert!(!credential.is_fresh());

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/access_token")
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("grant_type=refresh_token")
				.body_includes("refresh_token=refresh-old");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":3600,\"scope\":\"identity\"}",
			);
		})
		.await;

	authenticator.refresh(&mut credential).await.expect("Refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(credential.access_token().expose(), "access-new");
	assert_eq!(credential.refresh_token().map(|t| t.expose()), Some("refresh-old"));
	assert!(credential.is_fresh());
}

#[tokio::test]
async fn refresh_adopts_a_rotated_refresh_token() {
	let server = MockServer::start_async().await;
	let authenticator = build_authenticator(&server);
	let mut credential = stale_credential();
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":3600,\"scope\":\"identity\",\"refresh_token\":\"refresh-rotated\"}",
			);
		})
		.await;

	authenticator.refresh(&mut credential).await.expect("Refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(credential.refresh_token().map(|t| t.expose()), Some("refresh-rotated"));
}

#[tokio::test]
async fn failed_refresh_leaves_the_credential_unmodified() {
	let server = MockServer::start_async().await;
	let authenticator = build_authenticator(&server);
	let mut credential = stale_credential();
	let before = credential.clone();
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let err = authenticator
		.refresh(&mut credential)
		.await
		.expect_err("A 400 token response must fail the refresh.");

	mock.assert_async().await;

	assert!(matches!(err, Error::HttpStatus { status: 400, .. }));
	assert_eq!(credential, before, "A failed refresh must not modify the credential.");
}
