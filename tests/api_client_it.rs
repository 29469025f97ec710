// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
use reqwest::Method;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use reddit_governor::{
	api::ApiClient,
	auth::{Credential, ScopeList},
	error::Error,
	limiter::RateLimiter,
};

#[derive(Debug, Deserialize)]
struct Identity {
	name: String,
}

fn build_client(server: &MockServer, limiter: RateLimiter) -> ApiClient {
	let api_base =
		Url::parse(&server.base_url()).expect("Mock API host should parse successfully.");
	let credential = Credential::new(
		"access-it",
		Duration::seconds(3_600),
		OffsetDateTime::now_utc(),
		ScopeList::new(["identity"]).expect("Scope list should be valid for API test."),
		None,
	);

	ApiClient::new(api_base, credential, limiter)
}

#[tokio::test]
async fn authorized_call_deserializes_and_corrects_the_limiter() {
	let server = MockServer::start_async().await;
	let limiter = RateLimiter::new(StdDuration::from_secs(600), 600);
	let client = build_client(&server, limiter.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/me")
				.query_param("raw_json", "1")
				.header("authorization", "Bearer access-it");
			then.status(200)
				.header("content-type", "application/json")
				.header("x-ratelimit-remaining", "42.0")
				.header("x-ratelimit-reset", "0")
				.header("x-ratelimit-used", "558")
				.body("{\"name\":\"governor-it\"}");
		})
		.await;
	let identity: Identity = client
		.call_authorized(Method::GET, "/api/v1/me", None)
		.await
		.expect("Authorized call should succeed.");

	mock.assert_async().await;

	assert_eq!(identity.name, "governor-it");
	// A zero reset delay makes the corrected estimate the reported count itself.
	assert!(
		(limiter.remaining() - 42.0).abs() < 0.5,
		"The reported quota must override the local estimate, got {}.",
		limiter.remaining()
	);
}

#[tokio::test]
async fn form_params_are_sent_url_encoded() {
	let server = MockServer::start_async().await;
	let client = build_client(&server, RateLimiter::new(StdDuration::from_secs(60), 60));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/submit")
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("kind=self")
				.body_includes("title=hello+world");
			then.status(200).header("content-type", "application/json").body("{\"name\":\"t3_1\"}");
		})
		.await;
	let reply: Identity = client
		.call_authorized(
			Method::POST,
			"/api/submit",
			Some(&[("kind", "self"), ("title", "hello world")]),
		)
		.await
		.expect("Authorized POST should succeed.");

	mock.assert_async().await;

	assert_eq!(reply.name, "t3_1");
}

#[tokio::test]
async fn non_200_with_an_unparseable_body_is_a_plain_status_failure() {
	let server = MockServer::start_async().await;
	let client = build_client(&server, RateLimiter::new(StdDuration::from_secs(60), 60));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/me");
			then.status(503).header("content-type", "text/html").body("<h1>upstream down</h1>");
		})
		.await;

	let err = client
		.call_authorized::<Identity>(Method::GET, "/api/v1/me", None)
		.await
		.expect_err("A 503 response must fail.");
	let Error::HttpStatus { status, body } = err else {
		panic!("Expected a status classification, got {err:?}.");
	};

	assert_eq!(status, 503);
	assert!(body.is_none(), "An unparseable body must not fail classification.");
}

#[tokio::test]
async fn non_200_with_a_json_body_keeps_the_body() {
	let server = MockServer::start_async().await;
	let client = build_client(&server, RateLimiter::new(StdDuration::from_secs(60), 60));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/me");
			then.status(403)
				.header("content-type", "application/json")
				.body("{\"message\":\"Forbidden\",\"error\":403}");
		})
		.await;

	let err = client
		.call_authorized::<Identity>(Method::GET, "/api/v1/me", None)
		.await
		.expect_err("A 403 response must fail.");
	let Error::HttpStatus { status, body } = err else {
		panic!("Expected a status classification, got {err:?}.");
	};

	assert_eq!(status, 403);
	assert_eq!(body.expect("The JSON body should have been captured.")["message"], "Forbidden");
}

#[tokio::test]
async fn malformed_200_body_is_a_deserialization_failure() {
	let server = MockServer::start_async().await;
	let client = build_client(&server, RateLimiter::new(StdDuration::from_secs(60), 60));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/me");
			then.status(200).header("content-type", "text/html").body("<h1>not json</h1>");
		})
		.await;

	let err = client
		.call_authorized::<Identity>(Method::GET, "/api/v1/me", None)
		.await
		.expect_err("A malformed 200 body must fail.");

	assert!(matches!(err, Error::Deserialization { .. }));
	assert_eq!(err.reason(), "json_stream_error");
}

#[tokio::test]
async fn responses_without_quota_headers_leave_the_limiter_alone() {
	let server = MockServer::start_async().await;
	let limiter = RateLimiter::new(StdDuration::from_secs(600), 600);
	let client = build_client(&server, limiter.clone());

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/me");
			then.status(200).header("content-type", "application/json").body("{\"name\":\"n\"}");
		})
		.await;

	let _: Identity = client
		.call_authorized(Method::GET, "/api/v1/me", None)
		.await
		.expect("Authorized call should succeed.");

	assert!(
		limiter.remaining() > 598.0,
		"Without headers only the acquired token may be debited, got {}.",
		limiter.remaining()
	);
}
