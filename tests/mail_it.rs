mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use url::Url;
// self
use common::*;
use mail_probe::{
	error::{DeserializationError, Error},
	fetch::AuthenticatedFetcher,
	mail,
};

#[tokio::test]
async fn device_token_counts_messages() {
	let server = MockServer::start_async().await;
	let _device = server
		.mock_async(|when, then| {
			when.method(POST).path("/devicecode");
			then.status(200).header("content-type", "application/json").body(device_code_body());
		})
		.await;
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("T1", "R1", 3600, "scopeA"));
		})
		.await;
	let messages = server
		.mock_async(|when, then| {
			when.method(GET).path("/me/messages").header("authorization", "Bearer T1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"value\":[{\"id\":\"1\"}]}");
		})
		.await;
	let session = session(&server, Arc::new(RecordingPrompt::default()));
	let token = session.acquire(&scope(&["scopeA"])).await.expect("Token should be acquired.");
	let fetcher = AuthenticatedFetcher::new(&session.http_client);
	let url = Url::parse(&server.url("/me/messages")).expect("Mock URL should parse.");
	let page = mail::fetch_messages(&fetcher, &token, &url).await.expect("Page should decode.");

	messages.assert_async().await;

	assert_eq!(session.client_id.to_string(), CLIENT_ID);
	assert_eq!(page.count(), 1);
	assert_eq!(page.value[0].id, "1");
}

#[tokio::test]
async fn missing_value_is_a_deserialization_error() {
	let server = MockServer::start_async().await;
	let _messages = server
		.mock_async(|when, then| {
			when.method(GET).path("/me/messages");
			then.status(200).header("content-type", "application/json").body("{\"items\":[]}");
		})
		.await;
	let fetcher = AuthenticatedFetcher::new(&test_http_client());
	let url = Url::parse(&server.url("/me/messages")).expect("Mock URL should parse.");
	let err = mail::fetch_messages(&fetcher, &mail_probe::auth::BearerToken::new("T1"), &url)
		.await
		.expect_err("Bodies without `value` must be rejected.");

	match err {
		Error::Deserialization(DeserializationError::Json { status, .. }) =>
			assert_eq!(status, Some(200)),
		other => panic!("Expected a deserialization error, got {other:?}."),
	}
}

#[tokio::test]
async fn non_success_status_is_unexpected() {
	let server = MockServer::start_async().await;
	let _messages = server
		.mock_async(|when, then| {
			when.method(GET).path("/me/messages");
			then.status(401).body("{\"error\":{\"code\":\"InvalidAuthenticationToken\"}}");
		})
		.await;
	let fetcher = AuthenticatedFetcher::new(&test_http_client());
	let url = Url::parse(&server.url("/me/messages")).expect("Mock URL should parse.");
	let err = mail::fetch_messages(&fetcher, &mail_probe::auth::BearerToken::new("T1"), &url)
		.await
		.expect_err("Non-success statuses must be surfaced.");

	match err {
		Error::UnexpectedStatus { status, preview } => {
			assert_eq!(status, 401);
			assert!(preview.contains("InvalidAuthenticationToken"));
		},
		other => panic!("Expected an unexpected-status error, got {other:?}."),
	}
}
