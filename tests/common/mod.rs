#![allow(dead_code)]

// std
use std::sync::{Arc, Mutex};
// crates.io
use httpmock::prelude::*;
use url::Url;
// self
use mail_probe::{
	auth::{ClientId, ProviderId, ScopeSet},
	flows::{AuthSession, DeviceCodePrompt, ReqwestAuthSession, VerificationInstructions},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::{DefaultProviderStrategy, GrantType, ProviderDescriptor},
};

pub const CLIENT_ID: &str = "11111111-1111-1111-1111-111111111111";
pub const USER_CODE: &str = "ABCD-EFGH";

pub fn init_tracing() {
	// Several tests race to install the subscriber; only the first wins.
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Reqwest transport accepting the self-signed certificates `httpmock` serves.
pub fn test_http_client() -> ReqwestHttpClient {
	let client = ReqwestHttpClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

pub fn client_id() -> ClientId {
	ClientId::parse(CLIENT_ID).expect("Client id fixture should parse.")
}

pub fn scope(values: &[&str]) -> ScopeSet {
	ScopeSet::new(values.iter().copied()).expect("Scope fixture should be valid.")
}

pub fn descriptor(server: &MockServer) -> ProviderDescriptor {
	ProviderDescriptor::builder(ProviderId::new("mock-authority").expect("Provider id should be valid."))
		.device_authorization_endpoint(
			Url::parse(&server.url("/devicecode")).expect("Mock device endpoint should parse."),
		)
		.token_endpoint(Url::parse(&server.url("/token")).expect("Mock token endpoint should parse."))
		.support_grants([GrantType::DeviceCode, GrantType::RefreshToken])
		.build()
		.expect("Mock descriptor should build.")
}

pub fn session(server: &MockServer, prompt: Arc<RecordingPrompt>) -> ReqwestAuthSession {
	init_tracing();

	<AuthSession<ReqwestHttpClient, ReqwestTransportErrorMapper>>::with_http_client(
		descriptor(server),
		Arc::new(DefaultProviderStrategy),
		client_id(),
		test_http_client(),
		ReqwestTransportErrorMapper,
	)
	.with_prompt(prompt)
}

pub fn device_code_body() -> String {
	format!(
		"{{\"device_code\":\"device-1\",\"user_code\":\"{USER_CODE}\",\"verification_uri\":\"https://microsoft.com/devicelogin\",\"expires_in\":900,\"interval\":1,\"message\":\"To sign in, enter the code {USER_CODE}.\"}}"
	)
}

pub fn token_body(access: &str, refresh: &str, expires_in: u64, scope: &str) -> String {
	format!(
		"{{\"access_token\":\"{access}\",\"refresh_token\":\"{refresh}\",\"token_type\":\"Bearer\",\"expires_in\":{expires_in},\"scope\":\"{scope}\"}}"
	)
}

pub fn oauth_error_body(code: &str) -> String {
	format!("{{\"error\":\"{code}\",\"error_description\":\"Mock authority answered {code}.\"}}")
}

/// Prompt that remembers every set of instructions it was shown.
#[derive(Debug, Default)]
pub struct RecordingPrompt {
	presented: Mutex<Vec<VerificationInstructions>>,
}
impl RecordingPrompt {
	pub fn presented(&self) -> Vec<VerificationInstructions> {
		self.presented.lock().expect("Prompt lock should not be poisoned.").clone()
	}
}
impl DeviceCodePrompt for RecordingPrompt {
	fn present(&self, instructions: &VerificationInstructions) {
		self.presented.lock().expect("Prompt lock should not be poisoned.").push(instructions.clone());
	}
}
