//! Bearer-authenticated HTTP requests.
//!
//! [`AuthenticatedFetcher`] is deliberately thin: it attaches the `Authorization: Bearer` header
//! and returns whatever the server answered. Interpreting the status and body is the caller's
//! job (see [`crate::mail`]).

// crates.io
use reqwest::{Method, Response};
// self
use crate::{
	_prelude::*,
	auth::BearerToken,
	error::{ConfigError, NetworkError},
	http::ReqwestHttpClient,
	obs::{self, FlowKind},
};

const RESOURCE: &str = "the resource endpoint";

/// Sends requests carrying a bearer token.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct AuthenticatedFetcher {
	client: ReqwestClient,
}
impl AuthenticatedFetcher {
	/// Creates a fetcher sharing `http`'s connection pool.
	pub fn new(http: &ReqwestHttpClient) -> Self {
		Self { client: http.as_ref().clone() }
	}

	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client }
	}

	/// Sends `method url` with `Authorization: Bearer <token>` and returns the raw response.
	///
	/// Non-success statuses are returned as responses, not errors. Connection failures and
	/// timeouts yield [`NetworkError`]; a request that cannot be built yields [`ConfigError`].
	pub async fn fetch(&self, method: Method, token: &BearerToken, url: &Url) -> Result<Response> {
		obs::observe(FlowKind::Fetch, "fetch", async move {
			let request = self
				.client
				.request(method, url.clone())
				.bearer_auth(token.expose())
				.build()
				.map_err(ConfigError::from)?;

			self.client.execute(request).await.map_err(|e| {
				if e.is_builder() {
					Error::from(ConfigError::from(e))
				} else {
					NetworkError::from_reqwest(RESOURCE, e).into()
				}
			})
		})
		.await
	}
}
