//! HTTP plumbing for the token endpoints.
//!
//! `oauth2` consumes the response body before the crate sees an error, so every token request runs
//! through a handle that first copies the status code and `Retry-After` hint into a
//! [`ResponseMetadataSlot`]. Error mapping reads the slot afterwards. The same [`ReqwestClient`]
//! also backs [`crate::fetch::AuthenticatedFetcher`].

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::{
	header::{HeaderMap, RETRY_AFTER},
	redirect::Policy,
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::ConfigError};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Transport for token requests that reports response metadata.
///
/// One transport is shared by every provider of a session, hence `Send + Sync + 'static`.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Error raised by the transport itself.
	type TransportError: 'static + Send + Sync + StdError;

	/// Handle passed to `oauth2`'s `request_async`.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle that writes into `slot`.
	///
	/// Device polling sends many requests through one handle, so implementations clear the slot
	/// before each request and store the status as soon as a response arrives.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Status and back-off hint of the last token response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status, if a response arrived.
	pub status: Option<u16>,
	/// `Retry-After`, converted to a relative delay.
	pub retry_after: Option<Duration>,
}

/// Shared cell carrying [`ResponseMetadata`] from the transport to error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Replaces the stored metadata.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Removes and returns the stored metadata.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// reqwest-backed [`TokenHttpClient`].
///
/// Redirects are disabled so resource responses reach the caller untouched.
#[derive(Clone)]
pub struct ReqwestHttpClient(ReqwestClient);
impl ReqwestHttpClient {
	/// Client with the crate defaults.
	pub fn new() -> Result<Self, ConfigError> {
		Ok(Self(Self::builder().build()?))
	}

	/// Builder preloaded with the crate defaults, for callers adding timeouts, proxies or
	/// certificates.
	pub fn builder() -> reqwest::ClientBuilder {
		ReqwestClient::builder().redirect(Policy::none()).user_agent(USER_AGENT)
	}

	/// Uses `client` as is.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		InstrumentedHandle { client: self.0.clone(), slot }
	}
}

/// [`AsyncHttpClient`] handle produced by [`ReqwestHttpClient`].
#[derive(Clone)]
pub struct InstrumentedHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let request = request.try_into().map_err(Box::new)?;
			let response = self.client.execute(request).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().clone();

			self.slot.store(ResponseMetadata {
				status: Some(status.as_u16()),
				retry_after: retry_after(&headers),
			});

			let body = response.bytes().await.map_err(Box::new)?;
			let mut converted = HttpResponse::new(body.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}

// Either delta-seconds or an HTTP date; dates in the past carry no hint.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	match value.parse::<i64>() {
		Ok(secs) if secs >= 0 => Some(Duration::seconds(secs)),
		Ok(_) => None,
		Err(_) => OffsetDateTime::parse(value, &Rfc2822)
			.ok()
			.map(|at| at - OffsetDateTime::now_utc())
			.filter(|delay| delay.is_positive()),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	fn with_retry_after(value: &'static str) -> HeaderMap {
		HeaderMap::from_iter([(RETRY_AFTER, HeaderValue::from_static(value))])
	}

	#[test]
	fn retry_after_reads_seconds() {
		assert_eq!(retry_after(&with_retry_after("30")), Some(Duration::seconds(30)));
		assert_eq!(retry_after(&with_retry_after(" 5 ")), Some(Duration::seconds(5)));
		assert_eq!(retry_after(&with_retry_after("-5")), None);
	}

	#[test]
	fn retry_after_drops_stale_dates_and_noise() {
		assert_eq!(retry_after(&with_retry_after("Wed, 21 Oct 2015 07:28:00 GMT")), None);
		assert_eq!(retry_after(&with_retry_after("later")), None);
		assert_eq!(retry_after(&HeaderMap::new()), None);
	}

	#[test]
	fn slot_is_emptied_by_take() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(503), retry_after: None });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(503));
		assert!(slot.take().is_none());
	}
}
