//! Token acquisition: the per-scope [`TokenProvider`] and the [`AuthSession`] registry that owns
//! them.

pub mod common;
pub mod device_code;
pub mod metrics;
pub mod refresh;

pub use common::*;
pub use device_code::*;
pub use metrics::AcquireMetrics;

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, ClientId, ScopeSet, TokenFamily, TokenRecord},
	error::{AuthenticationError, ConfigError},
	fetch::AuthenticatedFetcher,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TransportErrorMapper},
	provider::{DefaultProviderStrategy, GrantType, ProviderDescriptor, ProviderStrategy},
};

/// Session specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthSession = AuthSession<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Owns the token providers of one application registration.
///
/// The session holds the transport, descriptor, strategy, and prompt shared by every provider and
/// lazily creates one [`TokenProvider`] per distinct [`ScopeSet`]. Lookups and inserts happen
/// under a single lock, so a scope set is never initialized twice.
pub struct AuthSession<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound authority request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Descriptor naming the authority endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Strategy classifying authority errors and decorating token requests.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Application (client) identifier sent with every grant.
	pub client_id: ClientId,
	/// Counters shared by every provider of the session.
	pub metrics: Arc<AcquireMetrics>,
	/// Refresh token shared by every provider of the session.
	pub family: Arc<TokenFamily>,
	prompt: Arc<dyn DeviceCodePrompt>,
	preemptive_window: Duration,
	poll_timeout: Option<StdDuration>,
	providers: Mutex<HashMap<ScopeSet, Arc<TokenProvider<C, M>>>>,
}
impl<C, M> AuthSession<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a session that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: ClientId,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			strategy,
			client_id,
			metrics: Default::default(),
			family: Arc::new(TokenFamily::new(client_id)),
			prompt: Arc::new(ConsolePrompt),
			preemptive_window: RenewalWindow::DEFAULT_PREEMPTIVE_WINDOW,
			poll_timeout: None,
			providers: Default::default(),
		}
	}

	/// Replaces the collaborator that shows device-code instructions to the user.
	pub fn with_prompt(mut self, prompt: Arc<dyn DeviceCodePrompt>) -> Self {
		self.prompt = prompt;

		self
	}

	/// Bounds device polling of providers created from now on.
	pub fn with_poll_timeout(mut self, timeout: StdDuration) -> Self {
		self.poll_timeout = Some(timeout);

		self
	}

	/// Overrides the pre-emptive renewal window of providers created from now on.
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = window;

		self
	}

	/// Returns the provider bound to `scope`, creating it on first use.
	pub fn provider(&self, scope: &ScopeSet) -> Arc<TokenProvider<C, M>> {
		let mut providers = self.providers.lock();

		providers
			.entry(scope.clone())
			.or_insert_with(|| {
				let mut provider = TokenProvider::new(self, scope.clone())
					.with_preemptive_window(self.preemptive_window);

				if let Some(timeout) = self.poll_timeout {
					provider = provider.with_poll_timeout(timeout);
				}

				Arc::new(provider)
			})
			.clone()
	}

	/// Number of providers created so far.
	pub fn provider_count(&self) -> usize {
		self.providers.lock().len()
	}

	/// Returns a bearer token for `scope`, reusing the provider bound to it.
	pub async fn acquire(&self, scope: &ScopeSet) -> Result<BearerToken> {
		self.provider(scope).acquire(scope).await
	}
}
impl AuthSession<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a session with its own reqwest transport and the default strategy.
	pub fn new(descriptor: ProviderDescriptor, client_id: ClientId) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(
			descriptor,
			Arc::new(DefaultProviderStrategy),
			client_id,
			ReqwestHttpClient::new()?,
			ReqwestTransportErrorMapper,
		))
	}

	/// Fetcher sharing the session's connection pool.
	pub fn fetcher(&self) -> AuthenticatedFetcher {
		AuthenticatedFetcher::new(&self.http_client)
	}
}
impl<C, M> Debug for AuthSession<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthSession")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("providers", &self.provider_count())
			.finish()
	}
}

/// Yields bearer tokens for exactly one client and one scope set.
///
/// The cached [`TokenRecord`] sits behind an async lock that is held for the whole acquisition,
/// so concurrent callers wait for the running flow and then reuse its token instead of starting
/// a second device authorization.
pub struct TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client_id: ClientId,
	scope: ScopeSet,
	descriptor: ProviderDescriptor,
	strategy: Arc<dyn ProviderStrategy>,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	prompt: Arc<dyn DeviceCodePrompt>,
	metrics: Arc<AcquireMetrics>,
	family: Arc<TokenFamily>,
	renewal: RenewalWindow,
	poll_timeout: Option<StdDuration>,
	record: AsyncMutex<Option<TokenRecord>>,
}
impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn new(session: &AuthSession<C, M>, scope: ScopeSet) -> Self {
		Self {
			client_id: session.client_id,
			renewal: RenewalWindow::new(session.client_id, scope.clone()),
			scope,
			descriptor: session.descriptor.clone(),
			strategy: session.strategy.clone(),
			http_client: session.http_client.clone(),
			transport_mapper: session.transport_mapper.clone(),
			prompt: session.prompt.clone(),
			metrics: session.metrics.clone(),
			family: session.family.clone(),
			poll_timeout: None,
			record: AsyncMutex::new(None),
		}
	}

	/// Gives up device polling after `timeout` even if the code is still valid.
	pub fn with_poll_timeout(mut self, timeout: StdDuration) -> Self {
		self.poll_timeout = Some(timeout);

		self
	}

	/// Overrides the pre-emptive renewal window (defaults to 60 seconds).
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.renewal = self.renewal.with_preemptive_window(window);

		self
	}

	/// Client the provider mints tokens for.
	pub fn client_id(&self) -> ClientId {
		self.client_id
	}

	/// Scope set the provider is bound to.
	pub fn scope(&self) -> &ScopeSet {
		&self.scope
	}

	/// Snapshot of the cached record, if a token was acquired.
	pub async fn cached_record(&self) -> Option<TokenRecord> {
		self.record.lock().await.clone()
	}

	/// Returns a bearer token for `scope`.
	///
	/// Order: a cached token outside the renewal window, then a silent refresh, then the
	/// interactive device flow. The refresh redeems the provider's own refresh token or, before
	/// the first sign-in for this scope set, the latest one of the session's [`TokenFamily`]. A
	/// refresh rejected by the authority falls through to the device flow; so does a borrowed
	/// refresh token that cannot cover the scope set. Any other failure is returned as is.
	pub async fn acquire(&self, scope: &ScopeSet) -> Result<BearerToken> {
		if scope != &self.scope {
			return Err(ConfigError::ScopeMismatch {
				bound: self.scope.to_string(),
				requested: scope.to_string(),
			}
			.into());
		}

		let mut cached = self.record.lock().await;
		let now = OffsetDateTime::now_utc();

		if let Some(record) = cached.as_ref() {
			if !self.renewal.should_renew(record, now) {
				self.metrics.record_cache_hit();

				return Ok(record.access_token.clone());
			}
		}

		let own = cached.as_ref().and_then(|record| record.refresh_token.clone());
		let borrowed = own.is_none();
		let refresh_token = own
			.or_else(|| self.family.latest_refresh_token())
			.filter(|_| self.descriptor.supports(GrantType::RefreshToken));

		if let Some(refresh_token) = refresh_token {
			match self.refresh_silently(&refresh_token).await {
				Ok(record) => {
					let token = record.access_token.clone();

					self.family.remember(&record);
					*cached = Some(record);

					return Ok(token);
				},
				Err(Error::Authentication(
					AuthenticationError::InvalidGrant { .. }
					| AuthenticationError::Declined { .. }
					| AuthenticationError::Expired { .. },
				)) => {
					self.family.forget(&refresh_token);
					*cached = None;
				},
				Err(Error::Authentication(AuthenticationError::InsufficientScope { .. }))
					if borrowed => {},
				Err(e) => {
					self.metrics.record_failure();

					return Err(e);
				},
			}
		}

		match self.run_device_flow().await {
			Ok(record) => {
				let token = record.access_token.clone();

				self.family.remember(&record);
				*cached = Some(record);

				Ok(token)
			},
			Err(e) => {
				self.metrics.record_failure();

				Err(e)
			},
		}
	}

	fn ensure_supported(&self, grant: GrantType) -> Result<()> {
		if self.descriptor.supports(grant) {
			Ok(())
		} else {
			Err(ConfigError::UnsupportedGrant {
				descriptor: self.descriptor.id.to_string(),
				grant: grant.label(),
			}
			.into())
		}
	}
}
impl<C, M> Debug for TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("client_id", &self.client_id)
			.field("scope", &self.scope)
			.field("poll_timeout", &self.poll_timeout)
			.finish()
	}
}
