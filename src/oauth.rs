//! Internal OAuth client facade over the `oauth2` crate.
//!
//! [`DeviceFacade`] owns a client configured with the descriptor's device authorization and token
//! endpoints and translates `oauth2` responses into [`TokenRecord`]s and crate errors.

pub use oauth2;

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::{
	ClientId as OAuthClientId, DeviceAuthorizationResponse, DeviceAuthorizationUrl, EndpointNotSet,
	EndpointSet, ErrorResponseType, ExtraDeviceAuthorizationFields, HttpClientError, RefreshToken,
	RequestTokenError, Scope, StandardErrorResponse, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, ClientId, ScopeSet, TokenRecord, TokenRecordBuilderError},
	error::{AuthenticationError, ConfigError, NetworkError},
	flows::VerificationInstructions,
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{
		GrantType, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind, ProviderStrategy,
	},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const AUTHORITY: &str = "the authority";
const OFFLINE_ACCESS: &str = "offline_access";
// Form keys the flows own; strategy hooks cannot override them.
const RESERVED_PARAMS: [&str; 4] = ["client_id", "scope", "grant_type", "device_code"];

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		grant: GrantType,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		grant: GrantType,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) if inner.is_builder() => ConfigError::from(*inner).into(),
			HttpClientError::Reqwest(inner) =>
				AuthenticationError::Unreachable(NetworkError::from_reqwest(AUTHORITY, *inner)).into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) =>
				AuthenticationError::Unreachable(NetworkError::Io(inner)).into(),
			HttpClientError::Other(message) => upstream(
				format!("HTTP client error during the {grant} request: {message}"),
				meta,
			),
			_ => upstream(format!("HTTP client error during the {grant} request"), meta),
		}
	}
}

/// Provider-specific fields returned next to the RFC 8628 device authorization response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeviceCodeExtras {
	/// Ready-to-print instructions (Microsoft identity platform).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}
impl ExtraDeviceAuthorizationFields for DeviceCodeExtras {}

/// Device authorization issued by the authority and awaiting user approval.
pub type DeviceAuthorization = DeviceAuthorizationResponse<DeviceCodeExtras>;

pub(crate) struct DeviceFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	client_id: ClientId,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> DeviceFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: ClientId,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let device_url =
			DeviceAuthorizationUrl::new(descriptor.endpoints.device_authorization.to_string())
				.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let oauth_client = BasicClient::new(OAuthClientId::new(client_id.to_string()))
			.set_device_authorization_url(device_url)
			.set_token_uri(token_url);

		Ok(Self { oauth_client, client_id, http_client, error_mapper })
	}

	/// Requests a device and user code for `scope`.
	pub(crate) async fn request_device_authorization(
		&self,
		strategy: &dyn ProviderStrategy,
		scope: &ScopeSet,
		offline_access: bool,
	) -> Result<DeviceAuthorization> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_device_code();

		for value in scope.iter() {
			request = request.add_scope(Scope::new(value.to_owned()));
		}
		if offline_access && !scope.contains(OFFLINE_ACCESS) {
			request = request.add_scope(Scope::new(OFFLINE_ACCESS.to_owned()));
		}
		for (key, value) in extra_params(strategy, GrantType::DeviceCode) {
			request = request.add_extra_param(key, value);
		}

		request.request_async(&handle).await.map_err(|err| {
			map_request_error(
				strategy,
				GrantType::DeviceCode,
				meta.take(),
				err,
				self.error_mapper.as_ref(),
			)
		})
	}

	/// Polls the token endpoint until the user approves, declines, or the code expires.
	pub(crate) async fn poll_device_token(
		&self,
		strategy: &dyn ProviderStrategy,
		scope: &ScopeSet,
		authorization: &DeviceAuthorization,
		max_interval: StdDuration,
		timeout: Option<StdDuration>,
	) -> Result<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let mut request = self
			.oauth_client
			.exchange_device_access_token(authorization)
			.set_max_backoff_interval(max_interval);

		for (key, value) in extra_params(strategy, GrantType::DeviceCode) {
			request = request.add_extra_param(key, value);
		}

		let response = request
			.request_async(&handle, tokio::time::sleep, timeout)
			.await
			.map_err(|err| {
				map_request_error(
					strategy,
					GrantType::DeviceCode,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

		map_token_response(self.client_id, scope, response, None)
	}

	/// Redeems `refresh_token` for a new access token covering `scope`.
	pub(crate) async fn refresh_token(
		&self,
		strategy: &dyn ProviderStrategy,
		scope: &ScopeSet,
		refresh_token: &BearerToken,
	) -> Result<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let secret = RefreshToken::new(refresh_token.expose().to_owned());
		let mut request = self.oauth_client.exchange_refresh_token(&secret);

		for value in scope.iter() {
			request = request.add_scope(Scope::new(value.to_owned()));
		}
		for (key, value) in extra_params(strategy, GrantType::RefreshToken) {
			request = request.add_extra_param(key, value);
		}

		let response = request.request_async(&handle).await.map_err(|err| {
			map_request_error(
				strategy,
				GrantType::RefreshToken,
				meta.take(),
				err,
				self.error_mapper.as_ref(),
			)
		})?;

		map_token_response(self.client_id, scope, response, Some(refresh_token))
	}
}

/// Extracts what the prompt needs to show from a device authorization.
pub(crate) fn instructions(authorization: &DeviceAuthorization) -> VerificationInstructions {
	VerificationInstructions {
		user_code: authorization.user_code().secret().to_owned(),
		verification_uri: authorization.verification_uri().as_str().to_owned(),
		verification_uri_complete: authorization
			.verification_uri_complete()
			.map(|uri| uri.secret().to_owned()),
		expires_in: Duration::try_from(authorization.expires_in()).unwrap_or(Duration::MAX),
		message: authorization.extra_fields().message.clone(),
	}
}

fn extra_params(strategy: &dyn ProviderStrategy, grant: GrantType) -> Vec<(String, String)> {
	let mut form = BTreeMap::new();

	strategy.augment_token_request(grant, &mut form);

	form.into_iter().filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str())).collect()
}

fn map_token_response(
	client: ClientId,
	scope: &ScopeSet,
	response: BasicTokenResponse,
	previous_refresh: Option<&BearerToken>,
) -> Result<TokenRecord> {
	let access_token = response.access_token().secret();

	if access_token.is_empty() {
		return Err(AuthenticationError::EmptyAccessToken.into());
	}

	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}
	if let Some(granted) = response.scopes() {
		let missing = scope
			.iter()
			.filter(|requested| !scope_granted(requested, granted))
			.collect::<Vec<_>>();

		if !missing.is_empty() {
			return Err(AuthenticationError::InsufficientScope {
				reason: format!("not granted: {}", missing.join(", ")),
			}
			.into());
		}
	}

	let mut builder = TokenRecord::builder(client, scope.clone())
		.access_token(access_token.to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in));

	// Authorities may omit a rotated refresh token; keep the one that was redeemed.
	match (response.refresh_token(), previous_refresh) {
		(Some(rotated), _) => builder = builder.refresh_token(rotated.secret().to_owned()),
		(None, Some(previous)) => builder = builder.refresh_token(previous.expose()),
		(None, None) => {},
	}

	builder.build().map_err(|err| match err {
		TokenRecordBuilderError::ExpiryOutOfRange => ConfigError::ExpiresInOutOfRange.into(),
		other => ConfigError::from(other).into(),
	})
}

// Microsoft reports resource-qualified scopes in short form for the default resource, so
// `https://graph.microsoft.com/Mail.Read` is satisfied by a granted `Mail.Read`. A short name only
// counts when every qualified scope in the grant belongs to the requested resource; otherwise the
// short names refer to some other resource.
fn scope_granted(requested: &str, granted: &[Scope]) -> bool {
	let qualified = |scope: &str| scope.contains("://");
	let resource = |scope: &str| scope.rsplit_once('/').map(|(resource, _)| resource.to_owned());
	let (requested_resource, short) = match requested.rsplit_once('/') {
		Some((resource, name)) if qualified(requested) => (Some(resource), Some(name)),
		_ => (None, None),
	};
	let short_names_apply = requested_resource.is_some_and(|wanted| {
		granted
			.iter()
			.map(|scope| scope.as_str())
			.filter(|scope| qualified(*scope))
			.filter_map(resource)
			.all(|resource| resource.eq_ignore_ascii_case(wanted))
	});

	granted.iter().any(|scope| {
		let scope = scope.as_str();

		scope.eq_ignore_ascii_case(requested)
			|| (short_names_apply
				&& !qualified(scope)
				&& short.is_some_and(|name| scope.eq_ignore_ascii_case(name)))
	})
}

fn map_request_error<E, M, T>(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: RequestTokenError<HttpClientError<E>, StandardErrorResponse<T>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
	T: 'static + ErrorResponseType + AsRef<str> + Display,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, grant, &response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(grant, meta_ref, error),
		RequestTokenError::Parse(source, _body) =>
			AuthenticationError::TokenResponseParse { source, status: meta_status(meta_ref) }.into(),
		RequestTokenError::Other(message) =>
			upstream(format!("unexpected response to the {grant} request: {message}"), meta_ref),
	}
}

fn map_server_response_error<T>(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	response: &StandardErrorResponse<T>,
	meta: Option<&ResponseMetadata>,
) -> Error
where
	T: 'static + ErrorResponseType + AsRef<str> + Display,
{
	let code = response.error().as_ref();
	let mut ctx = ProviderErrorContext::new(grant).with_oauth_error(code);

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let reason = match response.error_description() {
		Some(description) => format!("{code}: {description}"),
		None => code.to_owned(),
	};

	match strategy.classify_token_error(&ctx) {
		ProviderErrorKind::Declined => AuthenticationError::Declined { reason }.into(),
		ProviderErrorKind::Expired => AuthenticationError::Expired { reason }.into(),
		ProviderErrorKind::InvalidGrant => AuthenticationError::InvalidGrant { reason }.into(),
		ProviderErrorKind::InvalidClient => AuthenticationError::InvalidClient { reason }.into(),
		ProviderErrorKind::InsufficientScope =>
			AuthenticationError::InsufficientScope { reason }.into(),
		ProviderErrorKind::Transient => upstream(reason, meta),
	}
}

fn upstream(message: String, meta: Option<&ResponseMetadata>) -> Error {
	AuthenticationError::Upstream {
		message,
		status: meta_status(meta),
		retry_after: meta.and_then(|value| value.retry_after),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::{
		AccessToken, DeviceCodeErrorResponse, DeviceCodeErrorResponseType, EmptyExtraTokenFields,
		basic::{BasicErrorResponseType, BasicTokenType},
	};
	// self
	use super::*;
	use crate::{
		auth::{ProviderId, TenantId},
		http::ReqwestHttpClient,
		provider::DefaultProviderStrategy,
	};

	fn scope() -> ScopeSet {
		ScopeSet::new(["https://graph.microsoft.com/Mail.Read", "https://graph.microsoft.com/User.Read"])
			.expect("Scope fixture should be valid.")
	}

	#[test]
	fn builds_device_client_from_descriptor() {
		let descriptor = ProviderDescriptor::microsoft(&TenantId::common())
			.expect("Microsoft descriptor should build.");
		let http = Arc::new(ReqwestHttpClient::new().expect("Default HTTP client should build."));
		let facade = <DeviceFacade<ReqwestHttpClient, ReqwestTransportErrorMapper>>::from_descriptor(
			&descriptor,
			ClientId::PLACEHOLDER,
			http,
			Arc::new(ReqwestTransportErrorMapper),
		);

		assert!(facade.is_ok());
		assert_eq!(descriptor.id, ProviderId::new("microsoft").expect("Fixture id should be valid."));
	}

	#[test]
	fn short_scope_names_satisfy_qualified_requests() {
		let granted = vec![Scope::new("Mail.Read".into()), Scope::new("user.read".into())];

		assert!(scope().iter().all(|requested| scope_granted(requested, &granted)));
		assert!(!scope_granted("https://graph.microsoft.com/Mail.Send", &granted));
	}

	#[test]
	fn short_names_do_not_cross_resources() {
		let graph_grant = vec![
			Scope::new("https://graph.microsoft.com/User.Read".into()),
			Scope::new("Mail.Read".into()),
		];

		assert!(!scope_granted("https://outlook.office.com/Mail.Read", &graph_grant));
		assert!(scope_granted("https://graph.microsoft.com/Mail.Read", &graph_grant));
		assert!(scope_granted("https://graph.microsoft.com/user.read", &graph_grant));
		assert!(!scope_granted("Mail.Send", &graph_grant));
	}

	#[test]
	fn huge_expires_in_is_a_config_error() {
		let mut response = BasicTokenResponse::new(
			AccessToken::new("access".into()),
			BasicTokenType::Bearer,
			EmptyExtraTokenFields {},
		);

		response.set_expires_in(Some(&StdDuration::from_secs(9_000_000_000_000)));

		let err = map_token_response(ClientId::PLACEHOLDER, &scope(), response, None)
			.expect_err("An expiry past the calendar range must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::ExpiresInOutOfRange)));
	}

	#[test]
	fn device_code_errors_map_to_authentication_errors() {
		let strategy = DefaultProviderStrategy;
		let declined = DeviceCodeErrorResponse::new(
			DeviceCodeErrorResponseType::AccessDenied,
			Some("The user declined.".into()),
			None,
		);
		let expired =
			DeviceCodeErrorResponse::new(DeviceCodeErrorResponseType::ExpiredToken, None, None);

		assert!(matches!(
			map_server_response_error(&strategy, GrantType::DeviceCode, &declined, None),
			Error::Authentication(AuthenticationError::Declined { .. })
		));
		assert!(matches!(
			map_server_response_error(&strategy, GrantType::DeviceCode, &expired, None),
			Error::Authentication(AuthenticationError::Expired { .. })
		));
	}

	#[test]
	fn unknown_server_errors_surface_as_upstream() {
		let strategy = DefaultProviderStrategy;
		let meta = ResponseMetadata { status: Some(503), retry_after: Some(Duration::seconds(7)) };
		let response = StandardErrorResponse::new(
			BasicErrorResponseType::Extension("service_busy".into()),
			None,
			None,
		);
		let err = map_server_response_error(&strategy, GrantType::RefreshToken, &response, Some(&meta));

		match err {
			Error::Authentication(AuthenticationError::Upstream { status, retry_after, .. }) => {
				assert_eq!(status, Some(503));
				assert_eq!(retry_after, Some(Duration::seconds(7)));
			},
			other => panic!("Expected an upstream error, got {other:?}."),
		}
	}
}
